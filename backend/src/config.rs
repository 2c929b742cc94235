//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use mixdesk_types::DEFAULT_OUTPUT_CHANNELS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    events: EventsConfig,
    #[serde(default)]
    mixer: MixerConfig,
    #[serde(default)]
    inputs: Vec<InputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventsConfig {
    #[serde(default = "default_event_buffer_size")]
    buffer_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_event_buffer_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MixerConfig {
    #[serde(default = "default_output_channels")]
    default_output_channels: u32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            default_output_channels: default_output_channels(),
        }
    }
}

/// An input made available to mixers at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl InputConfig {
    /// Display name, falling back to the identifier.
    pub fn display_name(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| self.id.clone())
    }
}

fn default_port() -> u16 {
    mixdesk_types::DEFAULT_PORT
}

fn default_event_buffer_size() -> usize {
    100
}

fn default_output_channels() -> u32 {
    DEFAULT_OUTPUT_CHANNELS
}

/// Values given on the command line, overriding every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    /// Extra config file merged after the discovered ones
    pub config_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins (empty allows any)
    pub cors_allowed_origins: Vec<String>,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
    /// Capacity of the event broadcast channel
    pub event_buffer_size: usize,
    /// Output channel count used when a create request omits it
    pub default_output_channels: u32,
    /// Inputs registered in the catalog at startup
    pub inputs: Vec<InputConfig>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/mixdesk/ on Linux)
    /// 2. `.mixdesk.toml` in current directory
    /// 3. the file given with `--config`
    ///
    /// Environment variables use the `MIXDESK_` prefix with `__` separating
    /// nesting levels, e.g. `MIXDESK_SERVER__PORT=9000`.
    pub fn from_figment(overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".mixdesk.toml"));
        let user_config = directories::ProjectDirs::from("", "", "mixdesk")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // 1. Start with defaults
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        // 2. Merge user config file, then local config file, if they exist
        for path in [user_config, local_config].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 3. Explicit config file
        if let Some(ref path) = overrides.config_file {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        // 4. Merge environment variables (MIXDESK_* prefix)
        figment = figment.merge(Env::prefixed("MIXDESK_").split("__"));

        // 5. Merge CLI arguments (highest priority)
        if let Some(p) = overrides.port {
            figment = figment.merge(Serialized::default("server.port", p));
        }
        if let Some(ref lf) = overrides.log_file {
            figment = figment.merge(Serialized::default("logging.log_file", lf));
        }
        if let Some(ref ll) = overrides.log_level {
            figment = figment.merge(Serialized::default("logging.log_level", ll));
        }

        let config_file: ConfigFile = figment.extract()?;

        if config_file.mixer.default_output_channels < mixdesk_types::mixer::MIN_OUTPUT_CHANNELS {
            anyhow::bail!("mixer.default_output_channels must be at least 1");
        }

        Ok(Self {
            port: config_file.server.port,
            cors_allowed_origins: config_file.server.cors_allowed_origins,
            log_file: config_file.logging.log_file,
            log_level: config_file.logging.log_level,
            event_buffer_size: config_file.events.buffer_size,
            default_output_channels: config_file.mixer.default_output_channels,
            inputs: config_file.inputs,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let file = ConfigFile::default();
        Self {
            port: file.server.port,
            cors_allowed_origins: file.server.cors_allowed_origins,
            log_file: None,
            log_level: None,
            event_buffer_size: file.events.buffer_size,
            default_output_channels: file.mixer.default_output_channels,
            inputs: Vec::new(),
        }
    }
}
