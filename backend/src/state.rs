//! Application state management.

use crate::config::{Config, InputConfig};
use crate::engine::SoftwareEngine;
use crate::events::EventBroadcaster;
use crate::input::MemoryInputCatalog;
use crate::mixer::MixerRegistry;
use mixdesk_types::DEFAULT_OUTPUT_CHANNELS;
use std::sync::Arc;
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// All mixers
    registry: MixerRegistry,
    /// Catalog of routable inputs
    inputs: Arc<MemoryInputCatalog>,
    /// Mixing engine owning the units behind each mixer
    engine: Arc<SoftwareEngine>,
    /// Event broadcaster for real-time updates
    events: EventBroadcaster,
    /// Output channel count for create requests that omit it
    default_output_channels: u32,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        event_buffer_size: usize,
        default_output_channels: u32,
        inputs: &[InputConfig],
    ) -> Self {
        let events = EventBroadcaster::new(event_buffer_size);
        let engine = Arc::new(SoftwareEngine::new());
        let catalog = Arc::new(MemoryInputCatalog::new());
        for input in inputs {
            catalog.register(input.id.clone(), input.display_name());
        }
        info!("Input catalog seeded with {} input(s)", catalog.len());

        Self {
            inner: Arc::new(AppStateInner {
                registry: MixerRegistry::new(engine.clone(), Arc::new(events.clone())),
                inputs: catalog,
                engine,
                events,
                default_output_channels,
            }),
        }
    }

    /// Create application state from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.event_buffer_size,
            config.default_output_channels,
            &config.inputs,
        )
    }

    /// Get the mixer registry.
    pub fn registry(&self) -> &MixerRegistry {
        &self.inner.registry
    }

    /// Get the input catalog.
    pub fn inputs(&self) -> &MemoryInputCatalog {
        &self.inner.inputs
    }

    /// Get the mixing engine.
    pub fn engine(&self) -> &SoftwareEngine {
        &self.inner.engine
    }

    /// Get the event broadcaster.
    pub fn events(&self) -> &EventBroadcaster {
        &self.inner.events
    }

    pub fn default_output_channels(&self) -> u32 {
        self.inner.default_output_channels
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(100, DEFAULT_OUTPUT_CHANNELS, &[])
    }
}
