//! Identifiers and defaults for audio mixers.
//!
//! Single source of truth shared by the backend and API clients.

use uuid::Uuid;

/// Unique identifier for a mixer.
pub type MixerId = Uuid;

/// Identifier of a channel, unique only within its owning mixer.
pub type ChannelId = u32;

// ── Channel defaults ────────────────────────────────────────────────
/// Neutral (unity) linear gain given to newly created channels.
pub const DEFAULT_GAIN: f64 = 1.0;

// ── Structural defaults ─────────────────────────────────────────────
/// Output channel count used when a create request does not specify one (stereo).
pub const DEFAULT_OUTPUT_CHANNELS: u32 = 2;
/// Smallest accepted output channel count.
pub const MIN_OUTPUT_CHANNELS: u32 = 1;
