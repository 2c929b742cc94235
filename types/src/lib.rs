//! Shared types for the Mixdesk mixer registry.
//!
//! This crate contains domain identifiers, API types and events shared
//! between the backend and its clients.

/// Default port for the Mixdesk backend server.
pub const DEFAULT_PORT: u16 = 8080;

pub mod api;
pub mod events;
pub mod mixer;

// Re-export commonly used types
pub use api::{
    ChannelCreatedResponse, ChannelInfo, CreateMixerRequest, ErrorResponse, InputInfo,
    InputListResponse, MixerDetails, MixerListResponse, MixerResponse, MixerSummary,
    UpdateChannelRequest, UpdateMixerRequest,
};
pub use events::{ChannelChange, MixerEvent};
pub use mixer::{ChannelId, MixerId, DEFAULT_GAIN, DEFAULT_OUTPUT_CHANNELS};
