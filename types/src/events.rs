//! Events announcing mixer topology changes to connected clients.

use crate::mixer::{ChannelId, MixerId};
use serde::{Deserialize, Serialize};

/// Event types that can be broadcast to all connected clients.
///
/// Serialized as `{"type": "<event name>", "data": {...}}`, where the event
/// name is the snake_case variant name (e.g. `mixer_channel_update`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MixerEvent {
    /// A mixer was created
    MixerCreate {
        id: MixerId,
        display_name: String,
        output_channels: u32,
    },
    /// A mixer was renamed
    MixerUpdate { id: MixerId, display_name: String },
    /// A mixer was deleted
    MixerRemove { id: MixerId },
    /// A channel was added to a mixer
    MixerChannelCreate { mixer: MixerId, channel: ChannelId },
    /// A channel's gain or input routing changed
    MixerChannelUpdate {
        mixer: MixerId,
        channel: ChannelId,
        #[serde(flatten)]
        change: ChannelChange,
    },
    /// A channel was removed from a mixer
    MixerChannelRemove { mixer: MixerId, channel: ChannelId },
    /// Keep-alive / connection confirmation
    Ping,
}

/// The single attribute changed by a channel update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelChange {
    /// New gain value
    Gain { gain: f64 },
    /// New input identifier, `None` when routing was cleared
    Input { input: Option<String> },
}

impl MixerEvent {
    /// Wire name of the event, as used by notification subscribers.
    pub fn event_name(&self) -> &'static str {
        match self {
            MixerEvent::MixerCreate { .. } => "mixer_create",
            MixerEvent::MixerUpdate { .. } => "mixer_update",
            MixerEvent::MixerRemove { .. } => "mixer_remove",
            MixerEvent::MixerChannelCreate { .. } => "mixer_channel_create",
            MixerEvent::MixerChannelUpdate { .. } => "mixer_channel_update",
            MixerEvent::MixerChannelRemove { .. } => "mixer_channel_remove",
            MixerEvent::Ping => "ping",
        }
    }

    /// Mixer this event concerns, if any.
    pub fn mixer_id(&self) -> Option<MixerId> {
        match self {
            MixerEvent::MixerCreate { id, .. }
            | MixerEvent::MixerUpdate { id, .. }
            | MixerEvent::MixerRemove { id } => Some(*id),
            MixerEvent::MixerChannelCreate { mixer, .. }
            | MixerEvent::MixerChannelUpdate { mixer, .. }
            | MixerEvent::MixerChannelRemove { mixer, .. } => Some(*mixer),
            MixerEvent::Ping => None,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            MixerEvent::MixerCreate {
                id,
                display_name,
                output_channels,
            } => format!(
                "Mixer {} '{}' created with {} output channel(s)",
                id, display_name, output_channels
            ),
            MixerEvent::MixerUpdate { id, display_name } => {
                format!("Mixer {} renamed to '{}'", id, display_name)
            }
            MixerEvent::MixerRemove { id } => format!("Mixer {} removed", id),
            MixerEvent::MixerChannelCreate { mixer, channel } => {
                format!("Channel {} added to mixer {}", channel, mixer)
            }
            MixerEvent::MixerChannelUpdate {
                mixer,
                channel,
                change,
            } => match change {
                ChannelChange::Gain { gain } => {
                    format!("Channel {} of mixer {} gain set to {}", channel, mixer, gain)
                }
                ChannelChange::Input { input: Some(input) } => {
                    format!(
                        "Channel {} of mixer {} routed from input '{}'",
                        channel, mixer, input
                    )
                }
                ChannelChange::Input { input: None } => {
                    format!("Channel {} of mixer {} unrouted", channel, mixer)
                }
            },
            MixerEvent::MixerChannelRemove { mixer, channel } => {
                format!("Channel {} removed from mixer {}", channel, mixer)
            }
            MixerEvent::Ping => "Ping".to_string(),
        }
    }
}
