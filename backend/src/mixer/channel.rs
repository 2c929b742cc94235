//! Mixer channels.

use crate::input::Input;
use mixdesk_types::{ChannelId, ChannelInfo, DEFAULT_GAIN};

/// A routing slot of a mixer: a gain plus an optional input.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    id: ChannelId,
    /// Linear gain; no range is enforced here
    pub gain: f64,
    /// Routed input, `None` when the channel is silent
    pub input: Option<Input>,
}

impl Channel {
    /// Create an unrouted channel at unity gain.
    pub(crate) fn new(id: ChannelId) -> Self {
        Self {
            id,
            gain: DEFAULT_GAIN,
            input: None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Whether this channel currently consumes `input`.
    pub fn is_routed_from(&self, input: &Input) -> bool {
        self.input.as_ref() == Some(input)
    }
}

impl From<&Channel> for ChannelInfo {
    fn from(channel: &Channel) -> Self {
        ChannelInfo {
            id: channel.id,
            gain: channel.gain,
            input: channel.input.as_ref().map(|input| input.id().to_string()),
        }
    }
}
