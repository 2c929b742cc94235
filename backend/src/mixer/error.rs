//! Errors returned by registry and mixer operations.

use mixdesk_types::{ChannelId, MixerId};
use thiserror::Error;

/// Result alias for mixer operations.
pub type Result<T> = std::result::Result<T, MixerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixerError {
    #[error("Mixer not found: {0}")]
    MixerNotFound(MixerId),

    #[error("Channel {channel} does not exist on mixer {mixer}")]
    ChannelNotFound { mixer: MixerId, channel: ChannelId },

    #[error("Input not found: {0}")]
    InputNotFound(String),

    #[error("Input '{input}' is already routed to channel {channel} of mixer {mixer}")]
    Conflict {
        mixer: MixerId,
        channel: ChannelId,
        input: String,
    },

    #[error("Mixer {0} is in use")]
    InUse(MixerId),

    #[error("Mixer {0} was already deleted")]
    AlreadyDeleted(MixerId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Mixer {0} has no channel ids left")]
    ChannelsExhausted(MixerId),
}

/// Coarse classification of a [`MixerError`], one per caller-facing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InUse,
    AlreadyDeleted,
    InvalidArgument,
    Exhausted,
}

impl MixerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MixerError::MixerNotFound(_)
            | MixerError::ChannelNotFound { .. }
            | MixerError::InputNotFound(_) => ErrorKind::NotFound,
            MixerError::Conflict { .. } => ErrorKind::Conflict,
            MixerError::InUse(_) => ErrorKind::InUse,
            MixerError::AlreadyDeleted(_) => ErrorKind::AlreadyDeleted,
            MixerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            MixerError::ChannelsExhausted(_) => ErrorKind::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_kinds_are_discriminated() {
        let id = Uuid::new_v4();
        assert_eq!(MixerError::MixerNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            MixerError::ChannelNotFound {
                mixer: id,
                channel: 1
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MixerError::InputNotFound("mic1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(MixerError::InUse(id).kind(), ErrorKind::InUse);
        assert_eq!(
            MixerError::AlreadyDeleted(id).kind(),
            ErrorKind::AlreadyDeleted
        );
        assert_eq!(
            MixerError::ChannelsExhausted(id).kind(),
            ErrorKind::Exhausted
        );
    }

    #[test]
    fn test_conflict_message_names_the_input() {
        let err = MixerError::Conflict {
            mixer: Uuid::nil(),
            channel: 2,
            input: "mic1".to_string(),
        };
        assert!(err.to_string().contains("'mic1'"));
        assert!(err.to_string().contains("channel 2"));
    }
}
