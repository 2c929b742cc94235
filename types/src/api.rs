//! API request and response types.

use crate::mixer::{ChannelId, MixerId};
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[cfg(feature = "validation")]
use garde::Validate;

// ============================================================================
// Mixer API Types
// ============================================================================

/// Request to create a new mixer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateMixerRequest {
    /// The name of the new mixer
    #[cfg_attr(feature = "validation", garde(skip))]
    pub display_name: String,
    /// The number of output channels for the mixer (server default when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(range(min = crate::mixer::MIN_OUTPUT_CHANNELS)))]
    pub channels: Option<u32>,
}

/// Request to update a mixer's attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateMixerRequest {
    /// The name to call this mixer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Summary of a mixer as returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MixerSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
    pub id: MixerId,
    pub display_name: String,
    pub output_channels: u32,
    /// Whether the mixer is currently bound to an output sink
    pub in_use: bool,
}

/// A mixer including its channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MixerDetails {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
    pub id: MixerId,
    pub display_name: String,
    pub output_channels: u32,
    pub in_use: bool,
    pub channels: Vec<ChannelInfo>,
}

/// Response containing a single mixer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MixerResponse {
    pub mixer: MixerDetails,
}

/// Response containing a list of mixers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MixerListResponse {
    pub mixers: Vec<MixerSummary>,
}

// ============================================================================
// Channel API Types
// ============================================================================

/// A mixer channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub gain: f64,
    /// Identifier of the routed input, `null` when unrouted
    pub input: Option<String>,
}

/// Response to adding a channel to a mixer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChannelCreatedResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
    pub mixer: MixerId,
    pub channel: ChannelId,
}

/// Request to update a mixer channel.
///
/// An absent `input` leaves routing untouched, `null` or an empty string
/// clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateChannelRequest {
    /// The ID of the input to route to the channel
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, nullable))]
    pub input: Option<Option<String>>,
    /// The gain to set the channel to
    #[serde(default, alias = "volume", skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
}

impl UpdateChannelRequest {
    /// The requested input change, with empty strings normalised to "clear".
    ///
    /// Outer `None` means no change was requested.
    pub fn input_change(&self) -> Option<Option<&str>> {
        self.input
            .as_ref()
            .map(|input| input.as_deref().filter(|id| !id.is_empty()))
    }
}

/// Distinguishes a present-but-null field from an absent one.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// Input API Types
// ============================================================================

/// An input known to the input catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct InputInfo {
    pub id: String,
    pub display_name: String,
}

/// Response containing all catalog inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct InputListResponse {
    pub inputs: Vec<InputInfo>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
