//! API handlers.

pub mod inputs;
pub mod mixers;
pub mod sse;
pub mod websocket;

use crate::mixer::MixerError;
use axum::{http::StatusCode, Json};
use mixdesk_types::ErrorResponse;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a registry error to its HTTP status and body.
///
/// An unknown input is a bad request rather than a missing resource: the
/// mixer and channel addressed by the URL exist.
pub fn error_response(err: MixerError) -> ApiError {
    let (status, message) = match &err {
        MixerError::MixerNotFound(_) => (StatusCode::NOT_FOUND, "No such mixer exists"),
        MixerError::ChannelNotFound { .. } => (
            StatusCode::NOT_FOUND,
            "Channel does not exist on the mixer",
        ),
        MixerError::InputNotFound(_) => (
            StatusCode::BAD_REQUEST,
            "Input with the given ID does not exist",
        ),
        MixerError::Conflict { .. } => (
            StatusCode::CONFLICT,
            "Source already assigned to a channel of this mixer",
        ),
        MixerError::InUse(_) => (StatusCode::LOCKED, "Mixer is in use"),
        MixerError::AlreadyDeleted(_) => (StatusCode::GONE, "Mixer was already deleted"),
        MixerError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
        MixerError::ChannelsExhausted(_) => (
            StatusCode::INSUFFICIENT_STORAGE,
            "Mixer cannot allocate more channels",
        ),
    };
    (
        status,
        Json(ErrorResponse::with_details(message, err.to_string())),
    )
}
