//! Mixer and mixer channel API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use mixdesk_types::{
    ChannelCreatedResponse, ChannelId, CreateMixerRequest, ErrorResponse, MixerId,
    MixerListResponse, MixerResponse, UpdateChannelRequest, UpdateMixerRequest,
};
use tracing::info;

use super::{error_response, ApiError};
use crate::input::InputCatalog;
use crate::state::AppState;

/// List all mixers.
#[utoipa::path(
    get,
    path = "/api/audio/mixer",
    tag = "mixers",
    responses(
        (status = 200, description = "List all mixers", body = MixerListResponse)
    )
)]
pub async fn list_mixers(State(state): State<AppState>) -> Json<MixerListResponse> {
    let mixers = state
        .registry()
        .get_all_mixers()
        .iter()
        .map(|m| m.summary())
        .collect();
    Json(MixerListResponse { mixers })
}

/// Create a new mixer.
#[utoipa::path(
    post,
    path = "/api/audio/mixer",
    tag = "mixers",
    request_body = CreateMixerRequest,
    responses(
        (status = 201, description = "Mixer created", body = MixerResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_mixer(
    State(state): State<AppState>,
    Json(req): Json<CreateMixerRequest>,
) -> Result<(StatusCode, Json<MixerResponse>), ApiError> {
    if let Err(report) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details(
                "Invalid request",
                report.to_string(),
            )),
        ));
    }

    let channels = req.channels.unwrap_or(state.default_output_channels());
    info!(
        "Received create mixer request: display_name='{}', channels={}",
        req.display_name, channels
    );

    let mixer = state
        .registry()
        .add_mixer(req.display_name, channels)
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(MixerResponse {
            mixer: mixer.details(),
        }),
    ))
}

/// Get a mixer including its channels.
#[utoipa::path(
    get,
    path = "/api/audio/mixer/{id}",
    tag = "mixers",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)")
    ),
    responses(
        (status = 200, description = "Mixer found", body = MixerResponse),
        (status = 404, description = "Mixer not found", body = ErrorResponse)
    )
)]
pub async fn get_mixer(
    State(state): State<AppState>,
    Path(id): Path<MixerId>,
) -> Result<Json<MixerResponse>, ApiError> {
    let mixer = state.registry().get_mixer(&id).map_err(error_response)?;
    Ok(Json(MixerResponse {
        mixer: mixer.details(),
    }))
}

/// Update a mixer's attributes.
#[utoipa::path(
    put,
    path = "/api/audio/mixer/{id}",
    tag = "mixers",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)")
    ),
    request_body = UpdateMixerRequest,
    responses(
        (status = 200, description = "Mixer updated", body = MixerResponse),
        (status = 404, description = "Mixer not found", body = ErrorResponse),
        (status = 410, description = "Mixer was deleted concurrently", body = ErrorResponse)
    )
)]
pub async fn update_mixer(
    State(state): State<AppState>,
    Path(id): Path<MixerId>,
    Json(req): Json<UpdateMixerRequest>,
) -> Result<Json<MixerResponse>, ApiError> {
    let mixer = state.registry().get_mixer(&id).map_err(error_response)?;
    if let Some(display_name) = req.display_name {
        mixer.rename(display_name).map_err(error_response)?;
    }
    Ok(Json(MixerResponse {
        mixer: mixer.details(),
    }))
}

/// Delete a mixer.
#[utoipa::path(
    delete,
    path = "/api/audio/mixer/{id}",
    tag = "mixers",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)")
    ),
    responses(
        (status = 204, description = "Mixer deleted"),
        (status = 404, description = "Mixer not found", body = ErrorResponse),
        (status = 410, description = "Mixer was deleted concurrently", body = ErrorResponse),
        (status = 423, description = "Mixer is in use", body = ErrorResponse)
    )
)]
pub async fn delete_mixer(
    State(state): State<AppState>,
    Path(id): Path<MixerId>,
) -> Result<StatusCode, ApiError> {
    let mixer = state.registry().get_mixer(&id).map_err(error_response)?;
    state
        .registry()
        .delete_mixer(&mixer)
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a channel to a mixer.
#[utoipa::path(
    post,
    path = "/api/audio/mixer/{id}/channel",
    tag = "channels",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)")
    ),
    responses(
        (status = 201, description = "Channel created", body = ChannelCreatedResponse),
        (status = 404, description = "Mixer not found", body = ErrorResponse),
        (status = 410, description = "Mixer was deleted concurrently", body = ErrorResponse),
        (status = 423, description = "Mixer is in use", body = ErrorResponse),
        (status = 507, description = "Mixer has no channel ids left", body = ErrorResponse)
    )
)]
pub async fn create_channel(
    State(state): State<AppState>,
    Path(id): Path<MixerId>,
) -> Result<(StatusCode, Json<ChannelCreatedResponse>), ApiError> {
    let mixer = state.registry().get_mixer(&id).map_err(error_response)?;
    let channel = mixer.add_channel().map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(ChannelCreatedResponse { mixer: id, channel }),
    ))
}

/// Update a mixer channel's input routing and/or gain.
///
/// Both changes are applied together; if the input is rejected the gain is
/// left unchanged as well.
#[utoipa::path(
    put,
    path = "/api/audio/mixer/{id}/channel/{channel_id}",
    tag = "channels",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)"),
        ("channel_id" = u32, Path, description = "Channel ID within the mixer")
    ),
    request_body = UpdateChannelRequest,
    responses(
        (status = 200, description = "Channel updated", body = MixerResponse),
        (status = 400, description = "Unknown input", body = ErrorResponse),
        (status = 404, description = "Mixer or channel not found", body = ErrorResponse),
        (status = 409, description = "Input already routed to another channel", body = ErrorResponse),
        (status = 410, description = "Mixer was deleted concurrently", body = ErrorResponse)
    )
)]
pub async fn update_channel(
    State(state): State<AppState>,
    Path((id, channel_id)): Path<(MixerId, ChannelId)>,
    Json(req): Json<UpdateChannelRequest>,
) -> Result<Json<MixerResponse>, ApiError> {
    let mixer = state.registry().get_mixer(&id).map_err(error_response)?;
    mixer.get_channel(channel_id).map_err(error_response)?;

    let input = req
        .input_change()
        .map(|input_id| {
            input_id
                .map(|input_id| state.inputs().resolve(input_id))
                .transpose()
        })
        .transpose()
        .map_err(error_response)?;

    mixer
        .update_channel(channel_id, input, req.gain)
        .map_err(error_response)?;

    Ok(Json(MixerResponse {
        mixer: mixer.details(),
    }))
}

/// Remove a channel from a mixer.
#[utoipa::path(
    delete,
    path = "/api/audio/mixer/{id}/channel/{channel_id}",
    tag = "channels",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)"),
        ("channel_id" = u32, Path, description = "Channel ID within the mixer")
    ),
    responses(
        (status = 204, description = "Channel removed"),
        (status = 404, description = "Mixer or channel not found", body = ErrorResponse),
        (status = 410, description = "Mixer was deleted concurrently", body = ErrorResponse)
    )
)]
pub async fn delete_channel(
    State(state): State<AppState>,
    Path((id, channel_id)): Path<(MixerId, ChannelId)>,
) -> Result<StatusCode, ApiError> {
    let mixer = state.registry().get_mixer(&id).map_err(error_response)?;
    mixer.remove_channel(channel_id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a mixer's output to the engine's output sink.
#[utoipa::path(
    post,
    path = "/api/audio/mixer/{id}/sink",
    tag = "mixers",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)")
    ),
    responses(
        (status = 204, description = "Mixer attached"),
        (status = 404, description = "Mixer not found", body = ErrorResponse)
    )
)]
pub async fn attach_sink(
    State(state): State<AppState>,
    Path(id): Path<MixerId>,
) -> Result<StatusCode, ApiError> {
    state.registry().get_mixer(&id).map_err(error_response)?;
    if !state.engine().attach_sink(&id) {
        return Err(error_response(crate::mixer::MixerError::MixerNotFound(id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Detach a mixer's output from the engine's output sink.
#[utoipa::path(
    delete,
    path = "/api/audio/mixer/{id}/sink",
    tag = "mixers",
    params(
        ("id" = String, Path, description = "Mixer ID (UUID)")
    ),
    responses(
        (status = 204, description = "Mixer detached"),
        (status = 404, description = "Mixer not found", body = ErrorResponse)
    )
)]
pub async fn detach_sink(
    State(state): State<AppState>,
    Path(id): Path<MixerId>,
) -> Result<StatusCode, ApiError> {
    state.registry().get_mixer(&id).map_err(error_response)?;
    if !state.engine().detach_sink(&id) {
        return Err(error_response(crate::mixer::MixerError::MixerNotFound(id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
