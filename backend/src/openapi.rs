//! OpenAPI documentation configuration.

use mixdesk_types::api::{
    ChannelCreatedResponse, ChannelInfo, CreateMixerRequest, ErrorResponse, InputInfo,
    InputListResponse, MixerDetails, MixerListResponse, MixerResponse, MixerSummary,
    UpdateChannelRequest, UpdateMixerRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::mixers::list_mixers,
        crate::api::mixers::create_mixer,
        crate::api::mixers::get_mixer,
        crate::api::mixers::update_mixer,
        crate::api::mixers::delete_mixer,
        crate::api::mixers::attach_sink,
        crate::api::mixers::detach_sink,
        crate::api::mixers::create_channel,
        crate::api::mixers::update_channel,
        crate::api::mixers::delete_channel,
        crate::api::inputs::list_inputs,
        crate::api::sse::events_stream,
        crate::api::websocket::websocket_handler,
    ),
    components(
        schemas(
            CreateMixerRequest,
            UpdateMixerRequest,
            MixerSummary,
            MixerDetails,
            MixerResponse,
            MixerListResponse,
            ChannelInfo,
            ChannelCreatedResponse,
            UpdateChannelRequest,
            InputInfo,
            InputListResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "mixers", description = "Mixer management endpoints"),
        (name = "channels", description = "Mixer channel routing endpoints"),
        (name = "inputs", description = "Input catalog endpoints"),
        (name = "events", description = "Real-time change notifications")
    ),
    info(
        title = "Mixdesk Mixer Registry API",
        version = "0.1.0",
        description = "REST API for managing audio mixers, their channels and input routing",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_mixer_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| *p == "/api/audio/mixer"));
        assert!(paths
            .iter()
            .any(|p| *p == "/api/audio/mixer/{id}/channel/{channel_id}"));
    }
}
