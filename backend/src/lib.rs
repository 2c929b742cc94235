//! Mixdesk backend library.
//!
//! The mixer registry core lives in [`mixer`], with its collaborators in
//! [`input`], [`engine`] and [`events`]. The HTTP surface built here is a thin
//! layer over it and is exposed for use in tests.

use axum::http::HeaderValue;
use axum::http::{header, Method};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod config;
pub mod engine;
pub mod events;
pub mod input;
pub mod mixer;
pub mod openapi;
pub mod state;

use state::AppState;

/// Create the Axum application router.
///
/// This function is used both by the main server binary and by integration tests.
pub fn create_app() -> Router {
    create_app_with_state(AppState::default())
}

/// Create the Axum application router with a given state.
pub fn create_app_with_state(state: AppState) -> Router {
    create_app_with_config(state, Vec::new())
}

/// Create the Axum application router with a given state and CORS origins.
///
/// If `cors_allowed_origins` is empty, any origin is allowed.
/// Otherwise, only the specified origins are allowed.
pub fn create_app_with_config(state: AppState, cors_allowed_origins: Vec<String>) -> Router {
    let api_router = Router::new()
        .route(
            "/audio/mixer",
            get(api::mixers::list_mixers).post(api::mixers::create_mixer),
        )
        .route(
            "/audio/mixer/{id}",
            get(api::mixers::get_mixer)
                .put(api::mixers::update_mixer)
                .delete(api::mixers::delete_mixer),
        )
        .route(
            "/audio/mixer/{id}/sink",
            post(api::mixers::attach_sink).delete(api::mixers::detach_sink),
        )
        .route("/audio/mixer/{id}/channel", post(api::mixers::create_channel))
        .route(
            "/audio/mixer/{id}/channel/{channel_id}",
            put(api::mixers::update_channel).delete(api::mixers::delete_channel),
        )
        .route("/audio/input", get(api::inputs::list_inputs))
        .route("/events", get(api::sse::events_stream))
        .route("/ws", get(api::websocket::websocket_handler));

    Router::new()
        .route("/health", get(health))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

            if cors_allowed_origins.is_empty() {
                cors.allow_origin(Any)
            } else {
                let origins: Vec<HeaderValue> = cors_allowed_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            }
        })
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
