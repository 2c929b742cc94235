//! Input catalog API handlers.

use axum::{extract::State, Json};
use mixdesk_types::{InputInfo, InputListResponse};

use crate::input::InputCatalog;
use crate::state::AppState;

/// List the inputs that can be routed to mixer channels.
#[utoipa::path(
    get,
    path = "/api/audio/input",
    tag = "inputs",
    responses(
        (status = 200, description = "List all inputs", body = InputListResponse)
    )
)]
pub async fn list_inputs(State(state): State<AppState>) -> Json<InputListResponse> {
    let inputs = state.inputs().list().iter().map(InputInfo::from).collect();
    Json(InputListResponse { inputs })
}
