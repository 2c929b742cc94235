//! Server-Sent Events endpoint for real-time updates.

use axum::extract::State;
use axum::response::sse::Sse;
use futures::Stream;
use std::convert::Infallible;
use tracing::info;

use crate::state::AppState;

/// Subscribe to Server-Sent Events for real-time updates.
///
/// Streams an event whenever a mixer is created, renamed or deleted, or one
/// of its channels is added, updated or removed. The SSE event name is the
/// mixer event name, so clients can listen selectively:
/// ```javascript
/// const source = new EventSource('/api/events');
/// source.addEventListener('mixer_channel_update', (event) => {
///     console.log(JSON.parse(event.data));
/// });
/// ```
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "events",
    responses(
        (status = 200, description = "Event stream (text/event-stream)")
    )
)]
pub async fn events_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    info!(
        "New SSE client connected (total subscribers: {})",
        state.events().subscriber_count() + 1
    );
    state.events().sse_stream()
}
