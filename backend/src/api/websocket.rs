//! WebSocket endpoint for real-time mixer updates.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{sink::SinkExt, stream::StreamExt};
use mixdesk_types::MixerEvent;
use std::time::Duration;
use tokio::select;
use tokio::time::interval;
use tracing::{debug, error, info, trace};

use crate::state::AppState;

/// WebSocket endpoint streaming mixer events.
///
/// Every mixer or channel change is sent as a JSON message of the form
/// `{"type": "mixer_channel_update", "data": {...}}`. A WebSocket ping is
/// sent every 15 seconds, and a text `ping` from the client is answered
/// with `pong`.
#[utoipa::path(
    get,
    path = "/api/ws",
    tag = "events",
    responses(
        (status = 101, description = "WebSocket connection upgraded")
    )
)]
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!(
        "New WebSocket client connecting (total subscribers: {})",
        state.events().subscriber_count() + 1
    );
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.events().subscribe();

    // Ping interval for keep-alive
    let mut ping_interval = interval(Duration::from_secs(15));

    info!("WebSocket client connected");

    // Confirm the connection with an event the client can parse
    if let Err(e) = send_event(&mut sender, MixerEvent::Ping).await {
        error!("Failed to send welcome message: {}", e);
        return;
    }

    loop {
        select! {
            event_result = rx.recv() => {
                match event_result {
                    Ok(event) => {
                        if let Err(e) = send_event(&mut sender, event).await {
                            error!("Failed to send event to client: {}", e);
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Client is lagging, skipped {} events", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        info!("Event broadcaster closed, disconnecting client");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                trace!("Sending ping to client");
                if let Err(e) = sender.send(Message::Ping(vec![].into())).await {
                    debug!("Failed to send ping, client likely disconnected: {}", e);
                    break;
                }
            }

            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Pong(_))) => {
                        trace!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client sent close message");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        if text.trim() == "ping" {
                            debug!("Received ping from client, sending pong");
                            if let Err(e) = sender.send(Message::Text("pong".into())).await {
                                error!("Failed to send pong: {}", e);
                                break;
                            }
                        } else {
                            debug!("Ignoring text message from client: {}", text.as_str());
                        }
                    }
                    Some(Ok(_)) => {
                        debug!("Received other message type from client");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("Client disconnected");
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

/// Send an event to the client as a JSON message.
async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: MixerEvent,
) -> Result<(), axum::Error> {
    trace!("Sending event to client: {}", event.description());

    match serde_json::to_string(&event) {
        Ok(json) => {
            sender.send(Message::Text(json.into())).await?;
            Ok(())
        }
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            Err(axum::Error::new(e))
        }
    }
}
