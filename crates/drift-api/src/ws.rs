use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use drift_hub::{DiscoveryHub, Event, EventFilter};
use serde_json::{json, Value};
use tracing::debug;

use crate::state::AppState;

/// Per-client outbound queue. A client slower than this many frames behind
/// gets its events dropped (by the bus, not this handler) rather than
/// backing up the publisher.
const CLIENT_QUEUE_SIZE: usize = 64;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_events(socket, state))
}

async fn forward_events(mut socket: WebSocket, state: AppState) {
    let mut subscription = state.hub.bus().subscribe(EventFilter::all(), CLIENT_QUEUE_SIZE).await;
    loop {
        tokio::select! {
            event = subscription.receiver.recv() => {
                let Some(event) = event else { break };
                let frame = json!({"type": event.event_type, "data": event.data});
                if socket.send(Message::Text(frame.to_string())).await.is_err() {
                    debug!("websocket client disconnected mid-send");
                    break;
                }
            }
            incoming = socket.recv() => {
                if incoming.is_none() {
                    break;
                }
            }
        }
    }
    state.hub.bus().unsubscribe(subscription.id).await;
}

/// Entry point for callers outside the normal discovery/analysis flow (the
/// CLI, tests) that want to push an event straight to connected WS clients.
pub async fn ws_broadcast(hub: &DiscoveryHub, event_type: &str, payload: Value) {
    hub.bus().publish(Event::new(event_type, None, payload, Utc::now())).await;
}
