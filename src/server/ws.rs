use crate::errors::PricingError;
use crate::models::ValuationRequest;
use crate::server::routes::{rejected, valuate};
use crate::state::{AppState, ErrorResponse, PerfCounters, WsMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Live revaluation: every text frame is a `ValuationRequest`, every reply
/// is a `valuation` or `error` frame. The dashboard resends on each input
/// change.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    PerfCounters::bump(&state.counters.ws_sessions);
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!("ws session opened");

    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            _ => continue, // Ignore binary and control frames
        };

        let reply = handle_frame(&state, text.as_str());
        let json = match serde_json::to_string(&reply) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode ws reply");
                continue;
            }
        };

        if sender.send(Message::Text(json.into())).await.is_err() {
            break;
        }
        PerfCounters::bump(&state.counters.ws_messages_sent);
    }

    tracing::debug!("ws session closed");
}

fn handle_frame(state: &AppState, text: &str) -> WsMessage {
    let request_id = uuid::Uuid::new_v4();
    let request = match serde_json::from_str::<ValuationRequest>(text) {
        Ok(r) => r,
        Err(e) => {
            let e = rejected(state, request_id, PricingError::Parse(e.to_string()));
            return WsMessage::Error(ErrorResponse::from(&e));
        }
    };

    match valuate(state, request_id, &request) {
        Ok(resp) => WsMessage::Valuation(resp),
        Err(e) => WsMessage::Error(ErrorResponse::from(&e)),
    }
}
