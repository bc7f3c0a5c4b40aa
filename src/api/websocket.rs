//! WebSocket handler for the live dashboard feed
//!
//! Every connection becomes one [`Listener`]. The write half of the socket
//! lives inside the listener, so a dead connection surfaces as a failed
//! delivery and the notifier drops it on its own.

use async_trait::async_trait;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::SplitSink, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::state::ApiState;
use crate::notifier::{DeliveryError, Listener};
use crate::registry::TargetSnapshot;

/// Pushes snapshots as JSON text frames over one socket
pub struct WebSocketListener {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketListener {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl Listener for WebSocketListener {
    async fn deliver(&self, snapshot: &[TargetSnapshot]) -> Result<(), DeliveryError> {
        let text = serde_json::to_string(snapshot)?;

        self.sink
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: ApiState) {
    info!("WebSocket client connected");

    let (sender, mut receiver) = socket.split();

    // Subscribing also sends the initial state
    let listener = Arc::new(WebSocketListener::new(sender));
    let id = match state.engine.subscribe(listener).await {
        Ok(id) => id,
        Err(e) => {
            debug!("initial sync failed, dropping client: {e}");
            return;
        }
    };

    // Incoming frames carry nothing yet; drain them until the client leaves
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Close(_) => break,
            Message::Ping(_) => {
                // Pong is automatically sent by axum
                debug!("Received ping");
            }
            _ => {}
        }
    }

    state.engine.unsubscribe(id).await;

    info!("WebSocket client disconnected");
}
