use crate::error::{MixerError, Result};
use crate::protocol::{Request, Response};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

/// WebSocket connection state
struct ConnectionState {
    /// Pending requests waiting for responses
    pending_requests: HashMap<Uuid, oneshot::Sender<Response>>,
    /// Channel for sending outgoing messages
    ws_tx: mpsc::UnboundedSender<Message>,
}

/// Low-level WebSocket connection handler
///
/// The reader and writer tasks are spawned on the runtime current at
/// [`connect`](Self::connect); they only make progress while that runtime is
/// driven.
pub struct Connection {
    state: Arc<Mutex<ConnectionState>>,
    request_timeout: Duration,
}

impl Connection {
    /// Connect to a WebSocket URL
    pub async fn connect(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let url = url.into();
        tracing::info!("Connecting to {}", url);

        let (ws_stream, _) = connect_async(&url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::unbounded_channel::<Message>();

        let state = Arc::new(Mutex::new(ConnectionState {
            pending_requests: HashMap::new(),
            ws_tx,
        }));

        // Spawn task to forward outgoing messages to WebSocket
        let write_handle = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Spawn task to receive and route responses
        let state_clone = state.clone();
        tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = Self::handle_message(&state_clone, text).await {
                            tracing::error!("Error handling message: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("WebSocket connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // Connection closed, cancel all pending requests
            let mut state = state_clone.lock().await;
            state.pending_requests.clear();
            drop(write_handle);
        });

        Ok(Self {
            state,
            request_timeout,
        })
    }

    /// Handle an incoming message
    async fn handle_message(state: &Arc<Mutex<ConnectionState>>, text: String) -> Result<()> {
        tracing::debug!("Received: {}", text);

        let response: Response = serde_json::from_str(&text)?;

        let mut state = state.lock().await;
        match state.pending_requests.remove(&response.meta.id) {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => tracing::debug!("Dropping unsolicited message {}", response.meta.id),
        }

        Ok(())
    }

    /// Send a request and wait for the response
    pub async fn send_request(&self, request: Request) -> Result<Response> {
        let request_id = request.id();
        let (tx, rx) = oneshot::channel();

        // Register the pending request
        {
            let mut state = self.state.lock().await;
            state.pending_requests.insert(request_id, tx);

            let json = serde_json::to_string(&request)?;
            tracing::debug!("Sending: {}", json);

            state
                .ws_tx
                .send(Message::Text(json))
                .map_err(|_| MixerError::ConnectionClosed)?;
        }

        // Wait for response with timeout
        let response = match timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(MixerError::ConnectionClosed),
            Err(_) => {
                // Timeout - remove from pending requests
                let mut state = self.state.lock().await;
                state.pending_requests.remove(&request_id);
                return Err(MixerError::Timeout);
            }
        };

        if response.has_errors() {
            if let Some(detail) = response.error_message() {
                return Err(MixerError::ApiError { detail });
            }
        }

        Ok(response)
    }

    /// Send a request without waiting for a response (fire and forget)
    pub async fn send_only(&self, request: Request) -> Result<()> {
        let state = self.state.lock().await;
        let json = serde_json::to_string(&request)?;
        tracing::debug!("Sending (no response): {}", json);

        state
            .ws_tx
            .send(Message::Text(json))
            .map_err(|_| MixerError::ConnectionClosed)?;

        Ok(())
    }
}
