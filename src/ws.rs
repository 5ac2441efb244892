use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::protocol::ChatEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub team: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(team) = params.team.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing team").into_response();
    };

    tracing::info!(%team, "WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, team, state))
}

async fn send_event<S>(sender: &mut S, event: &ChatEvent) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(event) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize event: {}", e);
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, team: String, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    let (history, events) = state.events.subscribe(&team).await;

    stream_events(sender, receiver, &team, history, events).await;

    tracing::info!(%team, "WebSocket connection closed");
}

/// Replay the team's sticky history, then stream live events until the
/// client goes away or the team channel closes
pub(crate) async fn stream_events<S, R>(
    mut sender: S,
    mut receiver: R,
    team: &str,
    history: Vec<ChatEvent>,
    mut events: broadcast::Receiver<ChatEvent>,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    for event in &history {
        if !send_event(&mut sender, event).await {
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !send_event(&mut sender, &event).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%team, skipped, "WebSocket client lagging, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(%team, "WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    // Clients submit over HTTP; anything else is ignored
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}
