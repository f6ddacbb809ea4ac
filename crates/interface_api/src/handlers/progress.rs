//! Progress channel over WebSocket
//!
//! Each connection gets its own [`ProgressSubscription`]; every message is
//! sent as one JSON text frame tagged by `type`. The server closes the socket
//! right after the terminal `completed` or `error` frame.

use std::borrow::Cow;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use tracing::{debug, info, warn};

use engine_batch::ProgressSubscription;

use crate::handlers::batches::parse_task_id;
use crate::{error::ApiError, AppState};

/// Upgrades to a WebSocket streaming a task's progress
///
/// The task is resolved before the upgrade so unknown ids get a plain 404.
pub async fn progress_socket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let task_id = parse_task_id(&id)?;
    let subscription = state.manager.subscribe(task_id).await?;
    Ok(ws.on_upgrade(move |socket| stream_progress(socket, subscription)))
}

async fn stream_progress(mut socket: WebSocket, mut subscription: ProgressSubscription) {
    let task_id = subscription.task_id();
    let connection_id = subscription.connection_id();
    info!(task_id = %task_id, connection_id = %connection_id, "Progress socket opened");

    loop {
        tokio::select! {
            next = subscription.next() => {
                let Some(message) = next else { break };
                let terminal = message.is_terminal();

                let frame = match serde_json::to_string(&message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(task_id = %task_id, error = %e, "Failed to encode progress message");
                        break;
                    }
                };
                if socket.send(Message::Text(frame)).await.is_err() {
                    debug!(task_id = %task_id, connection_id = %connection_id, "Observer went away");
                    return;
                }
                if terminal {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    info!(task_id = %task_id, connection_id = %connection_id, "Observer closed progress socket");
                    return;
                }
                // Client frames carry nothing
                Some(Ok(_)) => {}
            },
        }
    }

    let close = CloseFrame {
        code: close_code::NORMAL,
        reason: Cow::from("task finished"),
    };
    if socket.send(Message::Close(Some(close))).await.is_err() {
        debug!(task_id = %task_id, "Observer gone before close frame");
    }
    info!(task_id = %task_id, connection_id = %connection_id, "Progress socket closed");
}
