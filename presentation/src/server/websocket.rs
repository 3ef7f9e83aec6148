//! WebSocket progress feed for one task
//!
//! The first message is an `ack` carrying the task's current snapshot. If
//! the task has already finished, its terminal message follows at once and
//! the socket closes; otherwise every later progress event is relayed until
//! the terminal one. Closing the socket never affects the task.

use super::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use pipeline_application::TaskWatch;
use pipeline_domain::{ProgressEvent, TaskId};
use serde_json::json;
use tracing::debug;

pub async fn task_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, task_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, task_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let watch = task_id
        .parse::<TaskId>()
        .ok()
        .and_then(|id| state.service.tasks().watch(&id).ok());

    match watch {
        Some(watch) => relay(watch, &mut sender, &mut receiver).await,
        None => {
            let message = json!({
                "type": "error",
                "task_id": task_id,
                "error": format!("Task {task_id} not found"),
            });
            let _ = sender.send(Message::Text(message.to_string())).await;
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    debug!(task_id = %task_id, "Progress socket closed");
}

async fn send_event<S>(sender: &mut S, event: &ProgressEvent) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(event) {
        Ok(text) => sender.send(Message::Text(text)).await.is_ok(),
        Err(_) => false,
    }
}

/// Forward a task's events to the client until the task finishes or the
/// client goes away. Answers `ping` with `pong` in between.
pub async fn relay<S, R, E>(watch: TaskWatch, sender: &mut S, receiver: &mut R)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    if !send_event(sender, &watch.ack()).await {
        return;
    }
    if let Some(terminal) = watch.snapshot.terminal_event() {
        send_event(sender, &terminal).await;
        return;
    }
    let Some(mut updates) = watch.updates else {
        return;
    };

    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(event) = update else { break };
                if !send_event(sender, &event).await || event.is_terminal() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) if text.trim() == "ping" => {
                    if sender.send(Message::Text("pong".to_string())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
