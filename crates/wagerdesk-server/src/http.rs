use crate::encoder::StreamEncoder;
use crate::service::{ApiError, AppState};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;
use wagerdesk_agents::{ModelMessage, ResolvedAgent};
use wagerdesk_protocol::{StreamEvent, STREAM_PROTOCOL_VERSION};

/// Chat endpoint path; the segment selects the agent profile.
pub const CHAT_PATH: &str = "/api/:agent_id";

/// Build the chat routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(CHAT_PATH, post(chat))
}

async fn chat(
    State(st): State<AppState>,
    Path(agent_id): Path<String>,
    Json(req): Json<Value>,
) -> Result<Response, ApiError> {
    let messages = req
        .get("messages")
        .and_then(|m| m.as_array())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("messages missing or empty".to_string()))?;

    let resolved = st.registry.resolve(&agent_id)?;
    let history = history_from_request(messages);
    debug!(agent = %agent_id, messages = history.len(), "starting chat run");

    Ok(stream_run(resolved, history))
}

/// Convert incoming UI messages to the model transcript. Parts-based text is
/// concatenated; a plain `content` string is accepted as a fallback. Messages
/// with no usable role or text are skipped.
fn history_from_request(messages: &[Value]) -> Vec<ModelMessage> {
    messages
        .iter()
        .filter_map(|message| {
            let role = message.get("role").and_then(|r| r.as_str())?;
            let text = message_text(message);
            match role {
                "user" => Some(ModelMessage::user(text)),
                "assistant" => Some(ModelMessage::assistant(text)),
                other => {
                    warn!(role = %other, "skipping message with unsupported role");
                    None
                }
            }
        })
        .filter(|m| !m.content.is_empty())
        .collect()
}

fn message_text(message: &Value) -> String {
    if let Some(parts) = message.get("parts").and_then(|p| p.as_array()) {
        return parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();
    }
    message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Run the agent and stream the encoded response as SSE.
fn stream_run(resolved: ResolvedAgent, history: Vec<ModelMessage>) -> Response {
    let run_id = Uuid::now_v7().simple().to_string();
    let mut encoder = StreamEncoder::new(&run_id);
    let mut events = resolved.runner().run(history);

    let (tx, rx) = mpsc::channel::<Bytes>(64);
    tokio::spawn(async move {
        for event in encoder.prologue() {
            if send_frame(&tx, &event).await.is_err() {
                return;
            }
        }
        while let Some(event) = events.next().await {
            for out in encoder.on_event(&event) {
                if send_frame(&tx, &out).await.is_err() {
                    return;
                }
            }
        }
        let _ = tx.send(Bytes::from("data: [DONE]\n\n")).await;
    });

    sse_response(rx)
}

/// Serialize one event as an SSE `data:` frame. A send error means the
/// client went away, which ends the pump.
async fn send_frame(tx: &mpsc::Sender<Bytes>, event: &StreamEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE protocol event");
            return Ok(());
        }
    };
    tx.send(Bytes::from(format!("data: {json}\n\n")))
        .await
        .map_err(|_| ())
}

fn sse_response(mut rx: mpsc::Receiver<Bytes>) -> Response {
    let stream = async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(chunk);
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::HeaderName::from_static("x-vercel-ai-ui-message-stream"),
        HeaderValue::from_static(STREAM_PROTOCOL_VERSION),
    );
    (headers, Body::from_stream(stream)).into_response()
}
