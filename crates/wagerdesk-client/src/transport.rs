use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};
use wagerdesk_protocol::{ChatMessage, StreamEvent};

/// A finite stream of protocol events for one chat exchange.
pub type EventStream = BoxStream<'static, StreamEvent>;

/// Transport failures surfaced before any event is delivered. Failures after
/// the stream opens arrive in-band as [`StreamEvent::Error`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or was rejected before streaming began.
    #[error("chat request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("chat endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, usually a plain-text diagnostic.
        body: String,
    },
}

/// Opens a streaming exchange against a chat endpoint.
///
/// Implementations translate the conversation so far into one request and
/// hand back the ordered event stream. Frames the implementation cannot
/// decode are logged and skipped, never surfaced as stream items.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the conversation to the given endpoint and open the response
    /// event stream.
    async fn open(
        &self,
        endpoint: &str,
        messages: &[ChatMessage],
    ) -> Result<EventStream, TransportError>;
}

/// HTTP transport speaking SSE against a chat service.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(
        &self,
        endpoint: &str,
        messages: &[ChatMessage],
    ) -> Result<EventStream, TransportError> {
        let url = format!("{}{endpoint}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response.bytes_stream();
        Ok(Box::pin(async_stream::stream! {
            let mut buffer = String::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        yield StreamEvent::error(format!("stream interrupted: {err}"));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(frame_end) = buffer.find("\n\n") {
                    let frame: String = buffer.drain(..frame_end + 2).collect();
                    for payload in frame.lines().filter_map(|l| l.strip_prefix("data: ")) {
                        if payload == DONE_TRAILER {
                            return;
                        }
                        match serde_json::from_str::<StreamEvent>(payload) {
                            Ok(event) => yield event,
                            Err(err) => {
                                warn!(%err, payload, "skipping undecodable stream frame");
                            }
                        }
                    }
                }
            }
            debug!("response body ended without a [DONE] trailer");
        }))
    }
}

const DONE_TRAILER: &str = "[DONE]";

/// One pre-scripted exchange replayed by [`ScriptedTransport`].
pub struct Script {
    /// Events delivered in order.
    pub events: Vec<StreamEvent>,
    /// Keep the stream open (pending forever) after the last event, to model
    /// a response that never terminates.
    pub hold_open: bool,
}

impl Script {
    /// A script that delivers its events and then ends.
    pub fn finite(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            hold_open: false,
        }
    }

    /// A script that delivers its events and then hangs.
    pub fn hanging(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            hold_open: true,
        }
    }
}

/// Deterministic transport replaying pre-scripted exchanges in order.
///
/// Each [`ChatTransport::open`] pops the next script; opening past the end
/// fails, which tests use to assert a submission was never sent.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
}

impl ScriptedTransport {
    /// Create a transport replaying the given scripts.
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(
        &self,
        _endpoint: &str,
        _messages: &[ChatMessage],
    ) -> Result<EventStream, TransportError> {
        let script = self
            .scripts
            .lock()
            .expect("scripted transport lock poisoned")
            .pop_front()
            .ok_or_else(|| TransportError::Request("no scripted exchange left".into()))?;

        let events = futures::stream::iter(script.events);
        if script.hold_open {
            Ok(Box::pin(events.chain(futures::stream::pending())))
        } else {
            Ok(Box::pin(events))
        }
    }
}
