use crate::projector::{project, FlowItem};
use crate::reconciler::StreamReconciler;
use crate::targets::AgentTarget;
use crate::throttle::RenderThrottle;
use crate::transport::{ChatTransport, TransportError};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wagerdesk_protocol::ChatMessage;

/// Submission failures.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A response stream is still active; one exchange at a time.
    #[error("a response stream is already active")]
    StreamActive,

    /// The transport refused the request.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Owns one conversation against one agent: the reconciled message log, the
/// event pump, and the throttled render channel.
///
/// Submissions are serialized; a new one is rejected while a stream is
/// active. Switching agents cancels any in-flight exchange, discards the
/// partially-applied log without flushing it, and starts the new agent from
/// an empty conversation.
pub struct ChatSurface {
    target: AgentTarget,
    transport: Arc<dyn ChatTransport>,
    reconciler: Arc<Mutex<StreamReconciler>>,
    throttle: Arc<Mutex<RenderThrottle>>,
    renders: watch::Receiver<Vec<FlowItem>>,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl ChatSurface {
    /// Create a surface talking to `target` over `transport`.
    pub fn new(target: AgentTarget, transport: Arc<dyn ChatTransport>) -> Self {
        let (tx, renders) = watch::channel(Vec::new());
        Self {
            target,
            transport,
            reconciler: Arc::new(Mutex::new(StreamReconciler::new())),
            throttle: Arc::new(Mutex::new(RenderThrottle::new(tx))),
            renders,
            cancel: CancellationToken::new(),
            pump: None,
        }
    }

    /// The agent currently selected.
    pub fn target(&self) -> &AgentTarget {
        &self.target
    }

    /// Subscribe to the throttled flow of renderable items.
    pub fn renders(&self) -> watch::Receiver<Vec<FlowItem>> {
        self.renders.clone()
    }

    /// Whether a response stream is currently active.
    pub fn is_streaming(&self) -> bool {
        self.pump.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Snapshot of the reconciled message log.
    pub fn message_log(&self) -> Vec<ChatMessage> {
        self.lock_reconciler().messages().to_vec()
    }

    /// The most recent terminal stream error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.lock_reconciler().last_error().map(str::to_string)
    }

    /// Send a user message and start pumping the response stream.
    ///
    /// The user message is appended and published before the request is
    /// sent, so it renders even when the transport fails.
    pub async fn submit(&mut self, text: impl Into<String>) -> Result<(), SubmitError> {
        if self.is_streaming() {
            return Err(SubmitError::StreamActive);
        }

        let history = {
            let mut reconciler = self.lock_reconciler();
            reconciler.append_user(text);
            reconciler.messages().to_vec()
        };
        self.lock_throttle().offer(project(&history), false);

        let stream = self.transport.open(&self.target.endpoint, &history).await?;
        self.lock_reconciler().begin_stream();

        let cancel = self.cancel.clone();
        let reconciler = Arc::clone(&self.reconciler);
        let throttle = Arc::clone(&self.throttle);
        self.pump = Some(tokio::spawn(async move {
            let mut stream = stream;
            loop {
                tokio::select! {
                    // Cancellation discards partially-applied state; the
                    // switch that triggered it resets the log.
                    _ = cancel.cancelled() => return,
                    event = stream.next() => {
                        let Some(event) = event else { break };
                        let terminal = event.is_terminal();
                        let (items, streaming) = {
                            let mut reconciler =
                                reconciler.lock().expect("reconciler lock poisoned");
                            reconciler.apply(event);
                            (project(reconciler.messages()), reconciler.is_streaming())
                        };
                        throttle
                            .lock()
                            .expect("throttle lock poisoned")
                            .offer(items, streaming);
                        if terminal {
                            return;
                        }
                    }
                }
            }

            // The stream ended without a terminal event; settle the final
            // state so the last publish is not left behind a delay.
            debug!("response stream ended without a terminal event");
            let items = {
                let mut reconciler = reconciler.lock().expect("reconciler lock poisoned");
                reconciler.finish_stream();
                project(reconciler.messages())
            };
            throttle
                .lock()
                .expect("throttle lock poisoned")
                .offer(items, false);
        }));

        Ok(())
    }

    /// Select a different agent, cancelling any in-flight exchange and
    /// clearing the conversation.
    pub fn switch_target(&mut self, target: AgentTarget) {
        debug!(from = %self.target.id, to = %target.id, "switching agent");
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.cancel = CancellationToken::new();

        self.lock_reconciler().reset();
        {
            let mut throttle = self.lock_throttle();
            throttle.cancel_pending();
            throttle.offer(Vec::new(), false);
        }
        self.target = target;
    }

    /// Wait for the active exchange, if any, to finish.
    pub async fn settled(&mut self) {
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
    }

    fn lock_reconciler(&self) -> std::sync::MutexGuard<'_, StreamReconciler> {
        self.reconciler.lock().expect("reconciler lock poisoned")
    }

    fn lock_throttle(&self) -> std::sync::MutexGuard<'_, RenderThrottle> {
        self.throttle.lock().expect("throttle lock poisoned")
    }
}

impl Drop for ChatSurface {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}
