use crate::projector::FlowItem;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Delay applied to mid-stream render publishes.
pub const PUBLISH_DELAY: Duration = Duration::from_millis(30);

/// Runs one deferred action after a delay, cancelling any previous one.
///
/// At most one action is pending at a time; scheduling replaces the pending
/// action, so only the latest scheduled work ever runs.
#[derive(Default)]
pub struct DelayScheduler {
    pending: Option<JoinHandle<()>>,
}

impl DelayScheduler {
    /// Create an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `work` to run after `delay`, replacing any pending action.
    pub fn schedule<F>(&mut self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        // Anchor the deadline at schedule time, not at the spawned task's
        // first poll, so the delay is measured from this call.
        let sleep = tokio::time::sleep(delay);
        self.pending = Some(tokio::spawn(async move {
            sleep.await;
            work();
        }));
    }

    /// Drop the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for DelayScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Default)]
struct Published {
    items: Vec<FlowItem>,
    tool_ids: HashSet<String>,
}

/// Debounces flow publishes toward the render channel.
///
/// Mid-stream updates are coalesced behind a short delay so rapid deltas
/// produce one publish, with two exceptions that publish immediately: the
/// stream is no longer active (the final state must not lag), or the flow
/// contains a tool call not yet published (tool cards appear the moment the
/// call starts). Offering a flow identical to the last published one is a
/// no-op that also drops any stale pending publish.
pub struct RenderThrottle {
    delay: Duration,
    tx: watch::Sender<Vec<FlowItem>>,
    published: Arc<Mutex<Published>>,
    scheduler: DelayScheduler,
}

impl RenderThrottle {
    /// Create a throttle publishing into `tx` with the default delay.
    pub fn new(tx: watch::Sender<Vec<FlowItem>>) -> Self {
        Self::with_delay(PUBLISH_DELAY, tx)
    }

    /// Create a throttle with an explicit delay.
    pub fn with_delay(delay: Duration, tx: watch::Sender<Vec<FlowItem>>) -> Self {
        Self {
            delay,
            tx,
            published: Arc::new(Mutex::new(Published::default())),
            scheduler: DelayScheduler::new(),
        }
    }

    /// Offer the latest projected flow for publication.
    pub fn offer(&mut self, items: Vec<FlowItem>, streaming: bool) {
        let new_tool_call = {
            let published = self.published.lock().expect("throttle state lock poisoned");
            if items == published.items {
                self.scheduler.cancel();
                return;
            }
            tool_ids(&items)
                .iter()
                .any(|id| !published.tool_ids.contains(id))
        };

        if !streaming || new_tool_call {
            self.scheduler.cancel();
            publish(&self.tx, &self.published, items);
        } else {
            let tx = self.tx.clone();
            let published = self.published.clone();
            self.scheduler
                .schedule(self.delay, move || publish(&tx, &published, items));
        }
    }

    /// Drop any deferred publish without sending it.
    pub fn cancel_pending(&mut self) {
        self.scheduler.cancel();
    }
}

fn tool_ids(items: &[FlowItem]) -> HashSet<String> {
    items
        .iter()
        .filter_map(|item| match item {
            FlowItem::ToolCall { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect()
}

fn publish(
    tx: &watch::Sender<Vec<FlowItem>>,
    published: &Arc<Mutex<Published>>,
    items: Vec<FlowItem>,
) {
    {
        let mut published = published.lock().expect("throttle state lock poisoned");
        published.tool_ids = tool_ids(&items);
        published.items = items.clone();
    }
    // Send only fails when every receiver is gone, which just means nothing
    // is rendering.
    let _ = tx.send(items);
}
