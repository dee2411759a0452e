//! Client-side streaming chat pipeline.
//!
//! Protocol events flow through four stages: a [`transport`] adapter opens
//! the exchange and decodes SSE frames, the [`reconciler`] folds events into
//! an ordered message log, the [`projector`] derives the renderable flow from
//! that log, and the [`throttle`] debounces publishes toward the render
//! channel. A [`surface::ChatSurface`] owns the pipeline for one conversation
//! and handles agent selection.

pub mod projector;
pub mod reconciler;
pub mod surface;
pub mod targets;
pub mod throttle;
pub mod transport;

pub use projector::{display_label, project, Citation, FlowItem, KNOWLEDGE_BASE_TOOL};
pub use reconciler::StreamReconciler;
pub use surface::{ChatSurface, SubmitError};
pub use targets::{builtin_targets, AgentTarget};
pub use throttle::{DelayScheduler, RenderThrottle, PUBLISH_DELAY};
pub use transport::{
    ChatTransport, EventStream, HttpTransport, Script, ScriptedTransport, TransportError,
};
