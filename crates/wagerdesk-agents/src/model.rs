use crate::ToolDescriptor;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Model invocation failures.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider rejected the request or failed mid-stream.
    #[error("model provider error: {0}")]
    Provider(String),
}

/// Role of a transcript message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    /// System prompt.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool execution result fed back to the model.
    Tool,
}

/// A tool call recorded on an assistant transcript message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Stable call identifier.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Complete arguments.
    pub arguments: Value,
}

/// One message in the transcript handed to the model each step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMessage {
    /// Sender role.
    pub role: ModelRole,
    /// Text content.
    pub content: String,
    /// Tool calls issued by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    /// Call id answered by a tool message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ModelMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ModelRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ModelRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a tool-result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ModelRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Incremental output of one model step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Incremental answer text.
    TextDelta(String),
    /// Incremental reasoning text.
    ReasoningDelta(String),
    /// The model started emitting a tool call.
    ToolCallStart {
        /// Stable call identifier.
        id: String,
        /// Tool name.
        name: String,
    },
    /// Incremental raw argument text for an announced tool call.
    ToolCallDelta {
        /// Identifier matching the start event.
        id: String,
        /// Incremental argument text.
        args_delta: String,
    },
    /// A tool call's arguments are complete.
    ToolCallReady {
        /// Identifier matching the start event.
        id: String,
        /// Tool name.
        name: String,
        /// Complete arguments.
        arguments: Value,
    },
}

/// Per-step event stream produced by a model.
pub type ModelEventStream = BoxStream<'static, Result<ModelEvent, ModelError>>;

/// Model-invocation collaborator: given a system prompt, transcript, and a
/// bounded tool set, produce one step's event stream. The runner calls this
/// repeatedly up to the profile's step cap.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Stream one inference step.
    async fn stream_step(
        &self,
        system_prompt: &str,
        messages: &[ModelMessage],
        tools: &[ToolDescriptor],
    ) -> Result<ModelEventStream, ModelError>;
}

/// Deterministic model that replays pre-scripted steps in order.
///
/// Each call to [`ChatModel::stream_step`] pops the next script; once the
/// scripts are exhausted every further step streams nothing, which ends the
/// runner loop.
#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Vec<ModelEvent>>>,
}

impl ScriptedModel {
    /// Create a model that replays the given steps.
    pub fn new(steps: impl IntoIterator<Item = Vec<ModelEvent>>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
        }
    }

    /// Convenience: a single step streaming one text answer.
    pub fn answering(text: impl Into<String>) -> Self {
        Self::new([vec![ModelEvent::TextDelta(text.into())]])
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream_step(
        &self,
        _system_prompt: &str,
        _messages: &[ModelMessage],
        _tools: &[ToolDescriptor],
    ) -> Result<ModelEventStream, ModelError> {
        let events = self
            .steps
            .lock()
            .expect("scripted model lock poisoned")
            .pop_front()
            .unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}
