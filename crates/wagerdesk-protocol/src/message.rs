use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Streaming state for text and reasoning parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Content is still streaming.
    Streaming,
    /// Content streaming is complete.
    Done,
}

/// Tool call lifecycle state.
///
/// Transitions are monotonic: a part only moves forward through
/// `input-streaming → input-available → output-available | output-error`,
/// and both output states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// Tool input is being streamed.
    InputStreaming,
    /// Tool input is complete, ready for execution.
    InputAvailable,
    /// Tool execution completed with output.
    OutputAvailable,
    /// Tool execution resulted in error.
    OutputError,
}

impl ToolState {
    /// Position in the lifecycle order. Both terminal states share a rank.
    pub fn rank(self) -> u8 {
        match self {
            ToolState::InputStreaming => 0,
            ToolState::InputAvailable => 1,
            ToolState::OutputAvailable | ToolState::OutputError => 2,
        }
    }

    /// Whether a transition from `self` to `next` moves forward.
    pub fn can_advance_to(self, next: ToolState) -> bool {
        next.rank() > self.rank()
    }

    /// Whether this state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolState::OutputAvailable | ToolState::OutputError)
    }
}

/// A tool invocation within a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolPart {
    /// Stable call identifier shared by all lifecycle events.
    #[serde(rename = "toolCallId")]
    pub tool_call_id: String,
    /// Tool name.
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Current lifecycle state.
    pub state: ToolState,
    /// Tool input (set once input is available).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Tool output (set on output-available).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error text (set on output-error).
    #[serde(rename = "errorText", skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}

impl ToolPart {
    /// Create a tool part at the start of its lifecycle.
    pub fn new(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            state: ToolState::InputStreaming,
            input: None,
            output: None,
            error_text: None,
        }
    }
}

/// The smallest unit of message content, ordered by arrival within a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    /// A run of answer text.
    Text {
        /// Accumulated text content.
        text: String,
        /// Streaming state.
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<StreamState>,
    },
    /// A run of model reasoning, rendered separately from answer text.
    Reasoning {
        /// Accumulated reasoning content.
        text: String,
        /// Streaming state.
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<StreamState>,
    },
    /// A tool invocation.
    Tool(ToolPart),
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// A message in the reconciled log: identity, role, ordered parts.
///
/// The log is append-only; the only mutation is in-place part accumulation
/// while a stream is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Opaque message identifier.
    pub id: String,
    /// Role of the sender.
    pub role: Role,
    /// Parts in strict arrival order.
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    /// Create an empty message.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            parts: Vec::new(),
        }
    }

    /// Create a user message with a single completed text part.
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            parts: vec![MessagePart::Text {
                text: text.into(),
                state: Some(StreamState::Done),
            }],
        }
    }

    /// Create an empty assistant message.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant)
    }

    /// All text content concatenated in part order.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the message carries any non-blank answer text.
    pub fn has_text_content(&self) -> bool {
        self.parts.iter().any(|p| {
            matches!(p, MessagePart::Text { text, .. } if !text.trim().is_empty())
        })
    }
}
