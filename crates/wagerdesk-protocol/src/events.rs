use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incremental protocol events emitted by a streaming chat response.
///
/// These map directly to the UI Message Stream protocol: text and reasoning
/// blocks stream as start/delta/end triples, tool calls move through an
/// input-streaming → input-available → output lifecycle, and every stream
/// ends with exactly one `finish`, `abort`, or `error` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Beginning of a new assistant message.
    #[serde(rename = "start")]
    MessageStart {
        /// Identifier for the message being streamed.
        #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },

    /// Beginning of a text block.
    TextStart {
        /// Unique identifier for this text block.
        id: String,
    },

    /// Incremental text content for an open text block.
    TextDelta {
        /// Identifier matching the text-start event.
        id: String,
        /// Incremental text content.
        delta: String,
    },

    /// End of a text block.
    TextEnd {
        /// Identifier matching the text-start event.
        id: String,
    },

    /// Beginning of a reasoning block.
    ReasoningStart {
        /// Unique identifier for this reasoning block.
        id: String,
    },

    /// Incremental reasoning content.
    ReasoningDelta {
        /// Identifier matching the reasoning-start event.
        id: String,
        /// Incremental reasoning content.
        delta: String,
    },

    /// End of a reasoning block.
    ReasoningEnd {
        /// Identifier matching the reasoning-start event.
        id: String,
    },

    /// Beginning of tool input streaming.
    ToolInputStart {
        /// Unique identifier for this tool call.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Name of the tool being called.
        #[serde(rename = "toolName")]
        tool_name: String,
    },

    /// Incremental chunk of tool input as it is being generated.
    ToolInputDelta {
        /// Identifier matching the tool-input-start event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Incremental tool input text.
        #[serde(rename = "inputTextDelta")]
        input_text_delta: String,
    },

    /// Tool input is complete and ready for execution.
    ToolInputAvailable {
        /// Identifier matching the tool-input-start event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Name of the tool being called.
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Complete tool input as JSON.
        input: Value,
    },

    /// Result of a successful tool execution.
    ToolOutputAvailable {
        /// Identifier matching the tool-input-start event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Tool execution result as JSON.
        output: Value,
    },

    /// Result of a failed tool execution.
    ToolOutputError {
        /// Identifier matching the tool-input-start event.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Error description.
        #[serde(rename = "errorText")]
        error_text: String,
    },

    /// References an external URL source (RAG citations).
    SourceUrl {
        /// Unique identifier for this source.
        #[serde(rename = "sourceId")]
        source_id: String,
        /// The URL being referenced.
        url: String,
        /// Optional title for the source.
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },

    /// Stream completed normally.
    Finish {
        /// Optional reason (stop, length, tool-calls, error, other).
        #[serde(rename = "finishReason", skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },

    /// Stream was cancelled before completion.
    Abort {
        /// Optional reason for the abort.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Terminal stream error.
    Error {
        /// Error text.
        #[serde(rename = "errorText")]
        error_text: String,
    },
}

impl StreamEvent {
    /// Create a start event for a message.
    pub fn message_start(message_id: impl Into<String>) -> Self {
        Self::MessageStart {
            message_id: Some(message_id.into()),
        }
    }

    /// Create a text-start event.
    pub fn text_start(id: impl Into<String>) -> Self {
        Self::TextStart { id: id.into() }
    }

    /// Create a text-delta event.
    pub fn text_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::TextDelta {
            id: id.into(),
            delta: delta.into(),
        }
    }

    /// Create a text-end event.
    pub fn text_end(id: impl Into<String>) -> Self {
        Self::TextEnd { id: id.into() }
    }

    /// Create a reasoning-start event.
    pub fn reasoning_start(id: impl Into<String>) -> Self {
        Self::ReasoningStart { id: id.into() }
    }

    /// Create a reasoning-delta event.
    pub fn reasoning_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::ReasoningDelta {
            id: id.into(),
            delta: delta.into(),
        }
    }

    /// Create a reasoning-end event.
    pub fn reasoning_end(id: impl Into<String>) -> Self {
        Self::ReasoningEnd { id: id.into() }
    }

    /// Create a tool-input-start event.
    pub fn tool_input_start(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::ToolInputStart {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
        }
    }

    /// Create a tool-input-delta event.
    pub fn tool_input_delta(tool_call_id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::ToolInputDelta {
            tool_call_id: tool_call_id.into(),
            input_text_delta: delta.into(),
        }
    }

    /// Create a tool-input-available event.
    pub fn tool_input_available(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::ToolInputAvailable {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }

    /// Create a tool-output-available event.
    pub fn tool_output_available(tool_call_id: impl Into<String>, output: Value) -> Self {
        Self::ToolOutputAvailable {
            tool_call_id: tool_call_id.into(),
            output,
        }
    }

    /// Create a tool-output-error event.
    pub fn tool_output_error(
        tool_call_id: impl Into<String>,
        error_text: impl Into<String>,
    ) -> Self {
        Self::ToolOutputError {
            tool_call_id: tool_call_id.into(),
            error_text: error_text.into(),
        }
    }

    /// Create a source-url event.
    pub fn source_url(
        source_id: impl Into<String>,
        url: impl Into<String>,
        title: Option<String>,
    ) -> Self {
        Self::SourceUrl {
            source_id: source_id.into(),
            url: url.into(),
            title,
        }
    }

    /// Create a finish event.
    pub fn finish() -> Self {
        Self::Finish {
            finish_reason: None,
        }
    }

    /// Create a finish event with a reason.
    pub fn finish_with_reason(reason: impl Into<String>) -> Self {
        Self::Finish {
            finish_reason: Some(reason.into()),
        }
    }

    /// Create an abort event.
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Abort {
            reason: Some(reason.into()),
        }
    }

    /// Create an error event.
    pub fn error(error_text: impl Into<String>) -> Self {
        Self::Error {
            error_text: error_text.into(),
        }
    }

    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finish { .. } | Self::Abort { .. } | Self::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_kebab_case_tags_and_camel_case_fields() {
        let ev = StreamEvent::tool_input_start("call_1", "compareOdds");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "tool-input-start");
        assert_eq!(json["toolCallId"], "call_1");
        assert_eq!(json["toolName"], "compareOdds");

        let ev = StreamEvent::message_start("msg_1");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "start");
        assert_eq!(json["messageId"], "msg_1");
    }

    #[test]
    fn events_round_trip_through_json() {
        let events = vec![
            StreamEvent::message_start("msg_1"),
            StreamEvent::text_start("txt_0"),
            StreamEvent::text_delta("txt_0", "hello"),
            StreamEvent::text_end("txt_0"),
            StreamEvent::tool_input_available("call_1", "getTeamStats", json!({"team": "Chiefs"})),
            StreamEvent::tool_output_error("call_1", "upstream failure"),
            StreamEvent::source_url("src_1", "https://example.com", Some("Example".into())),
            StreamEvent::finish_with_reason("stop"),
        ];
        for ev in events {
            let json = serde_json::to_string(&ev).unwrap();
            let back: StreamEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ev);
        }
    }

    #[test]
    fn terminal_events_are_detected() {
        assert!(StreamEvent::finish().is_terminal());
        assert!(StreamEvent::abort("cancelled").is_terminal());
        assert!(StreamEvent::error("boom").is_terminal());
        assert!(!StreamEvent::text_delta("txt_0", "x").is_terminal());
    }

    #[test]
    fn finish_omits_absent_reason() {
        let json = serde_json::to_string(&StreamEvent::finish()).unwrap();
        assert_eq!(json, r#"{"type":"finish"}"#);
    }
}
