use std::collections::HashMap;
use tracing::{debug, warn};
use wagerdesk_protocol::{ChatMessage, MessagePart, StreamEvent, StreamState, ToolPart, ToolState};

/// Folds the protocol event stream into an ordered message log.
///
/// The log is append-only: events mutate parts of the message currently being
/// streamed, but never reorder or remove earlier messages. Tool parts are
/// keyed by call id and move monotonically through their lifecycle; events
/// that would move a part backwards are logged and dropped, so a duplicated
/// or re-ordered delivery can never un-finish a tool call.
pub struct StreamReconciler {
    messages: Vec<ChatMessage>,
    text_parts: HashMap<String, (usize, usize)>,
    reasoning_parts: HashMap<String, (usize, usize)>,
    tool_parts: HashMap<String, (usize, usize)>,
    current: Option<usize>,
    streaming: bool,
    last_error: Option<String>,
    next_local_id: u64,
}

impl StreamReconciler {
    /// Create an empty reconciler.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            text_parts: HashMap::new(),
            reasoning_parts: HashMap::new(),
            tool_parts: HashMap::new(),
            current: None,
            streaming: false,
            last_error: None,
            next_local_id: 0,
        }
    }

    /// The reconciled message log, in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a stream is currently being applied.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The most recent terminal stream error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Append a completed user message and return its id.
    pub fn append_user(&mut self, text: impl Into<String>) -> String {
        let id = self.local_id("user");
        self.messages.push(ChatMessage::user(id.clone(), text));
        id
    }

    /// Mark the start of an exchange, before the first event arrives.
    pub fn begin_stream(&mut self) {
        self.streaming = true;
        self.last_error = None;
    }

    /// Mark the end of an exchange. Any parts still streaming are closed.
    pub fn finish_stream(&mut self) {
        self.close_open_parts();
        self.streaming = false;
        self.current = None;
    }

    /// Drop the whole log and all streaming state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Apply one protocol event to the log.
    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::MessageStart { message_id } => {
                let id = message_id.unwrap_or_else(|| self.local_id("msg"));
                self.messages.push(ChatMessage::assistant(id));
                self.current = Some(self.messages.len() - 1);
                self.streaming = true;
            }

            StreamEvent::TextStart { id } => {
                if self.text_parts.contains_key(&id) {
                    warn!(block = %id, "duplicate text-start, reusing open block");
                    return;
                }
                self.open_text_block(id);
            }
            StreamEvent::TextDelta { id, delta } => {
                let (msg, part) = match self.text_parts.get(&id) {
                    Some(&loc) => loc,
                    // Unknown block ids get minimal structure so no content
                    // is lost on a missed start frame.
                    None => self.open_text_block(id),
                };
                if let MessagePart::Text { text, .. } = &mut self.messages[msg].parts[part] {
                    text.push_str(&delta);
                }
            }
            StreamEvent::TextEnd { id } => {
                if let Some(&(msg, part)) = self.text_parts.get(&id) {
                    if let MessagePart::Text { state, .. } = &mut self.messages[msg].parts[part] {
                        *state = Some(StreamState::Done);
                    }
                } else {
                    warn!(block = %id, "text-end for unknown block");
                }
            }

            StreamEvent::ReasoningStart { id } => {
                if self.reasoning_parts.contains_key(&id) {
                    warn!(block = %id, "duplicate reasoning-start, reusing open block");
                    return;
                }
                self.open_reasoning_block(id);
            }
            StreamEvent::ReasoningDelta { id, delta } => {
                let (msg, part) = match self.reasoning_parts.get(&id) {
                    Some(&loc) => loc,
                    None => self.open_reasoning_block(id),
                };
                if let MessagePart::Reasoning { text, .. } = &mut self.messages[msg].parts[part] {
                    text.push_str(&delta);
                }
            }
            StreamEvent::ReasoningEnd { id } => {
                if let Some(&(msg, part)) = self.reasoning_parts.get(&id) {
                    if let MessagePart::Reasoning { state, .. } =
                        &mut self.messages[msg].parts[part]
                    {
                        *state = Some(StreamState::Done);
                    }
                } else {
                    warn!(block = %id, "reasoning-end for unknown block");
                }
            }

            StreamEvent::ToolInputStart {
                tool_call_id,
                tool_name,
            } => {
                if self.tool_parts.contains_key(&tool_call_id) {
                    warn!(call = %tool_call_id, "duplicate tool-input-start ignored");
                    return;
                }
                self.open_tool_part(tool_call_id, tool_name);
            }
            StreamEvent::ToolInputDelta {
                tool_call_id,
                input_text_delta,
            } => {
                // Raw argument text is presentational only; the complete
                // input arrives on tool-input-available.
                debug!(call = %tool_call_id, len = input_text_delta.len(), "tool input delta");
                if !self.tool_parts.contains_key(&tool_call_id) {
                    self.open_tool_part(tool_call_id, String::new());
                }
            }
            StreamEvent::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
            } => {
                let part = self.tool_part_or_open(tool_call_id, &tool_name);
                if Self::advance_tool(part, ToolState::InputAvailable) {
                    part.tool_name = tool_name;
                    part.input = Some(input);
                }
            }
            StreamEvent::ToolOutputAvailable {
                tool_call_id,
                output,
            } => {
                let part = self.tool_part_or_open(tool_call_id, "");
                if Self::advance_tool(part, ToolState::OutputAvailable) {
                    part.output = Some(output);
                }
            }
            StreamEvent::ToolOutputError {
                tool_call_id,
                error_text,
            } => {
                let part = self.tool_part_or_open(tool_call_id, "");
                if Self::advance_tool(part, ToolState::OutputError) {
                    part.error_text = Some(error_text);
                }
            }

            StreamEvent::SourceUrl { source_id, url, .. } => {
                // Citations are derived from knowledge-base tool output.
                debug!(source = %source_id, %url, "ignoring standalone source event");
            }

            StreamEvent::Finish { .. } | StreamEvent::Abort { .. } => {
                self.finish_stream();
            }
            StreamEvent::Error { error_text } => {
                warn!(error = %error_text, "stream ended with error");
                self.last_error = Some(error_text);
                self.finish_stream();
            }
        }
    }

    fn local_id(&mut self, prefix: &str) -> String {
        self.next_local_id += 1;
        format!("{prefix}_{}", self.next_local_id)
    }

    /// Index of the message currently receiving parts, creating an assistant
    /// message if the stream never announced one.
    fn current_message(&mut self) -> usize {
        match self.current {
            Some(idx) => idx,
            None => {
                let id = self.local_id("msg");
                self.messages.push(ChatMessage::assistant(id));
                let idx = self.messages.len() - 1;
                self.current = Some(idx);
                self.streaming = true;
                idx
            }
        }
    }

    fn open_text_block(&mut self, id: String) -> (usize, usize) {
        let msg = self.current_message();
        self.messages[msg].parts.push(MessagePart::Text {
            text: String::new(),
            state: Some(StreamState::Streaming),
        });
        let loc = (msg, self.messages[msg].parts.len() - 1);
        self.text_parts.insert(id, loc);
        loc
    }

    fn open_reasoning_block(&mut self, id: String) -> (usize, usize) {
        let msg = self.current_message();
        self.messages[msg].parts.push(MessagePart::Reasoning {
            text: String::new(),
            state: Some(StreamState::Streaming),
        });
        let loc = (msg, self.messages[msg].parts.len() - 1);
        self.reasoning_parts.insert(id, loc);
        loc
    }

    fn open_tool_part(&mut self, tool_call_id: String, tool_name: impl Into<String>) {
        let msg = self.current_message();
        self.messages[msg]
            .parts
            .push(MessagePart::Tool(ToolPart::new(&tool_call_id, tool_name)));
        self.tool_parts
            .insert(tool_call_id, (msg, self.messages[msg].parts.len() - 1));
    }

    fn tool_part_or_open(&mut self, tool_call_id: String, tool_name: &str) -> &mut ToolPart {
        if !self.tool_parts.contains_key(&tool_call_id) {
            self.open_tool_part(tool_call_id.clone(), tool_name);
        }
        let &(msg, part) = self
            .tool_parts
            .get(&tool_call_id)
            .expect("tool part just ensured");
        match &mut self.messages[msg].parts[part] {
            MessagePart::Tool(tool) => tool,
            _ => unreachable!("tool part index points at a non-tool part"),
        }
    }

    /// Move a tool part forward, dropping transitions that would go backwards
    /// or leave a terminal state.
    fn advance_tool(part: &mut ToolPart, next: ToolState) -> bool {
        if part.state.can_advance_to(next) {
            part.state = next;
            true
        } else {
            warn!(
                call = %part.tool_call_id,
                from = ?part.state,
                to = ?next,
                "dropping non-monotonic tool state transition"
            );
            false
        }
    }

    fn close_open_parts(&mut self) {
        for message in &mut self.messages {
            for part in &mut message.parts {
                match part {
                    MessagePart::Text { state, .. } | MessagePart::Reasoning { state, .. } => {
                        if *state == Some(StreamState::Streaming) {
                            *state = Some(StreamState::Done);
                        }
                    }
                    MessagePart::Tool(_) => {}
                }
            }
        }
    }
}

impl Default for StreamReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wagerdesk_protocol::Role;

    fn apply_all(reconciler: &mut StreamReconciler, events: Vec<StreamEvent>) {
        for event in events {
            reconciler.apply(event);
        }
    }

    #[test]
    fn text_stream_assembles_one_assistant_message() {
        let mut rec = StreamReconciler::new();
        rec.begin_stream();
        apply_all(
            &mut rec,
            vec![
                StreamEvent::message_start("msg_1"),
                StreamEvent::text_start("txt_0"),
                StreamEvent::text_delta("txt_0", "Take the "),
                StreamEvent::text_delta("txt_0", "over."),
                StreamEvent::text_end("txt_0"),
                StreamEvent::finish(),
            ],
        );

        assert!(!rec.is_streaming());
        let messages = rec.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "msg_1");
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].text_content(), "Take the over.");
        assert!(matches!(
            messages[0].parts[0],
            MessagePart::Text {
                state: Some(StreamState::Done),
                ..
            }
        ));
    }

    #[test]
    fn parts_keep_arrival_order_across_kinds() {
        let mut rec = StreamReconciler::new();
        apply_all(
            &mut rec,
            vec![
                StreamEvent::message_start("msg_1"),
                StreamEvent::reasoning_start("r_0"),
                StreamEvent::reasoning_delta("r_0", "checking lines"),
                StreamEvent::reasoning_end("r_0"),
                StreamEvent::tool_input_start("call_1", "compareOdds"),
                StreamEvent::tool_input_available("call_1", "compareOdds", json!({"sport": "NFL"})),
                StreamEvent::tool_output_available("call_1", json!({"ok": true})),
                StreamEvent::text_start("txt_0"),
                StreamEvent::text_delta("txt_0", "Lines favor the home side."),
                StreamEvent::text_end("txt_0"),
                StreamEvent::finish(),
            ],
        );

        let parts = &rec.messages()[0].parts;
        assert!(matches!(parts[0], MessagePart::Reasoning { .. }));
        assert!(matches!(parts[1], MessagePart::Tool(_)));
        assert!(matches!(parts[2], MessagePart::Text { .. }));
        let MessagePart::Tool(tool) = &parts[1] else {
            unreachable!()
        };
        assert_eq!(tool.state, ToolState::OutputAvailable);
        assert_eq!(tool.output, Some(json!({"ok": true})));
    }

    #[test]
    fn backward_tool_transitions_are_dropped() {
        let mut rec = StreamReconciler::new();
        apply_all(
            &mut rec,
            vec![
                StreamEvent::message_start("msg_1"),
                StreamEvent::tool_input_start("call_1", "getTeamStats"),
                StreamEvent::tool_output_available("call_1", json!({"pts": 112})),
                // Late-arriving frames must not regress or flip the state.
                StreamEvent::tool_input_available("call_1", "getTeamStats", json!({})),
                StreamEvent::tool_output_error("call_1", "too late"),
            ],
        );

        let MessagePart::Tool(tool) = &rec.messages()[0].parts[0] else {
            unreachable!()
        };
        assert_eq!(tool.state, ToolState::OutputAvailable);
        assert_eq!(tool.output, Some(json!({"pts": 112})));
        assert_eq!(tool.error_text, None);
    }

    #[test]
    fn unknown_block_delta_creates_minimal_structure() {
        let mut rec = StreamReconciler::new();
        rec.apply(StreamEvent::text_delta("txt_9", "orphan text"));

        let messages = rec.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].text_content(), "orphan text");
    }

    #[test]
    fn error_event_records_error_and_stops_streaming() {
        let mut rec = StreamReconciler::new();
        rec.begin_stream();
        apply_all(
            &mut rec,
            vec![
                StreamEvent::message_start("msg_1"),
                StreamEvent::text_start("txt_0"),
                StreamEvent::text_delta("txt_0", "partial"),
                StreamEvent::error("provider unavailable"),
            ],
        );

        assert!(!rec.is_streaming());
        assert_eq!(rec.last_error(), Some("provider unavailable"));
        // The open text block is closed, content preserved.
        assert!(matches!(
            rec.messages()[0].parts[0],
            MessagePart::Text {
                state: Some(StreamState::Done),
                ..
            }
        ));
    }

    #[test]
    fn user_messages_and_reset() {
        let mut rec = StreamReconciler::new();
        let id = rec.append_user("who covers tonight?");
        assert_eq!(rec.messages()[0].id, id);
        assert_eq!(rec.messages()[0].role, Role::User);

        rec.reset();
        assert!(rec.messages().is_empty());
        assert!(!rec.is_streaming());
    }

    #[test]
    fn finish_without_explicit_ends_closes_open_blocks() {
        let mut rec = StreamReconciler::new();
        apply_all(
            &mut rec,
            vec![
                StreamEvent::message_start("msg_1"),
                StreamEvent::text_start("txt_0"),
                StreamEvent::text_delta("txt_0", "abrupt"),
                StreamEvent::finish(),
            ],
        );
        assert!(matches!(
            rec.messages()[0].parts[0],
            MessagePart::Text {
                state: Some(StreamState::Done),
                ..
            }
        ));
    }
}
