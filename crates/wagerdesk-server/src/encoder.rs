use wagerdesk_agents::AgentEvent;
use wagerdesk_protocol::StreamEvent;

/// Stateful encoder from agent events to UI stream events.
///
/// Tracks text and reasoning block lifecycle across tool calls so that
/// `text-start`/`text-end` and `reasoning-start`/`reasoning-end` are always
/// properly paired on the wire.
///
/// # Block lifecycle rules
///
/// - `TextDelta` with text closed → prepend `text-start`, open text
/// - `ReasoningDelta` with reasoning closed → prepend `reasoning-start`
/// - opening one block kind closes the other
/// - `ToolCallStart` with a block open → prepend its end event
/// - `RunFinish` closes open blocks before `finish`
/// - `Error` is terminal, no end events needed
#[derive(Debug)]
pub struct StreamEncoder {
    message_id: String,
    text_open: bool,
    text_counter: u32,
    reasoning_open: bool,
    reasoning_counter: u32,
    finished: bool,
}

impl StreamEncoder {
    /// Create a new encoder for the given run.
    pub fn new(run_id: &str) -> Self {
        let message_id = format!("msg_{}", &run_id[..8.min(run_id.len())]);
        Self {
            message_id,
            text_open: false,
            text_counter: 0,
            reasoning_open: false,
            reasoning_counter: 0,
            finished: false,
        }
    }

    /// The message ID all events of this run belong to.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    fn text_id(&self) -> String {
        format!("txt_{}", self.text_counter)
    }

    fn reasoning_id(&self) -> String {
        format!("rsn_{}", self.reasoning_counter)
    }

    fn open_text(&mut self) -> StreamEvent {
        self.text_open = true;
        StreamEvent::text_start(self.text_id())
    }

    fn close_text(&mut self) -> StreamEvent {
        let event = StreamEvent::text_end(self.text_id());
        self.text_open = false;
        self.text_counter += 1;
        event
    }

    fn open_reasoning(&mut self) -> StreamEvent {
        self.reasoning_open = true;
        StreamEvent::reasoning_start(self.reasoning_id())
    }

    fn close_reasoning(&mut self) -> StreamEvent {
        let event = StreamEvent::reasoning_end(self.reasoning_id());
        self.reasoning_open = false;
        self.reasoning_counter += 1;
        event
    }

    fn close_open_blocks(&mut self, events: &mut Vec<StreamEvent>) {
        if self.text_open {
            events.push(self.close_text());
        }
        if self.reasoning_open {
            events.push(self.close_reasoning());
        }
    }

    /// Emit the stream prologue: the message `start` event. Text blocks are
    /// opened lazily when the first delta arrives.
    pub fn prologue(&self) -> Vec<StreamEvent> {
        vec![StreamEvent::message_start(&self.message_id)]
    }

    /// Convert an agent event to stream events with proper block lifecycle.
    pub fn on_event(&mut self, ev: &AgentEvent) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        match ev {
            AgentEvent::TextDelta { delta } => {
                let mut events = Vec::new();
                if self.reasoning_open {
                    events.push(self.close_reasoning());
                }
                if !self.text_open {
                    events.push(self.open_text());
                }
                events.push(StreamEvent::text_delta(self.text_id(), delta));
                events
            }
            AgentEvent::ReasoningDelta { delta } => {
                let mut events = Vec::new();
                if self.text_open {
                    events.push(self.close_text());
                }
                if !self.reasoning_open {
                    events.push(self.open_reasoning());
                }
                events.push(StreamEvent::reasoning_delta(self.reasoning_id(), delta));
                events
            }

            AgentEvent::ToolCallStart { id, name } => {
                let mut events = Vec::new();
                self.close_open_blocks(&mut events);
                events.push(StreamEvent::tool_input_start(id, name));
                events
            }
            AgentEvent::ToolCallDelta { id, args_delta } => {
                vec![StreamEvent::tool_input_delta(id, args_delta)]
            }
            AgentEvent::ToolCallReady {
                id,
                name,
                arguments,
            } => {
                let mut events = Vec::new();
                self.close_open_blocks(&mut events);
                events.push(StreamEvent::tool_input_available(
                    id,
                    name,
                    arguments.clone(),
                ));
                events
            }
            AgentEvent::ToolCallDone { id, output } => {
                vec![StreamEvent::tool_output_available(id, output.clone())]
            }
            AgentEvent::ToolCallFailed { id, error } => {
                vec![StreamEvent::tool_output_error(id, error)]
            }

            AgentEvent::RunFinish { reason } => {
                self.finished = true;
                let mut events = Vec::new();
                self.close_open_blocks(&mut events);
                events.push(StreamEvent::finish_with_reason(reason.as_str()));
                events
            }

            AgentEvent::Error { message } => {
                self.finished = true;
                self.text_open = false;
                self.reasoning_open = false;
                vec![StreamEvent::error(message)]
            }
        }
    }
}
