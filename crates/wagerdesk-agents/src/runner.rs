use crate::model::{ChatModel, ModelEvent, ModelMessage, ToolInvocation};
use crate::{Tool, ToolDescriptor};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The model produced a final answer with no further tool calls.
    Stop,
    /// The step cap was reached before the model stopped calling tools.
    Length,
}

impl FinishReason {
    /// Wire-format reason string.
    pub fn as_str(self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
        }
    }
}

/// Events emitted by a running agent, consumed by the protocol encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Incremental answer text.
    TextDelta {
        /// The text fragment.
        delta: String,
    },
    /// Incremental reasoning text.
    ReasoningDelta {
        /// The reasoning fragment.
        delta: String,
    },
    /// A tool call started streaming its input.
    ToolCallStart {
        /// Stable call identifier.
        id: String,
        /// Tool name.
        name: String,
    },
    /// Incremental tool input text.
    ToolCallDelta {
        /// Identifier matching the start event.
        id: String,
        /// Incremental argument text.
        args_delta: String,
    },
    /// Tool input is complete; execution follows.
    ToolCallReady {
        /// Identifier matching the start event.
        id: String,
        /// Tool name.
        name: String,
        /// Complete arguments.
        arguments: Value,
    },
    /// Tool executed successfully.
    ToolCallDone {
        /// Identifier matching the start event.
        id: String,
        /// Tool output.
        output: Value,
    },
    /// Tool execution failed; the run continues.
    ToolCallFailed {
        /// Identifier matching the start event.
        id: String,
        /// Error description.
        error: String,
    },
    /// The run completed.
    RunFinish {
        /// Why the run ended.
        reason: FinishReason,
    },
    /// The run failed terminally (model/provider error).
    Error {
        /// Error description.
        message: String,
    },
}

/// Drives a [`ChatModel`] in a tool-use loop bounded by `max_steps`.
///
/// Each step streams model output; tool calls collected during the step are
/// executed afterwards and their results appended to the transcript before
/// the next step. A step without tool calls ends the run. Tool failures are
/// scoped to their call and fed back to the model; only provider errors are
/// terminal.
pub struct AgentRunner {
    model: Arc<dyn ChatModel>,
    tools: HashMap<String, Arc<dyn Tool>>,
    system_prompt: String,
    max_steps: usize,
}

impl AgentRunner {
    /// Create a runner.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: HashMap<String, Arc<dyn Tool>>,
        system_prompt: impl Into<String>,
        max_steps: usize,
    ) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_steps: max_steps.max(1),
        }
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> =
            self.tools.values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Run the loop over the given transcript, producing a finite event
    /// stream terminated by exactly one `RunFinish` or `Error`.
    pub fn run(self, history: Vec<ModelMessage>) -> BoxStream<'static, AgentEvent> {
        let descriptors = self.descriptors();
        Box::pin(async_stream::stream! {
            let mut transcript = history;

            for step in 0..self.max_steps {
                let mut events = match self
                    .model
                    .stream_step(&self.system_prompt, &transcript, &descriptors)
                    .await
                {
                    Ok(stream) => stream,
                    Err(err) => {
                        yield AgentEvent::Error { message: err.to_string() };
                        return;
                    }
                };

                let mut step_text = String::new();
                let mut calls: Vec<ToolInvocation> = Vec::new();

                while let Some(event) = events.next().await {
                    match event {
                        Ok(ModelEvent::TextDelta(delta)) => {
                            step_text.push_str(&delta);
                            yield AgentEvent::TextDelta { delta };
                        }
                        Ok(ModelEvent::ReasoningDelta(delta)) => {
                            yield AgentEvent::ReasoningDelta { delta };
                        }
                        Ok(ModelEvent::ToolCallStart { id, name }) => {
                            yield AgentEvent::ToolCallStart { id, name };
                        }
                        Ok(ModelEvent::ToolCallDelta { id, args_delta }) => {
                            yield AgentEvent::ToolCallDelta { id, args_delta };
                        }
                        Ok(ModelEvent::ToolCallReady { id, name, arguments }) => {
                            calls.push(ToolInvocation {
                                id: id.clone(),
                                name: name.clone(),
                                arguments: arguments.clone(),
                            });
                            yield AgentEvent::ToolCallReady { id, name, arguments };
                        }
                        Err(err) => {
                            yield AgentEvent::Error { message: err.to_string() };
                            return;
                        }
                    }
                }

                let mut assistant = ModelMessage::assistant(step_text);
                assistant.tool_calls = calls.clone();
                transcript.push(assistant);

                if calls.is_empty() {
                    yield AgentEvent::RunFinish { reason: FinishReason::Stop };
                    return;
                }

                for call in calls {
                    let Some(tool) = self.tools.get(&call.name) else {
                        warn!(tool = %call.name, step, "model requested unknown tool");
                        let message = format!("unknown tool: {}", call.name);
                        transcript.push(ModelMessage::tool_result(
                            &call.id,
                            serde_json::json!({"error": message}).to_string(),
                        ));
                        yield AgentEvent::ToolCallFailed { id: call.id, error: message };
                        continue;
                    };

                    match tool.execute(call.arguments).await {
                        Ok(output) => {
                            transcript.push(ModelMessage::tool_result(
                                &call.id,
                                output.to_string(),
                            ));
                            yield AgentEvent::ToolCallDone { id: call.id, output };
                        }
                        Err(err) => {
                            let message = err.to_string();
                            transcript.push(ModelMessage::tool_result(
                                &call.id,
                                serde_json::json!({"error": message}).to_string(),
                            ));
                            yield AgentEvent::ToolCallFailed { id: call.id, error: message };
                        }
                    }
                }
            }

            yield AgentEvent::RunFinish { reason: FinishReason::Length };
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;
    use crate::retrieval::StaticRetriever;
    use crate::tools::builtin_tools;
    use serde_json::json;

    fn tools() -> HashMap<String, Arc<dyn Tool>> {
        builtin_tools(Arc::new(StaticRetriever::with_demo_corpus()))
    }

    async fn collect(runner: AgentRunner, history: Vec<ModelMessage>) -> Vec<AgentEvent> {
        runner.run(history).collect().await
    }

    #[tokio::test]
    async fn plain_answer_finishes_after_one_step() {
        let model = Arc::new(ScriptedModel::answering("Bet the under."));
        let runner = AgentRunner::new(model, tools(), "prompt", 10);
        let events = collect(runner, vec![ModelMessage::user("thoughts?")]).await;

        assert_eq!(
            events,
            vec![
                AgentEvent::TextDelta { delta: "Bet the under.".into() },
                AgentEvent::RunFinish { reason: FinishReason::Stop },
            ]
        );
    }

    #[tokio::test]
    async fn tool_call_step_executes_and_feeds_back() {
        let model = Arc::new(ScriptedModel::new([
            vec![
                ModelEvent::ToolCallStart { id: "call_1".into(), name: "compareOdds".into() },
                ModelEvent::ToolCallReady {
                    id: "call_1".into(),
                    name: "compareOdds".into(),
                    arguments: json!({"sport": "NFL", "betType": "spread", "event": "Chiefs vs. Bills"}),
                },
            ],
            vec![ModelEvent::TextDelta("FanDuel has the best line.".into())],
        ]));
        let runner = AgentRunner::new(model, tools(), "prompt", 10);
        let events = collect(runner, vec![ModelMessage::user("best odds?")]).await;

        assert!(matches!(events[0], AgentEvent::ToolCallStart { .. }));
        assert!(matches!(events[1], AgentEvent::ToolCallReady { .. }));
        let AgentEvent::ToolCallDone { id, output } = &events[2] else {
            panic!("expected ToolCallDone, got {:?}", events[2]);
        };
        assert_eq!(id, "call_1");
        assert_eq!(output["oddsData"]["bestOdds"]["sportsbook"], "FanDuel");
        assert!(matches!(events[3], AgentEvent::TextDelta { .. }));
        assert_eq!(
            events.last(),
            Some(&AgentEvent::RunFinish { reason: FinishReason::Stop })
        );
    }

    #[tokio::test]
    async fn tool_failure_does_not_abort_the_run() {
        let model = Arc::new(ScriptedModel::new([
            vec![ModelEvent::ToolCallReady {
                id: "call_1".into(),
                name: "getTeamStats".into(),
                arguments: json!({"sport": "NBA"}),
            }],
            vec![ModelEvent::TextDelta("Could not fetch stats.".into())],
        ]));
        let runner = AgentRunner::new(model, tools(), "prompt", 10);
        let events = collect(runner, vec![ModelMessage::user("stats?")]).await;

        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::ToolCallFailed { id, .. } if id == "call_1")));
        assert_eq!(
            events.last(),
            Some(&AgentEvent::RunFinish { reason: FinishReason::Stop })
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_and_run_continues() {
        let model = Arc::new(ScriptedModel::new([
            vec![ModelEvent::ToolCallReady {
                id: "call_1".into(),
                name: "timeTravel".into(),
                arguments: json!({}),
            }],
            vec![ModelEvent::TextDelta("No such tool.".into())],
        ]));
        let runner = AgentRunner::new(model, tools(), "prompt", 10);
        let events = collect(runner, vec![ModelMessage::user("go back")]).await;

        assert!(events.iter().any(
            |e| matches!(e, AgentEvent::ToolCallFailed { error, .. } if error.contains("unknown tool"))
        ));
        assert!(matches!(events.last(), Some(AgentEvent::RunFinish { .. })));
    }

    #[tokio::test]
    async fn step_cap_terminates_a_tool_loop() {
        // Every step calls a tool, so only the cap can stop the run.
        let step = vec![ModelEvent::ToolCallReady {
            id: "call_n".into(),
            name: "analyzeTrends".into(),
            arguments: json!({"sport": "NBA", "trendType": "ats_trends"}),
        }];
        let model = Arc::new(ScriptedModel::new(vec![step; 8]));
        let runner = AgentRunner::new(model, tools(), "prompt", 3);
        let events = collect(runner, vec![ModelMessage::user("loop")]).await;

        let tool_steps = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::ToolCallDone { .. }))
            .count();
        assert_eq!(tool_steps, 3);
        assert_eq!(
            events.last(),
            Some(&AgentEvent::RunFinish { reason: FinishReason::Length })
        );
    }
}
