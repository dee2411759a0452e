use serde::{Deserialize, Serialize};
use wagerdesk_protocol::{ChatMessage, MessagePart, Role, ToolPart, ToolState};

/// Name of the retrieval tool whose output carries citation sources.
pub const KNOWLEDGE_BASE_TOOL: &str = "retrieveKnowledgeBase";

/// A source citation attached to a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source URL.
    pub url: String,
    /// Source title.
    pub title: String,
}

/// One renderable unit of the conversation, in display order.
///
/// Tool calls and reasoning runs surface as standalone items so they render
/// while their message is still streaming; the message's text (if any)
/// follows as a single item per message.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowItem {
    /// A message's combined answer text.
    Message {
        /// Stable render key.
        id: String,
        /// Owning message id.
        message_id: String,
        /// Sender role.
        role: Role,
        /// Concatenated text content.
        text: String,
        /// Knowledge-base citations, newest retrieval first match.
        citations: Vec<Citation>,
    },
    /// A tool invocation card.
    ToolCall {
        /// Stable render key.
        id: String,
        /// Owning message id.
        message_id: String,
        /// Human-readable label for the tool.
        label: String,
        /// Current part snapshot.
        part: ToolPart,
    },
    /// A run of model reasoning.
    Reasoning {
        /// Stable render key.
        id: String,
        /// Owning message id.
        message_id: String,
        /// Reasoning text.
        text: String,
    },
}

impl FlowItem {
    /// The stable render key.
    pub fn id(&self) -> &str {
        match self {
            FlowItem::Message { id, .. }
            | FlowItem::ToolCall { id, .. }
            | FlowItem::Reasoning { id, .. } => id,
        }
    }
}

/// Display label for a tool name. Unknown tools fall back to their raw name.
pub fn display_label(tool_name: &str) -> String {
    match tool_name {
        "compareOdds" => "Comparing Odds",
        "getTeamStats" => "Fetching Team Stats",
        "analyzeTrends" => "Analyzing Trends",
        "getInjuryReport" => "Checking Injuries",
        KNOWLEDGE_BASE_TOOL => "Searching Knowledge Base",
        other => return other.to_string(),
    }
    .to_string()
}

/// Project the message log into the ordered flow of renderable items.
///
/// Pure over its input: same log, same flow. Per message, tool and reasoning
/// parts are emitted in part order, then one text item if the message has any
/// non-blank text. Messages with neither are omitted entirely.
pub fn project(messages: &[ChatMessage]) -> Vec<FlowItem> {
    let mut items = Vec::new();

    for message in messages {
        for (idx, part) in message.parts.iter().enumerate() {
            match part {
                MessagePart::Tool(tool) => items.push(FlowItem::ToolCall {
                    id: format!("tool-{}", tool.tool_call_id),
                    message_id: message.id.clone(),
                    label: display_label(&tool.tool_name),
                    part: tool.clone(),
                }),
                MessagePart::Reasoning { text, .. } if !text.trim().is_empty() => {
                    items.push(FlowItem::Reasoning {
                        id: format!("reasoning-{}-{idx}", message.id),
                        message_id: message.id.clone(),
                        text: text.clone(),
                    });
                }
                MessagePart::Reasoning { .. } | MessagePart::Text { .. } => {}
            }
        }

        if message.has_text_content() {
            let citations = if message.role == Role::Assistant {
                citations_for(&items)
            } else {
                Vec::new()
            };
            items.push(FlowItem::Message {
                id: format!("message-{}", message.id),
                message_id: message.id.clone(),
                role: message.role,
                text: message.text_content(),
                citations,
            });
        }
    }

    items
}

/// Citations for an assistant text item: scan backwards over the flow built
/// so far and take the sources of the nearest completed knowledge-base call.
/// The nearest call wins even when it returned no sources.
fn citations_for(items: &[FlowItem]) -> Vec<Citation> {
    for item in items.iter().rev() {
        let FlowItem::ToolCall { part, .. } = item else {
            continue;
        };
        if part.tool_name != KNOWLEDGE_BASE_TOOL || part.state != ToolState::OutputAvailable {
            continue;
        }
        return parse_sources(part);
    }
    Vec::new()
}

fn parse_sources(part: &ToolPart) -> Vec<Citation> {
    let Some(sources) = part.output.as_ref().and_then(|o| o.get("sources")) else {
        return Vec::new();
    };
    let Some(sources) = sources.as_array() else {
        return Vec::new();
    };
    sources
        .iter()
        .filter_map(|source| {
            let url = source.get("url")?.as_str()?.to_string();
            let title = source
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or("Knowledge Base Source")
                .to_string();
            Some(Citation { url, title })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wagerdesk_protocol::StreamState;

    fn kb_call(id: &str, sources: serde_json::Value) -> MessagePart {
        let mut part = ToolPart::new(id, KNOWLEDGE_BASE_TOOL);
        part.state = ToolState::OutputAvailable;
        part.output = Some(json!({"context": "…", "sources": sources}));
        MessagePart::Tool(part)
    }

    fn text(content: &str) -> MessagePart {
        MessagePart::Text {
            text: content.into(),
            state: Some(StreamState::Done),
        }
    }

    #[test]
    fn tool_and_reasoning_items_precede_the_message_item() {
        let mut odds = ToolPart::new("call_1", "compareOdds");
        odds.state = ToolState::InputAvailable;
        let messages = vec![ChatMessage {
            id: "m1".into(),
            role: Role::Assistant,
            parts: vec![
                MessagePart::Reasoning {
                    text: "compare books first".into(),
                    state: Some(StreamState::Done),
                },
                MessagePart::Tool(odds),
                text("Bet the under."),
            ],
        }];

        let items = project(&messages);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id(), "reasoning-m1-0");
        assert_eq!(items[1].id(), "tool-call_1");
        assert_eq!(items[2].id(), "message-m1");
        let FlowItem::ToolCall { label, .. } = &items[1] else {
            unreachable!()
        };
        assert_eq!(label, "Comparing Odds");
    }

    #[test]
    fn empty_messages_are_omitted() {
        let messages = vec![
            ChatMessage::assistant("m1"),
            ChatMessage {
                id: "m2".into(),
                role: Role::Assistant,
                parts: vec![text("  \n")],
            },
        ];
        assert!(project(&messages).is_empty());
    }

    #[test]
    fn citations_come_from_the_nearest_completed_retrieval() {
        let messages = vec![
            ChatMessage {
                id: "m1".into(),
                role: Role::Assistant,
                parts: vec![
                    kb_call(
                        "call_1",
                        json!([{"url": "https://old.example", "title": "Old"}]),
                    ),
                    text("Earlier answer."),
                ],
            },
            ChatMessage {
                id: "m2".into(),
                role: Role::Assistant,
                parts: vec![
                    kb_call(
                        "call_2",
                        json!([
                            {"url": "https://kb.example/bankroll", "title": "Bankroll 101"},
                            {"url": "https://kb.example/lines"},
                        ]),
                    ),
                    text("Cited answer."),
                ],
            },
        ];

        let items = project(&messages);
        let FlowItem::Message { citations, .. } = items.last().unwrap() else {
            unreachable!()
        };
        assert_eq!(
            citations,
            &vec![
                Citation {
                    url: "https://kb.example/bankroll".into(),
                    title: "Bankroll 101".into(),
                },
                Citation {
                    url: "https://kb.example/lines".into(),
                    title: "Knowledge Base Source".into(),
                },
            ]
        );
    }

    #[test]
    fn nearest_retrieval_wins_even_with_no_sources() {
        let messages = vec![ChatMessage {
            id: "m1".into(),
            role: Role::Assistant,
            parts: vec![
                kb_call("call_1", json!([{"url": "https://kb.example", "title": "Hit"}])),
                kb_call("call_2", json!([])),
                text("Answer."),
            ],
        }];

        let items = project(&messages);
        let FlowItem::Message { citations, .. } = items.last().unwrap() else {
            unreachable!()
        };
        assert!(citations.is_empty());
    }

    #[test]
    fn incomplete_or_failed_retrievals_are_skipped() {
        let mut failed = ToolPart::new("call_2", KNOWLEDGE_BASE_TOOL);
        failed.state = ToolState::OutputError;
        failed.error_text = Some("backend down".into());

        let messages = vec![ChatMessage {
            id: "m1".into(),
            role: Role::Assistant,
            parts: vec![
                kb_call("call_1", json!([{"url": "https://kb.example", "title": "Hit"}])),
                MessagePart::Tool(failed),
                text("Answer."),
            ],
        }];

        let items = project(&messages);
        let FlowItem::Message { citations, .. } = items.last().unwrap() else {
            unreachable!()
        };
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].title, "Hit");
    }

    #[test]
    fn user_messages_never_carry_citations() {
        let messages = vec![
            ChatMessage {
                id: "m1".into(),
                role: Role::Assistant,
                parts: vec![kb_call(
                    "call_1",
                    json!([{"url": "https://kb.example", "title": "Hit"}]),
                )],
            },
            ChatMessage::user("u1", "thanks"),
        ];

        let items = project(&messages);
        let FlowItem::Message { role, citations, .. } = items.last().unwrap() else {
            unreachable!()
        };
        assert_eq!(*role, Role::User);
        assert!(citations.is_empty());
    }

    #[test]
    fn projection_is_repeatable_and_deduplicates_by_call_id() {
        let mut tool = ToolPart::new("call_1", "analyzeTrends");
        tool.state = ToolState::OutputAvailable;
        tool.output = Some(json!({"confidence": "High"}));
        let messages = vec![ChatMessage {
            id: "m1".into(),
            role: Role::Assistant,
            parts: vec![MessagePart::Tool(tool), text("Trend favors the road team.")],
        }];

        let first = project(&messages);
        let second = project(&messages);
        assert_eq!(first, second);
        let tool_items = first
            .iter()
            .filter(|i| matches!(i, FlowItem::ToolCall { .. }))
            .count();
        assert_eq!(tool_items, 1);
    }

    #[test]
    fn unknown_tool_label_falls_back_to_its_name() {
        assert_eq!(display_label("placeBet"), "placeBet");
        assert_eq!(display_label("getInjuryReport"), "Checking Injuries");
    }
}
