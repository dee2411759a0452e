use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wagerdesk_agents::tools::builtin_tools;
use wagerdesk_agents::{
    builtin_profiles, AgentRegistry, ChatModel, ModelError, ModelEvent, ScriptedModel,
    StaticRetriever,
};
use wagerdesk_server::http;
use wagerdesk_server::service::AppState;
use wagerdesk_protocol::StreamEvent;

fn app(model: Arc<dyn ChatModel>) -> Router {
    let registry = AgentRegistry::builder()
        .with_profiles(builtin_profiles())
        .with_model(model)
        .with_tools(builtin_tools(Arc::new(StaticRetriever::with_demo_corpus())))
        .build()
        .expect("registry builds");
    http::routes().with_state(AppState {
        registry: Arc::new(registry),
    })
}

async fn post_chat(app: Router, path: &str, body: Value) -> (StatusCode, HeaderMap, String) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    let response = app.oneshot(request).await.expect("request is handled");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

fn parse_sse(body: &str) -> (Vec<StreamEvent>, bool) {
    let mut events = Vec::new();
    let mut done = false;
    for payload in body.lines().filter_map(|l| l.strip_prefix("data: ")) {
        if payload == "[DONE]" {
            done = true;
            continue;
        }
        events.push(serde_json::from_str(payload).expect("frame decodes"));
    }
    (events, done)
}

fn user_message(text: &str) -> Value {
    json!({
        "id": "u1",
        "role": "user",
        "parts": [{"type": "text", "text": text}],
    })
}

#[tokio::test]
async fn unusable_message_arrays_are_rejected_with_the_fixed_body() {
    for body in [
        json!({}),
        json!({"messages": []}),
        json!({"messages": "not an array"}),
    ] {
        let model = Arc::new(ScriptedModel::default());
        let (status, _, text) = post_chat(app(model), "/api/orchestrator", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Messages array is required");
    }
}

#[tokio::test]
async fn unknown_agents_are_a_404() {
    let model = Arc::new(ScriptedModel::default());
    let (status, _, _) = post_chat(
        app(model),
        "/api/curling",
        json!({"messages": [user_message("hi")]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plain_answer_streams_text_blocks_and_finishes() {
    let model = Arc::new(ScriptedModel::answering("Hammer the under."));
    let (status, headers, body) = post_chat(
        app(model),
        "/api/orchestrator",
        json!({"messages": [user_message("thoughts on the total?")]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("x-vercel-ai-ui-message-stream").unwrap(),
        "v1"
    );
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let (events, done) = parse_sse(&body);
    assert!(done, "stream must end with a [DONE] trailer");
    assert!(matches!(events[0], StreamEvent::MessageStart { .. }));

    let answer: String = events
        .iter()
        .filter_map(|ev| match ev {
            StreamEvent::TextDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(answer, "Hammer the under.");
    assert_eq!(
        events.last(),
        Some(&StreamEvent::finish_with_reason("stop"))
    );
}

#[tokio::test]
async fn tool_lifecycle_streams_in_order() {
    let model = Arc::new(ScriptedModel::new([
        vec![
            ModelEvent::ToolCallStart {
                id: "call_1".into(),
                name: "compareOdds".into(),
            },
            ModelEvent::ToolCallReady {
                id: "call_1".into(),
                name: "compareOdds".into(),
                arguments: json!({"sport": "NFL", "betType": "spread", "event": "Chiefs vs. Bills"}),
            },
        ],
        vec![ModelEvent::TextDelta("FanDuel has the best price.".into())],
    ]));
    let (status, _, body) = post_chat(
        app(model),
        "/api/football",
        json!({"messages": [user_message("who has the best spread price?")]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (events, done) = parse_sse(&body);
    assert!(done);

    let position = |pred: fn(&StreamEvent) -> bool| events.iter().position(pred).unwrap();
    let input_start = position(|e| matches!(e, StreamEvent::ToolInputStart { .. }));
    let input_available = position(|e| matches!(e, StreamEvent::ToolInputAvailable { .. }));
    let output_available = position(|e| matches!(e, StreamEvent::ToolOutputAvailable { .. }));
    let text_start = position(|e| matches!(e, StreamEvent::TextStart { .. }));
    assert!(input_start < input_available);
    assert!(input_available < output_available);
    assert!(output_available < text_start);
    assert!(matches!(events.last(), Some(StreamEvent::Finish { .. })));
}

#[tokio::test]
async fn provider_failures_surface_as_in_band_error_events() {
    struct FailingModel;

    #[async_trait::async_trait]
    impl ChatModel for FailingModel {
        async fn stream_step(
            &self,
            _system_prompt: &str,
            _messages: &[wagerdesk_agents::ModelMessage],
            _tools: &[wagerdesk_agents::ToolDescriptor],
        ) -> Result<wagerdesk_agents::ModelEventStream, ModelError> {
            Err(ModelError::Provider("upstream 503".into()))
        }
    }

    let (status, _, body) = post_chat(
        app(Arc::new(FailingModel)),
        "/api/orchestrator",
        json!({"messages": [user_message("hello?")]}),
    )
    .await;

    // The stream opens successfully; the failure travels in-band.
    assert_eq!(status, StatusCode::OK);
    let (events, done) = parse_sse(&body);
    assert!(done);
    assert!(events
        .iter()
        .any(|e| matches!(e, StreamEvent::Error { .. })));
}
