use async_trait::async_trait;
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wagerdesk_agents::tools::builtin_tools;
use wagerdesk_agents::{
    builtin_profiles, AgentRegistry, ChatModel, ModelError, ModelEvent, ModelEventStream,
    ModelMessage, StaticRetriever, ToolDescriptor,
};
use wagerdesk_server::http;
use wagerdesk_server::service::AppState;

#[derive(Debug, Parser)]
#[command(name = "wagerdesk-server")]
struct Args {
    #[arg(long, env = "WAGERDESK_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    http_addr: String,
}

/// Offline stand-in for a model provider.
///
/// First step retrieves from the knowledge base with the user's query, then
/// answers with a canned reminder. Keeps the server demonstrable end to end
/// without provider credentials.
struct CannedAdvisorModel;

#[async_trait]
impl ChatModel for CannedAdvisorModel {
    async fn stream_step(
        &self,
        _system_prompt: &str,
        messages: &[ModelMessage],
        _tools: &[ToolDescriptor],
    ) -> Result<ModelEventStream, ModelError> {
        let already_retrieved = messages
            .iter()
            .any(|m| m.tool_calls.iter().any(|c| c.name == "retrieveKnowledgeBase"));

        let events = if already_retrieved {
            vec![ModelEvent::TextDelta(
                "Based on the knowledge base: size bets at 1-5% of bankroll, shop lines \
                 across books, and never chase losses. Bet responsibly."
                    .to_string(),
            )]
        } else {
            let query = messages
                .iter()
                .rev()
                .find(|m| m.role == wagerdesk_agents::ModelRole::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            vec![
                ModelEvent::ToolCallStart {
                    id: "call_kb".to_string(),
                    name: "retrieveKnowledgeBase".to_string(),
                },
                ModelEvent::ToolCallReady {
                    id: "call_kb".to_string(),
                    name: "retrieveKnowledgeBase".to_string(),
                    arguments: json!({ "query": query }),
                },
            ]
        };
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let tools = builtin_tools(Arc::new(StaticRetriever::with_demo_corpus()));
    let registry = match AgentRegistry::builder()
        .with_profiles(builtin_profiles())
        .with_model(Arc::new(CannedAdvisorModel))
        .with_tools(tools)
        .build()
    {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("failed to build agent registry: {e}");
            std::process::exit(2);
        }
    };

    let app = http::routes().with_state(AppState {
        registry: Arc::new(registry),
    });

    let listener = tokio::net::TcpListener::bind(&args.http_addr)
        .await
        .expect("failed to bind http listener");
    tracing::info!(addr = %args.http_addr, "wagerdesk-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("http server crashed");
}
