use crate::retrieval::{
    documents_to_sources, format_documents_context, DocumentRetriever, NO_RESULTS_CONTEXT,
};
use crate::tool::require_str;
use crate::{Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Tool name of the knowledge-base retrieval tool. The projector uses this
/// identity to attach citations to assistant messages.
pub const KNOWLEDGE_BASE_TOOL: &str = "retrieveKnowledgeBase";

/// Thin pass-through from the model to the [`DocumentRetriever`] collaborator.
///
/// Output carries a `context` block plus a `sources` array of `(url, title)`
/// pairs. Retrieval failures surface as a hard failure of this tool call.
pub struct RetrieveKnowledgeBase {
    retriever: Arc<dyn DocumentRetriever>,
}

impl RetrieveKnowledgeBase {
    /// Create the tool over a retrieval backend.
    pub fn new(retriever: Arc<dyn DocumentRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for RetrieveKnowledgeBase {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            KNOWLEDGE_BASE_TOOL,
            "Knowledge Base Search",
            "Search the knowledge base for information about sports betting, gambling \
             strategies, casino games, betting markets, and odds analysis.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for sports betting, gambling, casino \
                                    games, or betting market information"
                }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let query = require_str(&args, "query")?;
        debug!(query = %query, "searching knowledge base");

        let documents = self
            .retriever
            .retrieve(&query)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        if documents.is_empty() {
            return Ok(json!({
                "context": NO_RESULTS_CONTEXT,
                "sources": [],
            }));
        }

        Ok(json!({
            "context": format_documents_context(&documents),
            "sources": documents_to_sources(&documents),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{Document, RetrievalError, StaticRetriever};

    struct FailingRetriever;

    #[async_trait]
    impl DocumentRetriever for FailingRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, RetrievalError> {
            Err(RetrievalError::Backend("index unavailable".into()))
        }
    }

    #[tokio::test]
    async fn hits_return_context_and_sources() {
        let tool = RetrieveKnowledgeBase::new(Arc::new(StaticRetriever::with_demo_corpus()));
        let out = tool
            .execute(json!({"query": "line shopping odds"}))
            .await
            .unwrap();
        assert!(out["context"].as_str().unwrap().contains("Line Shopping"));
        assert!(!out["sources"].as_array().unwrap().is_empty());
        assert!(out["sources"][0]["url"].as_str().unwrap().starts_with("https://"));
    }

    #[tokio::test]
    async fn no_results_yield_explicit_context() {
        let tool = RetrieveKnowledgeBase::new(Arc::new(StaticRetriever::default()));
        let out = tool.execute(json!({"query": "anything"})).await.unwrap();
        assert_eq!(out["context"], NO_RESULTS_CONTEXT);
        assert_eq!(out["sources"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn backend_failure_fails_the_tool_call() {
        let tool = RetrieveKnowledgeBase::new(Arc::new(FailingRetriever));
        let err = tool.execute(json!({"query": "anything"})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }
}
