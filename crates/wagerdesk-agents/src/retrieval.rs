use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Context string returned when retrieval yields no documents. The explicit
/// wording avoids an ambiguous empty result reaching the model.
pub const NO_RESULTS_CONTEXT: &str = "No relevant information found in the knowledge base.";

/// Retrieval failures. These propagate out of the knowledge-base tool as a
/// hard failure of that tool call; they are never silently swallowed.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The retrieval backend rejected or failed the query.
    #[error("retrieval backend error: {0}")]
    Backend(String),
}

/// A document returned by the knowledge-base collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identifier.
    pub id: String,
    /// Source URL.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Extracted text used as model context.
    pub text: String,
    /// Relevancy score assigned by the backend.
    pub relevancy: f64,
}

/// Opaque retrieval capability: a query in, zero or more documents out.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Retrieve documents relevant to the query.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrievalError>;
}

/// Format retrieved documents into a single context block for the model.
pub fn format_documents_context(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("Source {} ({}):\n{}", i + 1, doc.title, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Convert documents to the `sources` payload carried on the knowledge-base
/// tool output: `(url, title)` pairs the projector turns into citations.
pub fn documents_to_sources(documents: &[Document]) -> Vec<Value> {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            json!({
                "sourceType": "url",
                "id": format!("kb-source-{}-{i}", doc.id),
                "url": doc.url,
                "title": if doc.title.is_empty() { "Knowledge Base Source" } else { doc.title.as_str() },
            })
        })
        .collect()
}

/// In-memory retriever over a fixed corpus, scored by naive term overlap.
/// Stands in for the vector-search service in tests and the demo binary.
#[derive(Default)]
pub struct StaticRetriever {
    corpus: Vec<Document>,
}

impl StaticRetriever {
    /// Create a retriever over the given corpus.
    pub fn new(corpus: Vec<Document>) -> Self {
        Self { corpus }
    }

    /// A small betting-strategy corpus for demos.
    pub fn with_demo_corpus() -> Self {
        Self::new(vec![
            Document {
                id: "bankroll".into(),
                url: "https://wagerdesk.example/kb/bankroll-management".into(),
                title: "Bankroll Management Basics".into(),
                text: "Flat betting 1-2% of your bankroll per wager protects against \
                       variance; never chase losses by increasing stake size."
                    .into(),
                relevancy: 0.0,
            },
            Document {
                id: "line-shopping".into(),
                url: "https://wagerdesk.example/kb/line-shopping".into(),
                title: "Why Line Shopping Matters".into(),
                text: "Comparing odds across sportsbooks before placing a bet adds \
                       measurable long-term expected value; -108 beats -112."
                    .into(),
                relevancy: 0.0,
            },
            Document {
                id: "closing-line".into(),
                url: "https://wagerdesk.example/kb/closing-line-value".into(),
                title: "Closing Line Value".into(),
                text: "Beating the closing line consistently is the strongest predictor \
                       of a profitable betting process."
                    .into(),
                relevancy: 0.0,
            },
        ])
    }
}

#[async_trait]
impl DocumentRetriever for StaticRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrievalError> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_ascii_lowercase())
            .filter(|t| t.len() > 2)
            .collect();

        let mut scored: Vec<Document> = self
            .corpus
            .iter()
            .filter_map(|doc| {
                let haystack = format!("{} {}", doc.title, doc.text).to_ascii_lowercase();
                let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                if hits == 0 {
                    return None;
                }
                let mut doc = doc.clone();
                doc.relevancy = hits as f64 / terms.len().max(1) as f64;
                Some(doc)
            })
            .collect();
        scored.sort_by(|a, b| b.relevancy.total_cmp(&a.relevancy));
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_corpus_matches_on_terms() {
        let retriever = StaticRetriever::with_demo_corpus();
        let docs = retriever.retrieve("bankroll strategy").await.unwrap();
        assert!(!docs.is_empty());
        assert_eq!(docs[0].id, "bankroll");
    }

    #[tokio::test]
    async fn unrelated_query_returns_nothing() {
        let retriever = StaticRetriever::with_demo_corpus();
        let docs = retriever.retrieve("quantum chromodynamics").await.unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn sources_default_missing_titles() {
        let docs = vec![Document {
            id: "d1".into(),
            url: "https://example.com".into(),
            title: String::new(),
            text: "body".into(),
            relevancy: 1.0,
        }];
        let sources = documents_to_sources(&docs);
        assert_eq!(sources[0]["title"], "Knowledge Base Source");
        assert_eq!(sources[0]["sourceType"], "url");
    }

    #[test]
    fn context_numbers_documents() {
        let docs = StaticRetriever::with_demo_corpus().corpus;
        let ctx = format_documents_context(&docs);
        assert!(ctx.starts_with("Source 1 (Bankroll Management Basics):"));
        assert!(ctx.contains("Source 3 ("));
    }
}
