//! Betting analysis tools.
//!
//! The analysis tools return structured mock data shaped like real
//! sportsbook/stats feeds; the knowledge-base tool is a thin pass-through to
//! a [`crate::DocumentRetriever`].

mod analyze_trends;
mod compare_odds;
mod injury_report;
mod knowledge_base;
mod team_stats;

pub use analyze_trends::AnalyzeTrends;
pub use compare_odds::CompareOdds;
pub use injury_report::GetInjuryReport;
pub use knowledge_base::{RetrieveKnowledgeBase, KNOWLEDGE_BASE_TOOL};
pub use team_stats::GetTeamStats;

use crate::{DocumentRetriever, Tool};
use std::collections::HashMap;
use std::sync::Arc;

/// The full tool set every agent profile is given.
pub fn builtin_tools(retriever: Arc<dyn DocumentRetriever>) -> HashMap<String, Arc<dyn Tool>> {
    let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();
    for tool in [
        Arc::new(CompareOdds) as Arc<dyn Tool>,
        Arc::new(GetTeamStats),
        Arc::new(AnalyzeTrends),
        Arc::new(GetInjuryReport),
        Arc::new(RetrieveKnowledgeBase::new(retriever)),
    ] {
        tools.insert(tool.descriptor().name, tool);
    }
    tools
}
