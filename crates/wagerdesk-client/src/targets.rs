use serde::{Deserialize, Serialize};

/// A selectable agent: identity, picker copy, and the endpoint it answers on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTarget {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description for the picker.
    pub description: String,
    /// Endpoint path, relative to the service base URL.
    pub endpoint: String,
}

impl AgentTarget {
    fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            endpoint: format!("/api/{id}"),
        }
    }
}

/// The built-in agent picker entries, orchestrator first.
pub fn builtin_targets() -> Vec<AgentTarget> {
    vec![
        AgentTarget::new(
            "orchestrator",
            "Main Advisor",
            "Intelligent router for all sports and general betting advice",
        ),
        AgentTarget::new("football", "Football Expert", "NFL and College Football specialist"),
        AgentTarget::new(
            "basketball",
            "Basketball Expert",
            "NBA and NCAA Basketball specialist",
        ),
        AgentTarget::new("soccer", "Soccer Expert", "Global football leagues specialist"),
        AgentTarget::new("csgo", "CS2 Expert", "Counter-Strike 2 esports specialist"),
        AgentTarget::new("lol", "LoL Expert", "League of Legends esports specialist"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_is_the_default_first_target() {
        let targets = builtin_targets();
        assert_eq!(targets.len(), 6);
        assert_eq!(targets[0].id, "orchestrator");
        assert_eq!(targets[0].endpoint, "/api/orchestrator");
    }
}
