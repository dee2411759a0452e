use crate::model::ChatModel;
use crate::profiles::AgentProfile;
use crate::runner::AgentRunner;
use crate::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Registry construction and resolution errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No profile registered under the requested id.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// The builder was missing a required component.
    #[error("registry misconfigured: {0}")]
    Misconfigured(String),
}

/// An agent profile resolved together with its runtime dependencies.
pub struct ResolvedAgent {
    /// The resolved profile.
    pub profile: AgentProfile,
    model: Arc<dyn ChatModel>,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ResolvedAgent {
    /// Build a runner for one streaming request.
    pub fn runner(&self) -> AgentRunner {
        AgentRunner::new(
            self.model.clone(),
            self.tools.clone(),
            self.profile.system_prompt.clone(),
            self.profile.max_steps,
        )
    }
}

/// Holds the registered agent profiles and the shared model/tool set.
pub struct AgentRegistry {
    profiles: HashMap<String, AgentProfile>,
    model: Arc<dyn ChatModel>,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl AgentRegistry {
    /// Start building a registry.
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// Resolve a profile id to an agent ready to run.
    pub fn resolve(&self, agent_id: &str) -> Result<ResolvedAgent, RegistryError> {
        let profile = self
            .profiles
            .get(agent_id)
            .cloned()
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.to_string()))?;
        Ok(ResolvedAgent {
            profile,
            model: self.model.clone(),
            tools: self.tools.clone(),
        })
    }

    /// All registered profiles, sorted by id.
    pub fn profiles(&self) -> Vec<&AgentProfile> {
        let mut profiles: Vec<&AgentProfile> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }
}

/// Builder for [`AgentRegistry`].
#[derive(Default)]
pub struct AgentRegistryBuilder {
    profiles: HashMap<String, AgentProfile>,
    model: Option<Arc<dyn ChatModel>>,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl AgentRegistryBuilder {
    /// Register an agent profile.
    #[must_use]
    pub fn with_profile(mut self, profile: AgentProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    /// Register several profiles.
    #[must_use]
    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = AgentProfile>) -> Self {
        for profile in profiles {
            self = self.with_profile(profile);
        }
        self
    }

    /// Set the shared model.
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Register the shared tool set.
    #[must_use]
    pub fn with_tools(mut self, tools: HashMap<String, Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    /// Build the registry.
    pub fn build(self) -> Result<AgentRegistry, RegistryError> {
        if self.profiles.is_empty() {
            return Err(RegistryError::Misconfigured("no agent profiles".into()));
        }
        let model = self
            .model
            .ok_or_else(|| RegistryError::Misconfigured("no model configured".into()))?;
        Ok(AgentRegistry {
            profiles: self.profiles,
            model,
            tools: self.tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;
    use crate::profiles::builtin_profiles;

    #[test]
    fn resolves_registered_profile() {
        let registry = AgentRegistry::builder()
            .with_profiles(builtin_profiles())
            .with_model(Arc::new(ScriptedModel::default()))
            .build()
            .unwrap();

        let resolved = registry.resolve("football").unwrap();
        assert_eq!(resolved.profile.name, "Football Expert");
        assert!(matches!(
            registry.resolve("curling"),
            Err(RegistryError::AgentNotFound(_))
        ));
    }

    #[test]
    fn build_requires_profiles_and_model() {
        assert!(matches!(
            AgentRegistry::builder().build(),
            Err(RegistryError::Misconfigured(_))
        ));
        assert!(matches!(
            AgentRegistry::builder()
                .with_profiles(builtin_profiles())
                .build(),
            Err(RegistryError::Misconfigured(_))
        ));
    }
}
