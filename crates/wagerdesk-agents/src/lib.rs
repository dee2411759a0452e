//! Agent profiles, betting analysis tools, and the step-capped runner loop.
//!
//! Everything the model touches goes through a seam: tools implement
//! [`Tool`], knowledge-base retrieval implements [`DocumentRetriever`], and
//! model invocation implements [`ChatModel`]. The [`AgentRunner`] drives a
//! model in a loop bounded by the profile's step cap, executing requested
//! tools between steps and emitting [`AgentEvent`]s.

mod model;
mod profiles;
mod registry;
mod retrieval;
mod runner;
mod tool;
pub mod tools;

pub use model::{ChatModel, ModelError, ModelEvent, ModelEventStream, ModelMessage, ModelRole, ScriptedModel, ToolInvocation};
pub use profiles::{builtin_profiles, AgentProfile};
pub use registry::{AgentRegistry, AgentRegistryBuilder, RegistryError, ResolvedAgent};
pub use retrieval::{
    documents_to_sources, format_documents_context, Document, DocumentRetriever, RetrievalError,
    StaticRetriever, NO_RESULTS_CONTEXT,
};
pub use runner::{AgentEvent, AgentRunner, FinishReason};
pub use tool::{Tool, ToolDescriptor, ToolError};
