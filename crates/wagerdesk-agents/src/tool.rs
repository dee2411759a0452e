use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran but failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Tool metadata exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name (the identifier the model calls).
    pub name: String,
    /// Human-readable label shown while the call renders.
    pub label: String,
    /// Description guiding the model on when to use the tool.
    pub description: String,
    /// JSON schema for the input payload.
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty object schema.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    /// Set the parameters schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }
}

/// An opaque capability the model can invoke: structured input in,
/// structured output out. The pipeline depends only on this shape.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool metadata.
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with JSON arguments.
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

pub(crate) fn require_str(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing {key}")))
}

pub(crate) fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
