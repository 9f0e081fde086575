//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let the agent look at its data file: run a script or
//! query a spreadsheet. Whatever a tool returns, the loop stores it as an
//! [`Observation`]; the only field the core ever interprets is `error`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use crate::action::Action;
use crate::error::ToolError;

/// The structured result of a tool dispatch.
///
/// Always a JSON object. A failed dispatch is `{"error": "<reason>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(Map<String, Value>);

impl Observation {
    /// An error observation carrying `reason`.
    pub fn error(reason: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("error".into(), Value::String(reason.into()));
        Self(fields)
    }

    /// Wrap an arbitrary JSON value. Non-objects land under `value`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            other => {
                let mut fields = Map::new();
                fields.insert("value".into(), other);
                Self(fields)
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.0.contains_key("error")
    }

    /// The error reason, if this is an error observation with a string reason.
    pub fn error_reason(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<ToolError> for Observation {
    fn from(err: ToolError) -> Self {
        Self::error(err.to_string())
    }
}

/// The core Tool trait.
///
/// Each tool (python_exec, xlsx_query) implements this trait and is
/// registered in the [`ToolRegistry`] under the name actions refer to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "python_exec").
    fn name(&self) -> &str;

    /// Execute the tool with arguments produced by [`Action::arguments`].
    async fn execute(&self, arguments: Value) -> std::result::Result<Observation, ToolError>;
}

/// A registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Execute an action against the tool it names.
    pub async fn dispatch(&self, action: &Action) -> std::result::Result<Observation, ToolError> {
        let tool = self
            .tools
            .get(action.tool_name())
            .ok_or_else(|| ToolError::NotFound(action.tool_name().to_string()))?;
        tool.execute(action.arguments()).await
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes its path argument back.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "python_exec" }
        async fn execute(&self, arguments: Value) -> std::result::Result<Observation, ToolError> {
            let path = arguments["path"].as_str().unwrap_or("").to_string();
            Ok(Observation::from_value(serde_json::json!({ "stdout": path })))
        }
    }

    #[test]
    fn error_observation_detected() {
        let obs = Observation::error("no_action_parsed");
        assert!(obs.is_error());
        assert_eq!(obs.error_reason(), Some("no_action_parsed"));
        assert_eq!(
            serde_json::to_value(&obs).unwrap(),
            serde_json::json!({"error": "no_action_parsed"})
        );
    }

    #[test]
    fn non_object_values_are_wrapped() {
        let obs = Observation::from_value(serde_json::json!(42));
        assert!(!obs.is_error());
        assert_eq!(obs.get("value"), Some(&serde_json::json!(42)));
    }

    #[tokio::test]
    async fn registry_dispatches_by_tool_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let obs = registry
            .dispatch(&Action::ScriptRun("a.py".into()))
            .await
            .unwrap();
        assert_eq!(obs.get("stdout"), Some(&serde_json::json!("a.py")));
    }

    #[tokio::test]
    async fn registry_dispatch_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch(&Action::SpreadsheetQuery {
                path: "a.xlsx".into(),
                query: "q".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref name) if name == "xlsx_query"));
    }
}
