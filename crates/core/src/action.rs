//! Typed tool invocations parsed from model output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tool invocation the agent asked for.
///
/// Serialized in the trajectory artifact as
/// `{"tool": "python_exec", "input": "<path>"}` or
/// `{"tool": "xlsx_query", "input": {"path": "...", "query": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "input")]
pub enum Action {
    /// Run a Python script and capture its output.
    #[serde(rename = "python_exec")]
    ScriptRun(String),

    /// Query a spreadsheet with a free-text question.
    #[serde(rename = "xlsx_query")]
    SpreadsheetQuery { path: String, query: String },
}

impl Action {
    /// Name of the tool this action dispatches to.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ScriptRun(_) => "python_exec",
            Self::SpreadsheetQuery { .. } => "xlsx_query",
        }
    }

    /// Tool arguments as a JSON object, in the shape tools expect.
    pub fn arguments(&self) -> serde_json::Value {
        match self {
            Self::ScriptRun(path) => serde_json::json!({ "path": path }),
            Self::SpreadsheetQuery { path, query } => {
                serde_json::json!({ "path": path, "query": query })
            }
        }
    }

    /// The file the action operates on.
    pub fn path(&self) -> &str {
        match self {
            Self::ScriptRun(path) => path,
            Self::SpreadsheetQuery { path, .. } => path,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScriptRun(path) => write!(f, "python_exec(\"{path}\")"),
            Self::SpreadsheetQuery { path, query } => {
                write!(f, "xlsx_query(\"{path}\", \"{query}\")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_run_wire_shape() {
        let action = Action::ScriptRun("script.py".into());
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tool": "python_exec", "input": "script.py"})
        );
    }

    #[test]
    fn spreadsheet_query_wire_shape() {
        let action = Action::SpreadsheetQuery {
            path: "data.xlsx".into(),
            query: "total sales by city".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["tool"], "xlsx_query");
        assert_eq!(json["input"]["path"], "data.xlsx");
        assert_eq!(json["input"]["query"], "total sales by city");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn display_matches_action_syntax() {
        let action = Action::SpreadsheetQuery {
            path: "a.xlsx".into(),
            query: "q".into(),
        };
        assert_eq!(action.to_string(), r#"xlsx_query("a.xlsx", "q")"#);
        assert_eq!(action.tool_name(), "xlsx_query");
        assert_eq!(action.arguments()["query"], "q");
    }
}
