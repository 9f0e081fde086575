//! Built-in tool implementations for tracebank.
//!
//! Two tools, matching the two action forms the agent can emit:
//! - `python_exec(path)` runs a script and reports its output
//! - `xlsx_query(path, query)` computes simple aggregates over a workbook

pub mod python_exec;
pub mod xlsx_query;

use tracebank_core::tool::ToolRegistry;

pub use python_exec::PythonExecTool;
pub use xlsx_query::XlsxQueryTool;

/// Create a registry with both built-in tools.
///
/// `python` is the interpreter `python_exec` launches.
pub fn default_registry(python: impl Into<String>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(PythonExecTool::new(python)));
    registry.register(Box::new(XlsxQueryTool));
    registry
}

/// Pull a required string argument out of a tool argument object.
pub(crate) fn str_arg<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, tracebank_core::error::ToolError> {
    arguments[key].as_str().ok_or_else(|| {
        tracebank_core::error::ToolError::InvalidArguments(format!("Missing '{key}' argument"))
    })
}
