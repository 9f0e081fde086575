//! Python tool — run a script and capture what it prints.
//!
//! Observation: `{stdout, stderr, returncode, last_number}` where
//! `last_number` is the last integer-looking token in stdout (or null).

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::LazyLock;
use tokio::process::Command;
use tracebank_core::error::ToolError;
use tracebank_core::tool::{Observation, Tool};
use tracing::{debug, warn};

use crate::str_arg;

static INTEGER_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());

/// Runs Python scripts with a configurable interpreter.
pub struct PythonExecTool {
    interpreter: String,
}

impl PythonExecTool {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonExecTool {
    fn default() -> Self {
        Self::new("python")
    }
}

/// The last `-?\d+` token in `stdout`, as a JSON number when it fits in i64.
pub fn last_number(stdout: &str) -> Value {
    match INTEGER_TOKEN.find_iter(stdout).last() {
        Some(m) => m
            .as_str()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(m.as_str().to_string())),
        None => Value::Null,
    }
}

#[async_trait]
impl Tool for PythonExecTool {
    fn name(&self) -> &str { "python_exec" }

    async fn execute(&self, arguments: Value) -> Result<Observation, ToolError> {
        let path = str_arg(&arguments, "path")?;

        if !Path::new(path).is_file() {
            return Err(ToolError::FileNotFound(path.to_string()));
        }

        debug!(interpreter = %self.interpreter, path = %path, "Running script");

        let output = Command::new(&self.interpreter)
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "python_exec".into(),
                reason: format!("failed to launch {}: {e}", self.interpreter),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            warn!(path = %path, code = ?output.status.code(), "Script exited with failure");
        }

        Ok(Observation::from_value(json!({
            "stdout": stdout,
            "stderr": stderr,
            "returncode": output.status.code(),
            "last_number": last_number(&stdout),
        })))
    }
}
