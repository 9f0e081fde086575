//! Deterministic offline provider.
//!
//! Reads the question and file path back out of the assembled prompt and
//! plays a fixed two-step script: call the tool that fits the file, then
//! answer once an observation is in the history.

use async_trait::async_trait;
use tracebank_core::error::ProviderError;
use tracebank_core::provider::{Provider, ProviderRequest, ProviderResponse};
use tracebank_core::trajectory::RunMode;

const QUESTION_PREFIX: &str = "Question: ";
const FILE_PREFIX: &str = "Associated file path: ";

/// A provider that needs no network and always answers the same way.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    mode: RunMode,
}

impl MockProvider {
    pub fn new(mode: RunMode) -> Self {
        Self { mode }
    }

    fn answer_label(&self) -> &'static str {
        match self.mode {
            RunMode::Baseline => "mock answer",
            RunMode::Enhanced => "mock enhanced answer",
        }
    }

    /// The completion this provider returns for `prompt`.
    pub fn respond(&self, prompt: &str) -> String {
        let field = |prefix: &str| {
            prompt
                .lines()
                .find_map(|l| l.strip_prefix(prefix))
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let question = field(QUESTION_PREFIX);
        let file_path = field(FILE_PREFIX);
        let label = self.answer_label();

        if prompt.lines().any(|l| l.trim_start().starts_with("Observation:")) {
            return format!(
                "Thought: I have seen the tool result.\nAnswer: {label} for {question}."
            );
        }

        let lowered = file_path.to_lowercase();
        if lowered.ends_with(".py") {
            format!(
                "Thought: I should run the python script to get the numeric result.\n\
                 Action: python_exec(\"{file_path}\")"
            )
        } else if lowered.ends_with(".xlsx") {
            format!(
                "Thought: I should query the spreadsheet using the question.\n\
                 Action: xlsx_query(\"{file_path}\", \"{question}\")"
            )
        } else {
            format!("Thought: No tool is needed here.\nAnswer: {label} for {question}.")
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            content: self.respond(&request.prompt),
            model: request.model,
            usage: None,
        })
    }
}
