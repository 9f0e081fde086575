//! Shared test doubles for the agent loop.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracebank_core::error::{BankError, ProviderError, ToolError};
use tracebank_core::provider::{Provider, ProviderRequest, ProviderResponse};
use tracebank_core::rule::{Polarity, Rule, RuleCandidate, RuleStore};
use tracebank_core::tool::{Observation, Tool, ToolRegistry};

/// A provider that returns a sequence of scripted completions.
///
/// Panics if more calls are made than completions provided.
pub struct ScriptedProvider {
    responses: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new<'a>(responses: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// The same completion `times` times.
    pub fn repeat(text: &str, times: usize) -> Self {
        Self::new(std::iter::repeat_n(text, times))
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let index = prompts.len();
        let Some(content) = self.responses.get(index).cloned() else {
            panic!(
                "ScriptedProvider: no more responses (call #{index}, have {})",
                self.responses.len()
            );
        };
        prompts.push(request.prompt);
        Ok(ProviderResponse {
            content,
            model: request.model,
            usage: None,
        })
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// A provider that sleeps before answering.
pub struct SlowProvider(pub Duration);

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(ProviderResponse {
            content: "Answer: too late".into(),
            model: request.model,
            usage: None,
        })
    }
}

/// A tool that always returns the same observation.
pub struct StubTool {
    name: String,
    result: Value,
}

impl StubTool {
    pub fn ok(name: &str, result: Value) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _arguments: Value) -> Result<Observation, ToolError> {
        Ok(Observation::from_value(self.result.clone()))
    }
}

/// A `python_exec` stand-in that never finishes in time.
pub struct SlowTool(pub Duration);

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "python_exec"
    }

    async fn execute(&self, _arguments: Value) -> Result<Observation, ToolError> {
        tokio::time::sleep(self.0).await;
        Ok(Observation::from_value(Value::Null))
    }
}

pub fn registry_with(tool: impl Tool + 'static) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(tool));
    registry
}

/// A rule store whose reads and writes all fail.
#[derive(Default)]
pub struct FailingBank {
    calls: AtomicUsize,
}

impl FailingBank {
    /// Total `add_rule` and `retrieve_rules` attempts.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, BankError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BankError::Storage("disk full".into()))
    }
}

#[async_trait]
impl RuleStore for FailingBank {
    fn name(&self) -> &str {
        "failing"
    }

    async fn add_rule(&self, _candidate: RuleCandidate) -> Result<Rule, BankError> {
        self.fail()
    }

    async fn retrieve_rules(
        &self,
        _tags: &[String],
        _polarity: Option<Polarity>,
        _limit: usize,
    ) -> Result<Vec<Rule>, BankError> {
        self.fail()
    }

    async fn rules(&self) -> Result<Vec<Rule>, BankError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, BankError> {
        Ok(0)
    }
}
