//! The agent loop — Thought → Action → Observation, with reflection.
//!
//! One loop serves both run modes. What differs between them is injected:
//!
//! - the [`ReflectionPolicy`] deciding when to reflect
//! - the [`RuleStore`] consulted before each prompt and written after each
//!   reflection (a [`NoopBank`] for baseline runs)
//!
//! Every run ends in exactly one [`TerminationReason`] and always leaves a
//! trajectory artifact behind, including runs that failed. Bank failures are
//! logged and never end a run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracebank_bank::{NoopBank, TrajectoryLog};
use tracebank_config::AppConfig;
use tracebank_core::error::{ProviderError, ToolError};
use tracebank_core::provider::{Provider, ProviderRequest};
use tracebank_core::rule::{Rule, RuleStore};
use tracebank_core::tool::{Observation, ToolRegistry};
use tracebank_core::trajectory::{
    Judgment, RunMode, RunRecord, Step, TerminationReason, Trajectory,
};
use tracebank_core::{Action, Result};
use tracing::{debug, info, warn};

use crate::parser;
use crate::policy::{ReflectionPolicy, policy_for};
use crate::prompt::{self, PromptInput};
use crate::reflection::{REFLECTION_NOTE, infer_tags, synthesize_rules};

/// Knobs for one loop instance.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub mode: RunMode,
    pub max_steps: usize,
    pub max_reflections: usize,
    /// Rules retrieved per step (enhanced only).
    pub rule_limit: usize,
    /// Reflect at every opportunity.
    pub deterministic: bool,
    /// End the run on a completion with neither answer nor action.
    pub stop_on_unparsed: bool,
    pub temperature: f32,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            mode: RunMode::Enhanced,
            max_steps: 8,
            max_reflections: 2,
            rule_limit: 2,
            deterministic: false,
            stop_on_unparsed: true,
            temperature: 0.0,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
        }
    }
}

impl LoopSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let agent = &config.agent;
        Self {
            mode: agent.mode,
            max_steps: agent.max_steps,
            max_reflections: agent.max_reflections,
            rule_limit: agent.rule_limit,
            deterministic: agent.deterministic,
            stop_on_unparsed: agent.stop_on_unparsed,
            temperature: config.default_temperature,
            model_timeout: Duration::from_secs(agent.model_timeout_secs),
            tool_timeout: Duration::from_secs(agent.tool_timeout_secs),
        }
    }
}

/// One question to answer.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub task_id: u64,
    pub run_id: u64,
    pub question: String,
    /// Relative to `base_dir`. Empty when the task has no file.
    pub file_name: String,
    pub base_dir: PathBuf,
}

impl TaskSpec {
    pub fn new(task_id: u64, question: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            task_id,
            run_id: 0,
            question: question.into(),
            file_name: file_name.into(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_run_id(mut self, run_id: u64) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// The file reference shown to the model, or `""` when there is none.
    pub fn file_path(&self) -> String {
        if self.file_name.is_empty() {
            String::new()
        } else {
            self.base_dir.join(&self.file_name).display().to_string()
        }
    }
}

/// The result of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub final_answer: Option<String>,
    pub judgment: Judgment,
    pub termination: TerminationReason,
    pub trajectory: Trajectory,
    /// Where the trajectory artifact was written.
    pub artifact: PathBuf,
}

/// The reasoning agent.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    model: String,
    tools: Arc<ToolRegistry>,
    policy: Box<dyn ReflectionPolicy>,
    bank: Arc<dyn RuleStore>,
    log: TrajectoryLog,
    settings: LoopSettings,
}

impl AgentLoop {
    /// Create a loop with default settings and no reasoning bank.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        log: TrajectoryLog,
    ) -> Self {
        let settings = LoopSettings::default();
        Self {
            provider,
            model: model.into(),
            tools,
            policy: policy_for(settings.mode, settings.deterministic),
            bank: Arc::new(NoopBank),
            log,
            settings,
        }
    }

    /// Replace the settings, and the reflection policy derived from them.
    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.policy = policy_for(settings.mode, settings.deterministic);
        self.settings = settings;
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn ReflectionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_bank(mut self, bank: Arc<dyn RuleStore>) -> Self {
        self.bank = bank;
        self
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    fn enhanced(&self) -> bool {
        self.settings.mode == RunMode::Enhanced
    }

    /// Run `task` to completion and write its trajectory artifact.
    pub async fn run(&self, task: &TaskSpec) -> Result<RunOutcome> {
        let file_path = task.file_path();
        let tags = infer_tags(&task.question, &file_path);

        let mut trajectory = Trajectory::new();
        let mut reflections_used = 0;
        let mut final_answer = None;
        let mut termination = TerminationReason::StepBudgetExhausted;

        info!(
            task_id = task.task_id,
            run_id = task.run_id,
            mode = %self.settings.mode,
            policy = self.policy.name(),
            bank = self.bank.name(),
            max_steps = self.settings.max_steps,
            "Agent run starting"
        );

        for step in 1..=self.settings.max_steps {
            let rules = if self.enhanced() {
                self.bank
                    .retrieve_rules(&tags, None, self.settings.rule_limit)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(step, error = %e, "Rule retrieval failed, prompting without rules");
                        Vec::new()
                    })
            } else {
                Vec::new()
            };
            let rule_ids: Vec<String> = rules.iter().map(|r| r.id.clone()).collect();

            let prompt =
                self.render_prompt(task, &file_path, &trajectory, reflections_used, &rules);

            let completion = match self.complete(prompt).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(step, error = %e, "Model call failed");
                    trajectory.push(Step::failed(
                        step,
                        String::new(),
                        Observation::error(format!("model_error: {e}")),
                        rule_ids,
                    ));
                    termination = TerminationReason::ModelError;
                    break;
                }
            };

            if let Some(answer) = parser::extract_answer(&completion) {
                debug!(step, "Answer marker found");
                trajectory.push(Step::answer(step, completion, rule_ids));
                final_answer = Some(answer);
                termination = TerminationReason::Answered;
                break;
            }

            let observation = match parser::parse_action(&completion) {
                Some(action) => {
                    let observation = self.dispatch(step, &action).await;
                    trajectory.push(Step::acted(
                        step,
                        completion.clone(),
                        action,
                        observation.clone(),
                        rule_ids.clone(),
                    ));
                    observation
                }
                None => {
                    let observation = Observation::error("no_action_parsed");
                    trajectory.push(Step::failed(
                        step,
                        completion.clone(),
                        observation.clone(),
                        rule_ids.clone(),
                    ));
                    if self.settings.stop_on_unparsed {
                        warn!(step, "No action parsed, stopping");
                        termination = TerminationReason::UnparsedAction;
                        break;
                    }
                    debug!(step, "No action parsed, continuing");
                    observation
                }
            };

            if reflections_used < self.settings.max_reflections
                && self.policy.should_reflect(&observation, &completion, &trajectory)
            {
                reflections_used += 1;
                debug!(step, reflections_used, "Reflecting");

                if self.enhanced() {
                    for candidate in synthesize_rules(&task.question, &file_path, &trajectory) {
                        match self.bank.add_rule(candidate).await {
                            Ok(rule) => info!(
                                rule_id = %rule.id,
                                polarity = %rule.polarity,
                                "Rule added to bank"
                            ),
                            Err(e) => warn!(step, error = %e, "Rule not stored"),
                        }
                    }
                }

                trajectory.push(Step::reflection(step, REFLECTION_NOTE, rule_ids));
            }
        }

        let judgment = match &final_answer {
            Some(answer) if !answer.is_empty() => Judgment::Answered,
            _ => Judgment::Failed,
        };

        let record = RunRecord {
            task_id: task.task_id,
            mode: self.settings.mode,
            run_id: task.run_id,
            question: task.question.clone(),
            file_name: task.file_name.clone(),
            final_answer: final_answer.clone(),
            judgment,
            termination,
            trajectory,
        };
        let artifact = self.log.save(&record)?;

        info!(
            task_id = task.task_id,
            steps = record.trajectory.len(),
            reflections = reflections_used,
            judgment = ?judgment,
            termination = ?termination,
            "Agent run finished"
        );

        Ok(RunOutcome {
            final_answer,
            judgment,
            termination,
            trajectory: record.trajectory,
            artifact,
        })
    }

    fn render_prompt(
        &self,
        task: &TaskSpec,
        file_path: &str,
        trajectory: &Trajectory,
        reflections_used: usize,
        rules: &[Rule],
    ) -> String {
        prompt::render(&PromptInput {
            mode: self.settings.mode,
            question: &task.question,
            file_path,
            trajectory,
            reflections_used,
            rules,
        })
    }

    async fn complete(&self, prompt: String) -> std::result::Result<String, ProviderError> {
        let request = ProviderRequest::new(&self.model, prompt)
            .with_temperature(self.settings.temperature);

        match timeout(self.settings.model_timeout, self.provider.complete(request)).await {
            Ok(response) => response.map(|r| r.content),
            Err(_) => Err(ProviderError::Timeout(self.settings.model_timeout.as_secs())),
        }
    }

    /// Run `action`; every failure comes back as an error observation.
    async fn dispatch(&self, step: usize, action: &Action) -> Observation {
        debug!(step, tool = action.tool_name(), path = action.path(), "Dispatching action");

        let result = match timeout(self.settings.tool_timeout, self.tools.dispatch(action)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool_name: action.tool_name().to_string(),
                timeout_secs: self.settings.tool_timeout.as_secs(),
            }),
        };

        result.unwrap_or_else(|e| {
            warn!(step, tool = action.tool_name(), error = %e, "Tool failed");
            Observation::from(e)
        })
    }
}
