//! Trajectory domain types — the ordered record of one agent run.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::action::Action;
use crate::tool::Observation;

/// Which flavour of the agent loop produced a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Reflection on errors and uncertainty only; no reasoning bank.
    Baseline,
    /// Heuristic reflection plus rule retrieval and synthesis.
    #[default]
    Enhanced,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Self::Baseline),
            "enhanced" => Ok(Self::Enhanced),
            other => Err(format!("unknown mode '{other}' (expected baseline or enhanced)")),
        }
    }
}

/// A single step in a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based loop iteration this step belongs to. Reflection steps share
    /// the index of the step they reflect on.
    pub step: usize,

    /// The raw completion, or `Reflection: <note>` for reflection steps.
    pub thought: String,

    pub action: Option<Action>,

    pub observation: Option<Observation>,

    /// Ids of the bank rules that were in the prompt for this step.
    #[serde(default)]
    pub retrieved_rules: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reflection: bool,
}

impl Step {
    /// A step that ended the run with an answer.
    pub fn answer(step: usize, thought: impl Into<String>, retrieved_rules: Vec<String>) -> Self {
        Self {
            step,
            thought: thought.into(),
            action: None,
            observation: None,
            retrieved_rules,
            reflection: false,
        }
    }

    /// A step whose completion could not be turned into an action.
    pub fn failed(
        step: usize,
        thought: impl Into<String>,
        observation: Observation,
        retrieved_rules: Vec<String>,
    ) -> Self {
        Self {
            step,
            thought: thought.into(),
            action: None,
            observation: Some(observation),
            retrieved_rules,
            reflection: false,
        }
    }

    /// A step that dispatched an action and recorded what came back.
    pub fn acted(
        step: usize,
        thought: impl Into<String>,
        action: Action,
        observation: Observation,
        retrieved_rules: Vec<String>,
    ) -> Self {
        Self {
            step,
            thought: thought.into(),
            action: Some(action),
            observation: Some(observation),
            retrieved_rules,
            reflection: false,
        }
    }

    /// A reflection-only step carrying `note`.
    pub fn reflection(step: usize, note: &str, retrieved_rules: Vec<String>) -> Self {
        Self {
            step,
            thought: format!("Reflection: {note}"),
            action: None,
            observation: None,
            retrieved_rules,
            reflection: true,
        }
    }
}

/// Ordered, append-only sequence of steps for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory(Vec<Step>);

impl Trajectory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.0.last()
    }

    pub fn reflection_count(&self) -> usize {
        self.0.iter().filter(|s| s.reflection).count()
    }

    /// Observation of the most recent step that carries one.
    pub fn last_observation(&self) -> Option<&Observation> {
        self.0.iter().rev().find_map(|s| s.observation.as_ref())
    }

    /// Actions in the trajectory, most recent first.
    pub fn recent_actions(&self) -> impl Iterator<Item = &Action> {
        self.0.iter().rev().filter_map(|s| s.action.as_ref())
    }

    /// Index of the last recorded step, or 0 for an empty trajectory.
    pub fn last_step_index(&self) -> usize {
        self.0.last().map(|s| s.step).unwrap_or(0)
    }
}

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Answered,
    Failed,
}

impl Judgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run stopped. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Answered,
    StepBudgetExhausted,
    UnparsedAction,
    ModelError,
}

/// The trajectory artifact written once per (task, run) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub task_id: u64,
    pub mode: RunMode,
    pub run_id: u64,
    pub question: String,
    pub file_name: String,
    pub final_answer: Option<String>,
    pub judgment: Judgment,
    pub termination: TerminationReason,
    pub trajectory: Trajectory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_steps_are_counted() {
        let mut traj = Trajectory::new();
        traj.push(Step::acted(
            1,
            "Action: python_exec(\"a.py\")",
            Action::ScriptRun("a.py".into()),
            Observation::error("boom"),
            vec![],
        ));
        traj.push(Step::reflection(1, "rethink", vec![]));
        assert_eq!(traj.reflection_count(), 1);
        assert_eq!(traj.last_step_index(), 1);
        assert!(traj.last_observation().unwrap().is_error());
        assert_eq!(traj.steps()[1].thought, "Reflection: rethink");
    }

    #[test]
    fn step_serializes_with_null_action() {
        let step = Step::answer(2, "Answer: 5", vec!["rb_0001".into()]);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step"], 2);
        assert!(json["action"].is_null());
        assert!(json["observation"].is_null());
        assert_eq!(json["retrieved_rules"], serde_json::json!(["rb_0001"]));
        assert!(json.get("reflection").is_none());
    }

    #[test]
    fn recent_actions_skip_reflections() {
        let mut traj = Trajectory::new();
        traj.push(Step::acted(
            1,
            "t",
            Action::ScriptRun("a.py".into()),
            Observation::error("x"),
            vec![],
        ));
        traj.push(Step::reflection(1, "n", vec![]));
        traj.push(Step::acted(
            2,
            "t",
            Action::ScriptRun("b.py".into()),
            Observation::error("x"),
            vec![],
        ));
        let actions: Vec<_> = traj.recent_actions().collect();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].path(), "b.py");
    }

    #[test]
    fn run_mode_parses() {
        assert_eq!("Baseline".parse::<RunMode>().unwrap(), RunMode::Baseline);
        assert_eq!("enhanced".parse::<RunMode>().unwrap(), RunMode::Enhanced);
        assert!("other".parse::<RunMode>().is_err());
        assert_eq!(RunMode::default(), RunMode::Enhanced);
    }

    #[test]
    fn judgment_and_termination_wire_names() {
        assert_eq!(serde_json::to_value(Judgment::Failed).unwrap(), "failed");
        assert_eq!(
            serde_json::to_value(TerminationReason::StepBudgetExhausted).unwrap(),
            "step_budget_exhausted"
        );
    }
}
