//! When to pause and reflect.
//!
//! The loop asks its [`ReflectionPolicy`] after every non-terminal step.
//! Which policy is used is decided up front by [`policy_for`].

use tracebank_core::trajectory::{RunMode, Trajectory};
use tracebank_core::tool::Observation;

use crate::parser;

const UNCERTAINTY_MARKERS: &[&str] = &["not sure", "uncertain"];
const QUERY_LANGUAGE_TOKENS: &[&str] = &["select ", "group by", " from "];
const LONG_TRAJECTORY: usize = 3;

/// Decides whether the latest step deserves a reflection.
pub trait ReflectionPolicy: Send + Sync {
    fn name(&self) -> &str;

    fn should_reflect(
        &self,
        observation: &Observation,
        completion: &str,
        trajectory: &Trajectory,
    ) -> bool;
}

/// Reflect on tool errors and on hedged completions.
#[derive(Debug, Default)]
pub struct BaselinePolicy;

impl ReflectionPolicy for BaselinePolicy {
    fn name(&self) -> &str {
        "baseline"
    }

    fn should_reflect(
        &self,
        observation: &Observation,
        completion: &str,
        _trajectory: &Trajectory,
    ) -> bool {
        if observation.is_error() {
            return true;
        }
        let lowered = completion.to_lowercase();
        UNCERTAINTY_MARKERS.iter().any(|m| lowered.contains(m))
    }
}

/// Stricter policy for enhanced runs.
///
/// Fires on any of: an error observation; a query-language fragment in the
/// action line; the two most recent actions being identical; a trajectory
/// of three or more steps.
#[derive(Debug, Default)]
pub struct HeuristicPolicy;

impl ReflectionPolicy for HeuristicPolicy {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn should_reflect(
        &self,
        observation: &Observation,
        completion: &str,
        trajectory: &Trajectory,
    ) -> bool {
        if observation.is_error() {
            return true;
        }

        if let Some(line) = parser::action_line(completion) {
            let lowered = line.to_lowercase();
            if QUERY_LANGUAGE_TOKENS.iter().any(|t| lowered.contains(t)) {
                return true;
            }
        }

        let mut recent = trajectory.recent_actions();
        if let (Some(last), Some(previous)) = (recent.next(), recent.next())
            && last == previous
        {
            return true;
        }

        trajectory.len() >= LONG_TRAJECTORY
    }
}

/// Reflects at every opportunity. Used for deterministic enhanced runs.
#[derive(Debug, Default)]
pub struct AlwaysReflect;

impl ReflectionPolicy for AlwaysReflect {
    fn name(&self) -> &str {
        "always"
    }

    fn should_reflect(
        &self,
        _observation: &Observation,
        _completion: &str,
        _trajectory: &Trajectory,
    ) -> bool {
        true
    }
}

/// The policy a run in `mode` should use.
///
/// `deterministic` only affects enhanced runs; baseline always uses
/// [`BaselinePolicy`].
pub fn policy_for(mode: RunMode, deterministic: bool) -> Box<dyn ReflectionPolicy> {
    match (mode, deterministic) {
        (RunMode::Baseline, _) => Box::new(BaselinePolicy),
        (RunMode::Enhanced, true) => Box::new(AlwaysReflect),
        (RunMode::Enhanced, false) => Box::new(HeuristicPolicy),
    }
}
