//! The tracebank reasoning agent.
//!
//! A ReAct loop over a language model and two data tools:
//!
//! 1. **Prompt** with the question, file path, prior steps and, in enhanced
//!    mode, rules retrieved from the reasoning bank
//! 2. **Parse** the completion into an answer or an action
//! 3. **Dispatch** the action and record the observation
//! 4. **Reflect** when the policy says so, distilling new rules (enhanced)
//!
//! The loop ends on an answer, an unparsable completion, a model failure,
//! or an exhausted step budget.

pub mod loop_runner;
pub mod parser;
pub mod policy;
pub mod prompt;
pub mod reflection;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, LoopSettings, RunOutcome, TaskSpec};
pub use parser::{extract_answer, parse_action};
pub use policy::{AlwaysReflect, BaselinePolicy, HeuristicPolicy, ReflectionPolicy, policy_for};
pub use reflection::{REFLECTION_NOTE, infer_tags, synthesize_rules};
