//! # tracebank core
//!
//! Domain types, traits, and error definitions for the tracebank reasoning
//! agent. This crate has **no runtime dependencies** beyond serde and
//! chrono; it defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is a trait here:
//! - [`Provider`] — the language model (text in, text out)
//! - [`Tool`] — a tool the agent can dispatch an [`Action`] to
//! - [`RuleStore`] — the persistent reasoning bank
//!
//! Implementations live in their own crates, so the loop can be tested with
//! scripted stand-ins and the bank can be swapped for a null object.

pub mod action;
pub mod error;
pub mod provider;
pub mod rule;
pub mod tool;
pub mod trajectory;

// Re-export key types at crate root for ergonomics
pub use action::Action;
pub use error::{Error, Result};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use rule::{Polarity, Rule, RuleCandidate, RuleStore};
pub use tool::{Observation, Tool, ToolRegistry};
pub use trajectory::{Judgment, RunMode, RunRecord, Step, TerminationReason, Trajectory};
