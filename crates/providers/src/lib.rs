//! Language model providers for tracebank.
//!
//! All providers implement the `tracebank_core::Provider` trait.
//! [`build_from_config`] picks one based on configuration.

pub mod mock;
pub mod openai_compat;
pub mod router;

pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, model_for};
