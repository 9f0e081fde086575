//! No-op reasoning bank — baseline runs keep no rules.

use async_trait::async_trait;
use tracebank_core::error::BankError;
use tracebank_core::rule::{Polarity, Rule, RuleCandidate, RuleStore};

/// A bank that stores nothing and retrieves nothing.
pub struct NoopBank;

#[async_trait]
impl RuleStore for NoopBank {
    fn name(&self) -> &str { "none" }

    async fn add_rule(&self, candidate: RuleCandidate) -> Result<Rule, BankError> {
        Ok(candidate.into_rule(String::new()))
    }

    async fn retrieve_rules(
        &self,
        _tags: &[String],
        _polarity: Option<Polarity>,
        _limit: usize,
    ) -> Result<Vec<Rule>, BankError> {
        Ok(Vec::new())
    }

    async fn rules(&self) -> Result<Vec<Rule>, BankError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, BankError> {
        Ok(0)
    }
}
