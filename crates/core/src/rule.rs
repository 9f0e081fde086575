//! Reasoning rules — distilled, tag-indexed strategy advice.
//!
//! Rules are produced by reflection, persisted by a [`RuleStore`], and
//! retrieved by tag overlap to be injected into later prompts. They are
//! never deleted; the only mutation after creation is `use_count`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use crate::error::BankError;

/// Whether a rule was distilled from an apparently successful or failed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Success,
    Failure,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.pad("success"),
            Self::Failure => f.pad("failure"),
        }
    }
}

/// A stored rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// `rb_NNNN`, strictly increasing across the bank's lifetime
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Ordered advice lines
    #[serde(default)]
    pub content: Vec<String>,

    /// Matched case-insensitively
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub polarity: Polarity,

    /// References back to the trajectories the rule came from
    #[serde(default)]
    pub evidence: Vec<String>,

    #[serde(default)]
    pub use_count: u64,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Rule {
    /// Lowercased tag set used for overlap scoring.
    pub fn tag_set(&self) -> HashSet<String> {
        self.tags.iter().map(|t| t.to_lowercase()).collect()
    }
}

/// A rule before the bank has assigned its identity.
///
/// `id`, `use_count` and `created_at` are filled in on insertion when
/// absent; `evidence` accepts any JSON and is normalized to a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub evidence: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RuleCandidate {
    pub fn new(title: impl Into<String>, polarity: Polarity) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            content: Vec::new(),
            tags: Vec::new(),
            polarity,
            evidence: Value::Null,
            use_count: None,
            created_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content(mut self, content: Vec<String>) -> Self {
        self.content = content;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = evidence;
        self
    }

    /// Finish the candidate, using `assigned_id` only if it carries no id.
    pub fn into_rule(self, assigned_id: String) -> Rule {
        Rule {
            id: self.id.unwrap_or(assigned_id),
            title: self.title,
            description: self.description,
            content: self.content,
            tags: self.tags,
            polarity: self.polarity,
            evidence: normalize_evidence(self.evidence),
            use_count: self.use_count.unwrap_or(0),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// A single string becomes a one-element list, a list is kept in order,
/// anything else becomes empty.
pub fn normalize_evidence(evidence: Value) -> Vec<String> {
    match evidence {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Rank `rules` against `query_tags` and pick at most `limit`.
///
/// Returns `(index, score)` pairs in selection order. Scores are the size of
/// the case-insensitive tag intersection; ties keep insertion order. A rule
/// scoring 0 only qualifies when the query has no tags at all.
pub fn select_rules(
    rules: &[Rule],
    query_tags: &[String],
    polarity: Option<Polarity>,
    limit: usize,
) -> Vec<(usize, usize)> {
    let query: HashSet<String> = query_tags.iter().map(|t| t.to_lowercase()).collect();

    let mut scored: Vec<(usize, usize)> = rules
        .iter()
        .enumerate()
        .filter(|(_, r)| polarity.is_none_or(|p| r.polarity == p))
        .map(|(i, r)| (i, r.tag_set().intersection(&query).count()))
        .collect();

    // stable: equal scores stay in insertion order
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .filter(|(_, score)| *score > 0 || query.is_empty())
        .take(limit)
        .collect()
}

/// The reasoning bank abstraction.
///
/// Implementations: file-backed JSON document, no-op (baseline mode).
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// The backend name (e.g., "file", "none").
    fn name(&self) -> &str;

    /// Insert a candidate, assigning identity, and persist before returning.
    async fn add_rule(&self, candidate: RuleCandidate) -> std::result::Result<Rule, BankError>;

    /// Rank by tag overlap, bump `use_count` on every returned rule, persist.
    async fn retrieve_rules(
        &self,
        tags: &[String],
        polarity: Option<Polarity>,
        limit: usize,
    ) -> std::result::Result<Vec<Rule>, BankError>;

    /// Snapshot of every stored rule in insertion order.
    async fn rules(&self) -> std::result::Result<Vec<Rule>, BankError>;

    /// Number of stored rules.
    async fn count(&self) -> std::result::Result<usize, BankError>;
}
