//! File-backed reasoning bank — one pretty-printed JSON array of rules.
//!
//! The whole collection is loaded on creation and rewritten (atomically) on
//! every mutation: `add_rule`, and `retrieve_rules` whenever it bumps a
//! `use_count`. There is no cross-process locking; one writer per file.
//!
//! Default location: `memory/bank.json` relative to the working directory.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracebank_core::error::BankError;
use tracebank_core::rule::{Polarity, Rule, RuleCandidate, RuleStore, select_rules};
use tracing::{debug, warn};

use crate::atomic::write_atomic;

const ID_PREFIX: &str = "rb_";

/// A reasoning bank persisted as a single JSON document.
pub struct FileBank {
    path: PathBuf,
    rules: Arc<RwLock<Vec<Rule>>>,
    /// Records that failed to parse as rules. Written back verbatim on every
    /// flush and still counted when issuing ids.
    held: Vec<Value>,
}

impl FileBank {
    /// Open the bank at `path`.
    ///
    /// A missing file starts an empty bank (created on first write). An
    /// unreadable or malformed file also starts empty; the file is left
    /// untouched until the next write replaces it. Individual records that
    /// do not parse are skipped with a warning but kept on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (rules, held) = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            count = rules.len(),
            skipped = held.len(),
            "Reasoning bank loaded"
        );
        Self {
            path,
            rules: Arc::new(RwLock::new(rules)),
            held,
        }
    }

    fn load_from_disk(path: &Path) -> (Vec<Rule>, Vec<Value>) {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Default::default(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Reasoning bank unreadable, starting empty"
                );
                return Default::default();
            }
        };

        let records = match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Reasoning bank is corrupt, starting empty"
                );
                return Default::default();
            }
        };

        let mut rules = Vec::with_capacity(records.len());
        let mut held = Vec::new();
        for record in records {
            match serde_json::from_value::<Rule>(record.clone()) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        id = record.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"),
                        error = %e,
                        "Skipping unreadable rule record"
                    );
                    held.push(record);
                }
            }
        }
        (rules, held)
    }

    fn id_number(id: &str) -> Option<u64> {
        id.strip_prefix(ID_PREFIX)?.parse::<u64>().ok()
    }

    /// Next id: highest numeric `rb_` suffix plus one, zero-padded to four
    /// digits. Held records count too, so their ids are never reissued.
    fn next_id(&self, rules: &[Rule]) -> String {
        let held_ids = self
            .held
            .iter()
            .filter_map(|record| record.get("id").and_then(Value::as_str));
        let next = rules
            .iter()
            .map(|r| r.id.as_str())
            .chain(held_ids)
            .filter_map(Self::id_number)
            .max()
            .map_or(1, |n| n + 1);
        format!("{ID_PREFIX}{next:04}")
    }

    /// Rewrite the whole collection to disk.
    fn flush(&self, rules: &[Rule]) -> Result<(), BankError> {
        let mut records = rules
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BankError::Encode(e.to_string()))?;
        records.extend(self.held.iter().cloned());

        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| BankError::Encode(e.to_string()))?;

        write_atomic(&self.path, content.as_bytes()).map_err(|e| {
            BankError::Storage(format!(
                "Failed to write reasoning bank {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl RuleStore for FileBank {
    fn name(&self) -> &str {
        "file"
    }

    async fn add_rule(&self, candidate: RuleCandidate) -> Result<Rule, BankError> {
        let mut rules = self.rules.write().await;
        let id = self.next_id(&rules);
        let rule = candidate.into_rule(id);

        rules.push(rule.clone());
        if let Err(e) = self.flush(&rules) {
            rules.pop();
            return Err(e);
        }

        debug!(id = %rule.id, polarity = %rule.polarity, tags = ?rule.tags, "Rule added");
        Ok(rule)
    }

    async fn retrieve_rules(
        &self,
        tags: &[String],
        polarity: Option<Polarity>,
        limit: usize,
    ) -> Result<Vec<Rule>, BankError> {
        let mut rules = self.rules.write().await;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let picked = select_rules(&rules, tags, polarity, limit);
        if picked.is_empty() {
            return Ok(Vec::new());
        }

        // Counts only change in memory once the new state is on disk.
        let mut updated = rules.clone();
        for (index, _) in &picked {
            updated[*index].use_count += 1;
        }
        self.flush(&updated)?;
        *rules = updated;

        debug!(count = picked.len(), ?tags, "Rules retrieved");
        Ok(picked.iter().map(|(index, _)| rules[*index].clone()).collect())
    }

    async fn rules(&self) -> Result<Vec<Rule>, BankError> {
        Ok(self.rules.read().await.clone())
    }

    async fn count(&self) -> Result<usize, BankError> {
        Ok(self.rules.read().await.len())
    }
}
