//! `tracebank rules` — inspect the reasoning bank.

use std::path::{Path, PathBuf};
use tracebank_bank::FileBank;
use tracebank_core::rule::{Rule, select_rules};
use tracebank_core::RuleStore;

pub async fn run(
    config_path: Option<&Path>,
    bank_path: Option<PathBuf>,
    tags: Vec<String>,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let path = bank_path.unwrap_or(config.bank.path);
    let bank = FileBank::new(&path);
    let rules = bank.rules().await?;

    println!("Reasoning bank: {} ({} rules)", path.display(), rules.len());
    if rules.is_empty() {
        return Ok(());
    }

    if tags.is_empty() {
        for rule in &rules {
            println!("  {}", describe(rule));
        }
        return Ok(());
    }

    // Ranking preview: same scoring as retrieval, without bumping use counts.
    let ranked = select_rules(&rules, &tags, None, limit);
    if ranked.is_empty() {
        println!("  No rules match tags: {}", tags.join(", "));
    }
    for (index, score) in ranked {
        println!("  score={score}  {}", describe(&rules[index]));
    }
    Ok(())
}

fn describe(rule: &Rule) -> String {
    format!(
        "{}  {:<7}  uses={:<3}  [{}]  {}",
        rule.id,
        rule.polarity,
        rule.use_count,
        rule.tags.join(", "),
        rule.title
    )
}
