//! `tracebank batch` — answer every task in a task list.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracebank_agent::TaskSpec;
use tracebank_core::Judgment;
use tracing::info;

use super::AgentOptions;

/// One entry of the input task list.
#[derive(Debug, Deserialize)]
pub struct TaskEntry {
    pub question: String,
    #[serde(default)]
    pub file_name: String,
}

/// One entry of the answers file.
#[derive(Debug, Serialize)]
pub struct AnswerEntry {
    pub task_id: u64,
    pub question: String,
    pub file_name: String,
    pub answer: Option<String>,
    pub judgment: Judgment,
}

pub async fn run(
    config_path: Option<&Path>,
    options: AgentOptions,
    tasks_path: &Path,
    base_dir: PathBuf,
    run_id: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let agent = super::build_agent(&config, &options)?;
    let mode = agent.settings().mode;

    let content = std::fs::read_to_string(tasks_path)
        .map_err(|e| format!("Failed to read {}: {e}", tasks_path.display()))?;
    let tasks: Vec<TaskEntry> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {e}", tasks_path.display()))?;

    info!(count = tasks.len(), %mode, "Running batch");

    let mut answers = Vec::with_capacity(tasks.len());
    for (index, entry) in tasks.into_iter().enumerate() {
        let task_id = index as u64 + 1;
        let task = TaskSpec::new(task_id, entry.question.clone(), entry.file_name.clone())
            .with_run_id(run_id)
            .with_base_dir(&base_dir);

        let outcome = agent.run(&task).await?;
        println!(
            "[{task_id}] {} {}",
            outcome.judgment,
            outcome.final_answer.as_deref().unwrap_or("-")
        );

        answers.push(AnswerEntry {
            task_id,
            question: entry.question,
            file_name: entry.file_name,
            answer: outcome.final_answer,
            judgment: outcome.judgment,
        });
    }

    let output = output.unwrap_or_else(|| PathBuf::from(format!("answers_{mode}.json")));
    std::fs::write(&output, serde_json::to_string_pretty(&answers)?)?;
    println!("Saved {} answers to {}", answers.len(), output.display());
    Ok(())
}
