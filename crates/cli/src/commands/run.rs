//! `tracebank run` — answer a single question.

use std::path::Path;
use tracebank_agent::TaskSpec;

use super::AgentOptions;

pub async fn run(
    config_path: Option<&Path>,
    options: AgentOptions,
    task: TaskSpec,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let agent = super::build_agent(&config, &options)?;

    let outcome = agent.run(&task).await?;

    println!("final_answer: {}", outcome.final_answer.as_deref().unwrap_or(""));
    println!("judgment: {}", outcome.judgment);
    println!("trajectory: {}", outcome.artifact.display());
    Ok(())
}
