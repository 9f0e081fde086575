pub mod batch;
pub mod init;
pub mod rules;
pub mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracebank_agent::{AgentLoop, LoopSettings};
use tracebank_bank::{FileBank, NoopBank, TrajectoryLog};
use tracebank_config::AppConfig;
use tracebank_core::{RuleStore, RunMode};

/// Command-line overrides shared by `run` and `batch`.
pub struct AgentOptions {
    pub mode: Option<RunMode>,
    pub mock: bool,
    pub bank_path: Option<PathBuf>,
}

/// Load the config from `path` if given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let mut config =
                AppConfig::load_from(path).map_err(|e| format!("Failed to load config: {e}"))?;
            config.apply_env();
            config
        }
        None => AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?,
    };
    Ok(config)
}

/// Wire provider, tools, bank and trajectory log into an agent loop.
pub fn build_agent(
    config: &AppConfig,
    options: &AgentOptions,
) -> Result<AgentLoop, Box<dyn std::error::Error>> {
    let mut settings = LoopSettings::from_config(config);
    if let Some(mode) = options.mode {
        settings.mode = mode;
    }

    let provider = tracebank_providers::build_from_config(config, settings.mode, options.mock)?;
    let model = tracebank_providers::model_for(config);
    let tools = Arc::new(tracebank_tools::default_registry(config.tools.python.clone()));

    let bank: Arc<dyn RuleStore> = match settings.mode {
        RunMode::Baseline => Arc::new(NoopBank),
        RunMode::Enhanced => {
            let path = options.bank_path.clone().unwrap_or_else(|| config.bank.path.clone());
            Arc::new(FileBank::new(path))
        }
    };

    Ok(AgentLoop::new(provider, model, tools, TrajectoryLog::new(&config.runs.dir))
        .with_settings(settings)
        .with_bank(bank))
}
