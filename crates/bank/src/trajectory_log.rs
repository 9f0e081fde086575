//! Trajectory artifacts — one JSON document per (task, run) pair.
//!
//! Layout: `<dir>/<task_id>/<mode>_<run_id>.json`.

use std::path::{Path, PathBuf};
use tracebank_core::trajectory::{RunMode, RunRecord};
use tracing::debug;

use crate::atomic::write_atomic;

/// Writes run records under a root directory.
#[derive(Debug, Clone)]
pub struct TrajectoryLog {
    dir: PathBuf,
}

impl TrajectoryLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, task_id: u64, mode: RunMode, run_id: u64) -> PathBuf {
        self.dir
            .join(task_id.to_string())
            .join(format!("{mode}_{run_id}.json"))
    }

    /// Persist `record`, replacing any previous artifact for the same run.
    pub fn save(&self, record: &RunRecord) -> tracebank_core::Result<PathBuf> {
        let path = self.path_for(record.task_id, record.mode, record.run_id);
        let content = serde_json::to_string_pretty(record)?;
        write_atomic(&path, content.as_bytes())?;
        debug!(path = %path.display(), judgment = ?record.judgment, "Trajectory saved");
        Ok(path)
    }

    pub fn load(path: &Path) -> tracebank_core::Result<RunRecord> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
