//! End-of-run summary document (`download_summary_<stamp>.json`).

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::error::SweepError;
use crate::range::RefRange;
use crate::run::{RunStatistics, Termination};

/// Everything an operator needs to understand a finished (or halted) run.
/// Cookie values are never included, only their names.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub range: RefRange,
    pub statistics: RunStatistics,
    pub termination: Termination,
    pub elapsed_seconds: f64,
    pub log_path: PathBuf,
    pub download_dir: PathBuf,
    pub cookie_names: Vec<String>,
    pub config: SweepConfig,
}

impl RunSummary {
    pub fn file_name(stamp: &str) -> String {
        format!("download_summary_{}.json", stamp)
    }

    /// Write pretty JSON into `dir`; returns the written path.
    pub fn write(&self, dir: &Path, stamp: &str) -> Result<PathBuf, SweepError> {
        let path = dir.join(Self::file_name(stamp));
        let json = serde_json::to_string_pretty(self).map_err(|e| SweepError::Summary {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| SweepError::Summary {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "summary written");
        Ok(path)
    }
}
