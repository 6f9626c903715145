//! Artifact persistence.
//!
//! Payloads are written to a temp file inside the artifact directory, synced,
//! then atomically renamed to `<id>.pdf`. A failed write never leaves a
//! partial artifact behind: the temp file is removed when it is dropped.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::SweepError;
use crate::retry::{classify_io, run_with_retry, RetryPolicy};
use crate::template::artifact_filename;

/// Temp file prefix used before atomic rename.
pub const TEMP_PREFIX: &str = ".docsweep-";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    policy: RetryPolicy,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }

    /// Create the artifact directory (and parents) if missing.
    pub fn ensure_dir(&self) -> Result<(), SweepError> {
        fs::create_dir_all(&self.dir).map_err(|e| SweepError::setup(&self.dir, e))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path for a reference id.
    pub fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(artifact_filename(id))
    }

    /// Write `data` as the artifact for `id`, retrying transient disk errors.
    /// An existing artifact for the same id is replaced.
    pub fn persist(&self, id: u64, data: &[u8]) -> Result<PathBuf, SweepError> {
        let final_path = self.path_for(id);
        run_with_retry(
            &self.policy,
            classify_io,
            std::thread::sleep,
            || write_atomic(&self.dir, &final_path, data),
        )
        .map_err(|source| {
            tracing::error!(id, path = %final_path.display(), "artifact write failed: {}", source);
            SweepError::Persistence {
                what: final_path.display().to_string(),
                url: None,
                source,
            }
        })?;
        Ok(final_path)
    }
}

fn write_atomic(dir: &Path, final_path: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(final_path).map_err(|e| e.error)?;
    Ok(())
}
