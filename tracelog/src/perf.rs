//! Scoped run-metadata timer.
//!
//! A [`PerfTimer`] brackets one timed operation: it opens the metadata file
//! up front (so a creation failure surfaces before any work is done) and
//! appends one block on drop with the wall-clock date, the elapsed time,
//! and the filter stages that were built during the run.

use crate::error::{Result, TraceError};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;
use tracing::error;

/// Where run metadata accumulates, one block per timed operation.
pub const METADATA_FILE: &str = "performance/run_metadata.txt";

/// Stage descriptions registered since process start. Appended to by stage
/// constructors and drained never; each timer writes the full list.
static STAGES: LazyLock<Mutex<Vec<String>>> = LazyLock::new(|| Mutex::new(Vec::new()));

pub(crate) fn record_stage(description: String) {
    STAGES.lock().push(description);
}

/// Snapshot of the stage descriptions recorded so far.
pub fn recorded_stages() -> Vec<String> {
    STAGES.lock().clone()
}

/// Measures one operation from construction to drop.
#[derive(Debug)]
pub struct PerfTimer {
    file: File,
    started: Instant,
}

impl PerfTimer {
    /// Starts a timer backed by the fixed [`METADATA_FILE`].
    pub fn start() -> Result<PerfTimer> {
        Self::with_path(Path::new(METADATA_FILE))
    }

    /// Starts a timer backed by an explicit metadata path.
    pub fn with_path(path: &Path) -> Result<PerfTimer> {
        let map_err = |source: std::io::Error| TraceError::FileCreate {
            path: PathBuf::from(path),
            source,
        };

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(map_err)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(map_err)?;

        Ok(PerfTimer {
            file,
            started: Instant::now(),
        })
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed().as_secs();
        let minutes = elapsed / 60;
        let seconds = elapsed % 60;
        let now = chrono::Local::now();

        let mut block = format!("Date: {}\n", now.format("%H:%M:%S %d/%m/%Y"));
        if minutes > 0 {
            block.push_str(&format!("Duration: {minutes} minutes and {seconds} seconds\n"));
        } else {
            block.push_str(&format!("Duration: {seconds} seconds\n"));
        }
        block.push_str("Stages:\n");
        for stage in STAGES.lock().iter() {
            block.push_str(stage);
            block.push('\n');
        }
        block.push_str("------------------------------------------\n");

        // Drop cannot propagate; a metadata write failure must not take
        // down a finished run.
        if let Err(e) = self.file.write_all(block.as_bytes()) {
            error!("failed to append run metadata: {e}");
        }
    }
}
