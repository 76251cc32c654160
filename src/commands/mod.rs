pub mod accidents;
pub mod dates;
pub mod etl;
pub mod inventory;
pub mod load;
pub mod status;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Error;
use chrono::{DateTime, Utc};
use tracing::error;

use crate::util::{now_utc_string, utc_compact_string};

/// Start time of one command run; names its run id and manifest.
pub(crate) struct RunStamp {
    started: DateTime<Utc>,
    started_at: String,
    clock: Instant,
}

impl RunStamp {
    pub(crate) fn start() -> Self {
        Self {
            started: Utc::now(),
            started_at: now_utc_string(),
            clock: Instant::now(),
        }
    }

    pub(crate) fn run_id(&self) -> String {
        format!("run-{}", utc_compact_string(self.started))
    }

    pub(crate) fn started_at(&self) -> String {
        self.started_at.clone()
    }

    pub(crate) fn elapsed_seconds(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    pub(crate) fn manifest_path(&self, data_root: &Path, command: &str) -> PathBuf {
        data_root.join("manifests").join(format!(
            "{command}_run_{}.json",
            utc_compact_string(self.started)
        ))
    }
}

/// Logs a per-document failure with its cause chain and keeps the run going.
pub(crate) fn log_document_error(facility_id: &str, path: &Path, err: &Error) {
    error!(facility_id, path = %path.display(), error = %err, "failed to process report");
    for cause in err.chain().skip(1) {
        error!(facility_id, cause = %cause, "caused by");
    }
}
