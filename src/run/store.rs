// src/run/store.rs

//! The completion store: the durable, run-scoped record of task outcomes.
//!
//! Append semantics at the API level, file-rewrite semantics at the storage
//! level: after every outcome the full in-memory list is re-serialized and
//! written out, then flushed and synced, so the monitor process never sees a
//! partially appended record.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::run::outcome::TaskOutcome;
use crate::types::{RunId, TaskStatus};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    outcome: Vec<TaskOutcome>,
}

/// Run-scoped outcome store under the flow log directory.
///
/// File name: `completed_tasks___<signature>_<run-id>.toml`, where the
/// signature encodes the requested execution range. Prior runs of the same
/// signature leave their own files behind; the newest one supplies the
/// "already succeeded" set for skip logic.
#[derive(Debug)]
pub struct CompletionStore {
    path: PathBuf,
    log_dir: PathBuf,
    signature: String,
    outcomes: Vec<TaskOutcome>,
}

impl CompletionStore {
    /// Open the store for a new run, creating the log directory and the
    /// (empty) run file so the monitor has something to watch from t=0.
    pub fn open(log_dir: &Path, signature: &str, run_id: RunId) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("creating flow log directory {:?}", log_dir))?;

        let path = log_dir.join(format!("completed_tasks___{signature}_{run_id}.toml"));
        let store = Self {
            path,
            log_dir: log_dir.to_path_buf(),
            signature: signature.to_string(),
            outcomes: Vec::new(),
        };
        store.persist()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// Names recorded `Success` by the most recent previous run of this
    /// signature. A missing or malformed prior file means an empty set, not
    /// an error.
    pub fn previous_successes(&self) -> HashSet<String> {
        self.latest_previous_file()
            .map(|path| {
                load_outcomes(&path)
                    .into_iter()
                    .filter(|o| o.status == TaskStatus::Success)
                    .map(|o| o.name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Outcomes of the most recent previous run of this signature, for the
    /// pre-run summary.
    pub fn previous_outcomes(&self) -> Vec<TaskOutcome> {
        self.latest_previous_file()
            .map(|path| load_outcomes(&path))
            .unwrap_or_default()
    }

    /// Forget prior-attempt memory for this signature: remove previous run
    /// files so nothing is skipped and the previous-run summary is empty.
    pub fn clear_previous(&self) {
        for path in self.previous_files() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(?path, error = %e, "could not remove prior completion file");
            } else {
                info!(?path, "cleared prior completion file (force)");
            }
        }
    }

    /// Record one outcome and rewrite the run file.
    ///
    /// Outcomes are immutable once recorded; if the same task name shows up
    /// again (it should not, the retry layer only surfaces final attempts),
    /// the newer record replaces the older one rather than duplicating it.
    pub fn append(&mut self, outcome: TaskOutcome) -> Result<()> {
        self.outcomes.retain(|o| o.name != outcome.name);
        self.outcomes.push(outcome);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let body = toml::to_string(&StoreFile {
            outcome: self.outcomes.clone(),
        })
        .map_err(anyhow::Error::from)?;

        let mut file = File::create(&self.path)
            .with_context(|| format!("creating completion file {:?}", self.path))?;
        file.write_all(body.as_bytes())
            .with_context(|| format!("writing completion file {:?}", self.path))?;
        file.flush()?;
        // The monitor polls this file from another process; make the write
        // visible before the next scheduling step.
        file.sync_all()?;

        debug!(path = ?self.path, records = self.outcomes.len(), "completion store persisted");
        Ok(())
    }

    fn previous_files(&self) -> Vec<PathBuf> {
        let prefix = format!("completed_tasks___{}_", self.signature);
        let Ok(entries) = fs::read_dir(&self.log_dir) else {
            return Vec::new();
        };

        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p != &self.path
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".toml"))
            })
            .collect()
    }

    fn latest_previous_file(&self) -> Option<PathBuf> {
        self.previous_files().into_iter().max_by_key(|p| {
            fs::metadata(p)
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        })
    }
}

/// Tolerant reader shared with the monitor: a missing or malformed file is
/// "no data yet", never an error.
pub fn load_outcomes(path: &Path) -> Vec<TaskOutcome> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Vec::new();
    };
    match toml::from_str::<StoreFile>(&contents) {
        Ok(store) => store.outcome,
        Err(e) => {
            debug!(?path, error = %e, "completion file unreadable; treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::outcome::now_stamp;

    fn outcome(name: &str, status: TaskStatus) -> TaskOutcome {
        TaskOutcome {
            name: name.to_string(),
            start_time: now_stamp(),
            end_time: now_stamp(),
            runtime: "00:00:00:01".to_string(),
            status,
        }
    }

    #[test]
    fn append_rewrites_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CompletionStore::open(dir.path(), "full_run", RunId(100)).unwrap();

        store.append(outcome("A", TaskStatus::Success)).unwrap();
        store.append(outcome("B", TaskStatus::Failed)).unwrap();

        let read_back = load_outcomes(store.path());
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].name, "A");
        assert_eq!(read_back[1].status, TaskStatus::Failed);
    }

    #[test]
    fn previous_successes_come_from_latest_prior_run() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = CompletionStore::open(dir.path(), "full_run", RunId(100)).unwrap();
        first.append(outcome("A", TaskStatus::Success)).unwrap();
        first.append(outcome("B", TaskStatus::Failed)).unwrap();
        drop(first);

        let store = CompletionStore::open(dir.path(), "full_run", RunId(200)).unwrap();
        let successes = store.previous_successes();
        assert!(successes.contains("A"));
        assert!(!successes.contains("B"));
    }

    #[test]
    fn different_signature_is_not_visible() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = CompletionStore::open(dir.path(), "only_syn", RunId(100)).unwrap();
        first.append(outcome("syn", TaskStatus::Success)).unwrap();
        drop(first);

        let store = CompletionStore::open(dir.path(), "full_run", RunId(200)).unwrap();
        assert!(store.previous_successes().is_empty());
    }

    #[test]
    fn clear_previous_discards_prior_memory() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = CompletionStore::open(dir.path(), "full_run", RunId(100)).unwrap();
        first.append(outcome("A", TaskStatus::Success)).unwrap();
        drop(first);

        let store = CompletionStore::open(dir.path(), "full_run", RunId(200)).unwrap();
        store.clear_previous();
        assert!(store.previous_successes().is_empty());
    }

    #[test]
    fn malformed_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed_tasks___full_run_1.toml");
        fs::write(&path, "not [valid toml").unwrap();
        assert!(load_outcomes(&path).is_empty());
    }

    #[test]
    fn replaces_record_for_same_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CompletionStore::open(dir.path(), "full_run", RunId(1)).unwrap();

        store.append(outcome("A", TaskStatus::Failed)).unwrap();
        store.append(outcome("A", TaskStatus::Success)).unwrap();

        let read_back = load_outcomes(store.path());
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].status, TaskStatus::Success);
    }
}
