// src/run/history.rs

//! Append-only runtime history shared across runs of the same flow/range.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;
use crate::run::outcome::TaskOutcome;

const HEADER: &str = "Task Name            Start (YY/MM/DD HH:MM:SS)      End (YY/MM/DD HH:MM:SS)        Runtime (DD:HH:MM:SS) Status\n";

/// Human-readable log, one entry per run: the resolved execution order
/// followed by one line per task outcome. Never truncated automatically.
#[derive(Debug)]
pub struct RuntimeHistory {
    path: PathBuf,
}

impl RuntimeHistory {
    pub fn new(log_dir: &Path, signature: &str) -> Self {
        Self {
            path: log_dir.join(format!("runtime_history___{signature}.log")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one run's entry, writing the column header when the file is
    /// new or empty.
    pub fn append_run(&self, order: &[String], outcomes: &[TaskOutcome]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating flow log directory {:?}", parent))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening runtime history {:?}", self.path))?;

        let is_empty = file
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut entry = String::new();
        if is_empty {
            entry.push_str(HEADER);
            entry.push_str(&format!("{}\n", "-".repeat(120)));
        }

        entry.push_str(&format!("Execution order : {}\n", order.join(", ")));
        entry.push_str(&format!("{}\n", "-".repeat(120)));
        for outcome in outcomes {
            entry.push_str(&format!(
                "{:<20} {:<30} {:<30} {:<20} {:<10}\n",
                outcome.name,
                outcome.start_time,
                outcome.end_time,
                outcome.runtime,
                outcome.status.to_string()
            ));
        }
        entry.push_str(&format!("{}\n", "-".repeat(120)));

        file.write_all(entry.as_bytes())
            .with_context(|| format!("appending to runtime history {:?}", self.path))?;
        Ok(())
    }
}
