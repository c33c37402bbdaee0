// src/config/model.rs

use serde::Deserialize;

/// Top-level flow definition as read from a TOML file.
///
/// ```toml
/// [config]
/// log_dir = "flow_log"
///
/// [[task]]
/// name = "syn"
/// command = "make syn"
/// depends_on = ["setup"]
///
/// [[task]]
/// name = "sta"
/// command = "make sta"
/// any_of = ["syn", "syn_inc"]
/// priority = 1
/// ```
///
/// Tasks are an *ordered* array: declared order drives range slicing, group
/// expansion and priority tie-breaking.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowFile {
    /// Run defaults from `[config]`.
    #[serde(default)]
    pub config: RunDefaults,

    /// All tasks from `[[task]]`, in declared order.
    #[serde(default)]
    pub task: Vec<TaskSpec>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunDefaults {
    /// Directory for completion and runtime-history files.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Directory for per-attempt status/PID files and supervision scripts.
    ///
    /// If `None`, the system temp directory is used.
    #[serde(default)]
    pub scratch_dir: Option<String>,
}

fn default_log_dir() -> String {
    "flow_log".to_string()
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            scratch_dir: None,
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    /// Unique task name.
    pub name: String,

    /// Command line to execute.
    ///
    /// Tasks without a command are no-ops that still participate in the
    /// graph (group nodes or ordering anchors); they resolve to `Skipped`.
    #[serde(default)]
    pub command: Option<String>,

    /// Scheduling priority; lower runs earlier among otherwise-unordered
    /// tasks.
    #[serde(default)]
    pub priority: i64,

    /// "All-of" dependencies: every listed task must complete first.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// "Any-of" dependencies: eligible once any one listed task completes.
    #[serde(default)]
    pub any_of: Vec<String>,

    /// Child task names. A task with children is a pure grouping node; its
    /// children inherit an edge on it and are spliced in its place during
    /// expansion.
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl TaskSpec {
    /// True for grouping nodes.
    pub fn is_group(&self) -> bool {
        !self.tasks.is_empty()
    }
}
