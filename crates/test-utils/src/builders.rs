#![allow(dead_code)]

use flowdag::config::{FlowFile, RunDefaults, TaskSpec};

/// Builder for `FlowFile` to simplify test setup.
pub struct FlowFileBuilder {
    flow: FlowFile,
}

impl FlowFileBuilder {
    pub fn new() -> Self {
        Self {
            flow: FlowFile {
                config: RunDefaults::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.flow.task.push(task);
        self
    }

    pub fn with_log_dir(mut self, dir: &str) -> Self {
        self.flow.config.log_dir = dir.to_string();
        self
    }

    pub fn with_scratch_dir(mut self, dir: &str) -> Self {
        self.flow.config.scratch_dir = Some(dir.to_string());
        self
    }

    pub fn build(self) -> FlowFile {
        self.flow
    }
}

impl Default for FlowFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskSpec`.
pub struct TaskSpecBuilder {
    task: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: TaskSpec {
                name: name.to_string(),
                command: Some(format!("echo {name}")),
                priority: 0,
                depends_on: vec![],
                any_of: vec![],
                tasks: vec![],
            },
        }
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.task.command = Some(cmd.to_string());
        self
    }

    pub fn no_command(mut self) -> Self {
        self.task.command = None;
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.task.depends_on.push(dep.to_string());
        self
    }

    pub fn any_of(mut self, dep: &str) -> Self {
        self.task.any_of.push(dep.to_string());
        self
    }

    pub fn child(mut self, child: &str) -> Self {
        self.task.tasks.push(child.to_string());
        self.task.command = None;
        self
    }

    pub fn build(self) -> TaskSpec {
        self.task
    }
}
