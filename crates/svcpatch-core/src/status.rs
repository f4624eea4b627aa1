use serde::Serialize;
use std::cell::RefCell;

/// One operator-facing progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Status {
    /// A new stage begins, e.g. "Patching Artifactory Configuration".
    Section(String),
    /// An external command is about to run.
    Exec(String),
    Done(String),
    /// A config key was set.
    Applied(String),
    Warn(String),
}

/// Receives progress events as the patch run unfolds.
pub trait StatusSink {
    fn emit(&self, status: Status);

    /// Whether stdout carries machine-readable output, so child processes
    /// that stream to the terminal must write to stderr instead.
    fn stdout_reserved(&self) -> bool {
        false
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<Status>>,
    stdout_reserved: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout_reserved() -> Self {
        Self {
            stdout_reserved: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Status> {
        self.events.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Status::Warn(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, status: Status) {
        self.events.borrow_mut().push(status);
    }

    fn stdout_reserved(&self) -> bool {
        self.stdout_reserved
    }
}
