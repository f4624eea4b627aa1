//! Test doubles for the command boundary.

use crate::error::Result;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use std::cell::RefCell;
use std::path::Path;

type Matcher = Box<dyn Fn(&CommandSpec) -> bool>;

/// Records every command and answers from scripted responses.
///
/// Unmatched commands succeed with empty stdout. With `copy_files()`, a `cp`
/// invocation (directly or behind a privilege helper) really copies its last
/// two arguments so file swaps can be observed on disk.
pub(crate) struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    rules: Vec<(Matcher, CommandOutput)>,
    copy_files: bool,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            rules: Vec::new(),
            copy_files: false,
        }
    }

    /// Reply with `output` to any command whose display string contains `needle`.
    pub(crate) fn respond(mut self, needle: &str, output: CommandOutput) -> Self {
        let needle = needle.to_string();
        let matcher: Matcher = Box::new(move |spec: &CommandSpec| spec.display().contains(&needle));
        self.rules.push((matcher, output));
        self
    }

    pub(crate) fn copy_files(mut self) -> Self {
        self.copy_files = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());

        let output = self
            .rules
            .iter()
            .find(|(matches, _)| matches(spec))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));

        let is_copy = spec.program == "cp" || spec.args.first().is_some_and(|a| a == "cp");
        if self.copy_files && is_copy && output.success {
            if let [.., from, to] = spec.args.as_slice() {
                std::fs::copy(Path::new(from), Path::new(to))?;
            }
        }
        Ok(output)
    }
}
