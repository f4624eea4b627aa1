//! Patch a protected YAML config file and make its service reload it.
//!
//! The document is rewritten through a scratch file that a privileged helper
//! copies over the original, so the real file is never left half-written.

use crate::document::{ConfigDocument, PatchOperation};
use crate::error::Result;
use crate::redeploy::Redeploy;
use crate::runner::{run_checked, CommandRunner, CommandSpec};
use crate::settings::FilePatchSettings;
use crate::status::{Status, StatusSink};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePatchReport {
    pub config_file: PathBuf,
    /// Paths whose value changed in this run.
    pub changed: Vec<String>,
    /// Paths that already held the target value.
    pub unchanged: Vec<String>,
    pub redeploy: Redeploy,
}

pub struct ConfigPatcher<'a> {
    settings: &'a FilePatchSettings,
    runner: &'a dyn CommandRunner,
    sink: &'a dyn StatusSink,
}

impl<'a> ConfigPatcher<'a> {
    pub fn new(
        settings: &'a FilePatchSettings,
        runner: &'a dyn CommandRunner,
        sink: &'a dyn StatusSink,
    ) -> Self {
        Self {
            settings,
            runner,
            sink,
        }
    }

    pub fn run(&self) -> Result<FilePatchReport> {
        let config_file = &self.settings.config_file;
        self.sink.emit(Status::Section(format!(
            "Patching {} configuration ({})",
            self.settings.service_key,
            config_file.display()
        )));

        let mut doc = ConfigDocument::load(config_file)?;
        let (changed, unchanged) = self.apply_patches(&mut doc)?;
        self.write_back(&doc)?;

        self.sink.emit(Status::Section(format!(
            "Redeploying {}",
            self.settings.service_key
        )));
        let redeploy = self.settings.redeploy_strategy().execute(
            &self.settings.container,
            self.runner,
            self.sink,
        )?;

        Ok(FilePatchReport {
            config_file: config_file.clone(),
            changed,
            unchanged,
            redeploy,
        })
    }

    fn apply_patches(&self, doc: &mut ConfigDocument) -> Result<(Vec<String>, Vec<String>)> {
        let mut changed = Vec::new();
        let mut unchanged = Vec::new();
        for path in self.settings.metric_paths() {
            let op = PatchOperation::enable(&path)?;
            if doc.apply(&op)? {
                tracing::info!(path = %path, "patched");
                changed.push(path.clone());
            } else {
                unchanged.push(path.clone());
            }
            self.sink.emit(Status::Applied(format!("Set {path} = true")));
        }
        Ok((changed, unchanged))
    }

    /// Scratch-then-swap: serialize to the scratch file, copy it over the
    /// protected file with the privileged helper, then drop the scratch file.
    fn write_back(&self, doc: &ConfigDocument) -> Result<()> {
        let scratch = &self.settings.scratch_file;
        let target = &self.settings.config_file;
        std::fs::write(scratch, doc.to_yaml_string()?)?;

        let copy = CommandSpec::from_argv(&self.settings.privileged_copy)?
            .path_arg(scratch)
            .path_arg(target);
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());
        let description = format!("Overwriting {file_name} ({})", copy.program);

        if let Err(e) = run_checked(self.runner, &copy, &description, self.sink) {
            let _ = std::fs::remove_file(scratch);
            return Err(e);
        }
        std::fs::remove_file(scratch)?;
        self.sink.emit(Status::Done(format!("Patched {file_name}")));
        Ok(())
    }
}
