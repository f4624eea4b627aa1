use crate::error::{PatchError, Result};
use crate::file_patch::{ConfigPatcher, FilePatchReport};
use crate::paths;
use crate::remote::{RemoteOutcome, RemoteSettingsPatcher};
use crate::runner::{require_tool, CommandRunner};
use crate::settings::Settings;
use crate::status::StatusSink;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub file: FilePatchReport,
    pub remote: RemoteOutcome,
}

/// Check that the container runtime and the privileged copy helper are on `PATH`.
pub fn preflight(settings: &Settings) -> Result<()> {
    require_tool(paths::CONTAINER_RUNTIME)?;
    let copy = settings
        .artifactory
        .privileged_copy
        .first()
        .ok_or_else(|| PatchError::EmptyCommand("artifactory.privileged_copy".into()))?;
    require_tool(copy)?;
    Ok(())
}

/// Patch the config file, then the live settings. The first failure ends the run;
/// nothing already applied is rolled back.
pub fn run_all(
    settings: &Settings,
    runner: &dyn CommandRunner,
    sink: &dyn StatusSink,
) -> Result<RunSummary> {
    let file = ConfigPatcher::new(&settings.artifactory, runner, sink).run()?;
    let remote = RemoteSettingsPatcher::new(&settings.mattermost, runner, sink).run()?;
    Ok(RunSummary { file, remote })
}
