use crate::error::{PatchError, Result};
use crate::paths;
use crate::runner::{run_checked, CommandRunner, CommandSpec};
use crate::status::{Status, StatusSink};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// How a service is made to reload its patched config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeployStrategy {
    /// Run the deploy script from its own directory; restart the container
    /// when the script is missing or not executable.
    Script { script: PathBuf },
    Restart,
}

/// What actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Redeploy {
    Script,
    RestartFallback,
    Restart,
}

impl RedeployStrategy {
    /// A deploy script that exists but fails is fatal; there is no restart after it.
    pub fn execute(
        &self,
        container: &str,
        runner: &dyn CommandRunner,
        sink: &dyn StatusSink,
    ) -> Result<Redeploy> {
        match self {
            RedeployStrategy::Restart => {
                restart_container(container, runner, sink)?;
                Ok(Redeploy::Restart)
            }
            RedeployStrategy::Script { script } if paths::is_executable(script) => {
                run_deploy_script(script, runner, sink)?;
                Ok(Redeploy::Script)
            }
            RedeployStrategy::Script { script } => {
                tracing::info!(script = %script.display(), "deploy script unavailable");
                sink.emit(Status::Warn(format!(
                    "Deploy script not found or not executable at: {}",
                    script.display()
                )));
                sink.emit(Status::Warn("Falling back to docker restart...".to_string()));
                restart_container(container, runner, sink)?;
                Ok(Redeploy::RestartFallback)
            }
        }
    }
}

fn restart_container(
    container: &str,
    runner: &dyn CommandRunner,
    sink: &dyn StatusSink,
) -> Result<()> {
    let spec = CommandSpec::new(paths::CONTAINER_RUNTIME).args(["restart", container]);
    run_checked(runner, &spec, "Restarting container", sink)?;
    Ok(())
}

fn run_deploy_script(script: &Path, runner: &dyn CommandRunner, sink: &dyn StatusSink) -> Result<()> {
    // The script sources env files next to itself.
    let dir = script.parent().unwrap_or(Path::new("."));
    let name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    sink.emit(Status::Exec(format!("./{name} ...")));
    let spec = CommandSpec::new(script.to_string_lossy().into_owned()).current_dir(dir);
    let spec = if sink.stdout_reserved() {
        spec.inherit_output_to_stderr()
    } else {
        spec.inherit_output()
    };
    let output = runner.run(&spec)?;
    if !output.success {
        return Err(PatchError::DeployFailed {
            script: script.to_path_buf(),
            code: output.code,
        });
    }
    sink.emit(Status::Done("Redeployed.".to_string()));
    Ok(())
}
