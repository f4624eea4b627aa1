//! External command execution.
//!
//! Every side effect outside the config file goes through [`CommandRunner`]:
//! the privileged copy, `docker` calls, the deploy script and the admin CLI
//! inside the chat container. [`run_checked`] layers the fail-fast policy on
//! top: a non-zero exit becomes [`PatchError::CommandFailed`] and the caller
//! propagates it, so nothing after a failed command runs.

use crate::error::{PatchError, Result};
use crate::status::{Status, StatusSink};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Where a child's stdout/stderr go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Capture,
    /// Stream straight to the terminal; the captured output is empty.
    Inherit,
    /// Like `Inherit`, but the child's stdout is written to our stderr.
    InheritToStderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            output: OutputMode::Capture,
        }
    }

    /// Build from a configured argv such as `["sudo", "cp"]`.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(PatchError::EmptyCommand("argument vector is empty".into()));
        };
        if program.trim().is_empty() {
            return Err(PatchError::EmptyCommand(argv.join(" ")));
        }
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.output = OutputMode::Inherit;
        self
    }

    pub fn inherit_output_to_stderr(mut self) -> Self {
        self.output = OutputMode::InheritToStderr;
        self
    }

    /// Program and args joined with spaces, for logs and test assertions.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs a command to completion and reports how it went.
///
/// `Err` means the command could not be started at all. A command that ran and
/// exited non-zero is an `Ok` with `success == false`.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        tracing::debug!(command = %spec.display(), cwd = ?spec.cwd, "spawning");

        if spec.output == OutputMode::InheritToStderr {
            cmd.stdout(Stdio::from(std::io::stderr()));
        }
        let spawned = match spec.output {
            OutputMode::Capture => cmd.output(),
            OutputMode::Inherit | OutputMode::InheritToStderr => {
                cmd.status().map(|status| Output {
                    status,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                })
            }
        };
        let output: CommandOutput = spawned
            .map_err(|source| PatchError::Spawn {
                program: spec.program.clone(),
                source,
            })?
            .into();

        tracing::debug!(command = %spec.display(), code = ?output.code, "finished");
        Ok(output)
    }
}

/// Run `spec` under the fail-fast policy and return its trimmed stdout.
pub fn run_checked(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
    description: &str,
    sink: &dyn StatusSink,
) -> Result<String> {
    sink.emit(Status::Exec(format!("{description}...")));
    let output = runner.run(spec)?;
    if !output.success {
        tracing::warn!(command = %spec.display(), code = ?output.code, "command failed");
        return Err(PatchError::CommandFailed {
            description: description.to_string(),
            stderr: output.stderr.trim().to_string(),
        });
    }
    sink.emit(Status::Done("Success.".to_string()));
    Ok(output.stdout.trim().to_string())
}

/// Locate `program` on `PATH`.
pub fn require_tool(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| PatchError::ToolNotFound(program.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MemorySink;

    #[test]
    fn spec_builder_and_display() {
        let spec = CommandSpec::new("docker")
            .args(["exec", "-i"])
            .arg("mattermost")
            .current_dir("/tmp");
        assert_eq!(spec.display(), "docker exec -i mattermost");
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/tmp")));
        assert_eq!(spec.output, OutputMode::Capture);
    }

    #[test]
    fn from_argv_rejects_empty() {
        assert!(CommandSpec::from_argv(&[]).is_err());
        assert!(CommandSpec::from_argv(&[" ".to_string()]).is_err());
        let spec = CommandSpec::from_argv(&["sudo".to_string(), "cp".to_string()]).unwrap();
        assert_eq!(spec.program, "sudo");
        assert_eq!(spec.args, vec!["cp"]);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_stdout() {
        let out = SystemRunner
            .run(&CommandSpec::new("echo").arg("hello"))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_code_and_stderr() {
        let out = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr.trim(), "boom");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_honors_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = SystemRunner
            .run(&CommandSpec::new("pwd").current_dir(dir.path()))
            .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(out.stdout.trim()).canonicalize().unwrap(), expected);
    }

    #[test]
    fn spawn_failure_names_program() {
        let err = SystemRunner
            .run(&CommandSpec::new("__nonexistent_command_xyz__"))
            .unwrap_err();
        assert!(err.to_string().contains("__nonexistent_command_xyz__"));
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_trims_stdout() {
        let sink = MemorySink::new();
        let out = run_checked(
            &SystemRunner,
            &CommandSpec::new("printf").arg("  value \n"),
            "Printing",
            &sink,
        )
        .unwrap();
        assert_eq!(out, "value");
        assert_eq!(
            sink.events(),
            vec![
                Status::Exec("Printing...".to_string()),
                Status::Done("Success.".to_string())
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_fails_fast_with_stderr() {
        let sink = MemorySink::new();
        let err = run_checked(
            &SystemRunner,
            &CommandSpec::new("sh").args(["-c", "echo 'permission denied' >&2; exit 1"]),
            "Overwriting system.yaml",
            &sink,
        )
        .unwrap_err();
        match err {
            PatchError::CommandFailed {
                description,
                stderr,
            } => {
                assert_eq!(description, "Overwriting system.yaml");
                assert_eq!(stderr, "permission denied");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
        assert!(!sink.events().contains(&Status::Done("Success.".to_string())));
    }

    #[test]
    fn require_tool_missing() {
        let err = require_tool("__nonexistent_command_xyz__").unwrap_err();
        assert!(matches!(err, PatchError::ToolNotFound(name) if name == "__nonexistent_command_xyz__"));
    }
}
