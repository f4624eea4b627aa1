//! Live settings applied through a service's admin CLI inside its container.
//!
//! ```text
//! NotChecked ──probe──▶ SkippedNotRunning
//!      │
//!      └──▶ Reachable ─▶ Setting[k1] ─▶ … ─▶ Setting[kn] ─▶ Reloaded
//! ```
//!
//! Any failing `set`/`reload` aborts the whole run with the command's error.

use crate::error::Result;
use crate::paths;
use crate::runner::{run_checked, CommandRunner, CommandSpec};
use crate::settings::RemoteSettingsConfig;
use crate::status::{Status, StatusSink};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSetting {
    pub key: String,
    pub value: String,
}

impl RemoteSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RemoteOutcome {
    SkippedNotRunning { container: String },
    Reloaded { container: String, applied: Vec<String> },
}

pub struct RemoteSettingsPatcher<'a> {
    config: &'a RemoteSettingsConfig,
    runner: &'a dyn CommandRunner,
    sink: &'a dyn StatusSink,
}

impl<'a> RemoteSettingsPatcher<'a> {
    pub fn new(
        config: &'a RemoteSettingsConfig,
        runner: &'a dyn CommandRunner,
        sink: &'a dyn StatusSink,
    ) -> Self {
        Self {
            config,
            runner,
            sink,
        }
    }

    pub fn run(&self) -> Result<RemoteOutcome> {
        let container = &self.config.container;
        self.sink.emit(Status::Section(format!(
            "Patching {container} configuration (via {})",
            self.config.admin_cli.first().map(String::as_str).unwrap_or("admin CLI")
        )));

        if !self.is_running()? {
            self.sink.emit(Status::Warn(format!(
                "Container '{container}' not running. Skipping."
            )));
            return Ok(RemoteOutcome::SkippedNotRunning {
                container: container.clone(),
            });
        }

        let mut applied = Vec::with_capacity(self.config.settings.len());
        for setting in &self.config.settings {
            let spec = self
                .admin_command()
                .args(["config", "set"])
                .arg(setting.key.as_str())
                .arg(setting.value.as_str());
            run_checked(
                self.runner,
                &spec,
                &format!("Setting {} = {}", setting.key, setting.value),
                self.sink,
            )?;
            applied.push(setting.key.clone());
        }

        let reload = self.admin_command().args(["config", "reload"]);
        run_checked(
            self.runner,
            &reload,
            &format!("Reloading {container} config"),
            self.sink,
        )?;

        tracing::info!(container = %container, settings = applied.len(), "remote settings reloaded");
        Ok(RemoteOutcome::Reloaded {
            container: container.clone(),
            applied,
        })
    }

    /// Liveness probe. A probe that cannot even be spawned is an error, not a skip.
    fn is_running(&self) -> Result<bool> {
        let probe = CommandSpec::new(paths::CONTAINER_RUNTIME).args([
            "inspect",
            "-f",
            "{{.State.Running}}",
            self.config.container.as_str(),
        ]);
        let output = self.runner.run(&probe)?;
        let running = output.success && output.stdout.trim() == "true";
        tracing::debug!(container = %self.config.container, running, "liveness probe");
        Ok(running)
    }

    fn admin_command(&self) -> CommandSpec {
        CommandSpec::new(paths::CONTAINER_RUNTIME)
            .args(["exec", "-i", self.config.container.as_str()])
            .args(self.config.admin_cli.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatchError;
    use crate::runner::CommandOutput;
    use crate::status::MemorySink;
    use crate::testing::RecordingRunner;

    fn running() -> RecordingRunner {
        RecordingRunner::new().respond("docker inspect", CommandOutput::ok("true\n"))
    }

    #[test]
    fn not_running_skips_all_admin_commands() {
        let config = RemoteSettingsConfig::default();
        let runner = RecordingRunner::new()
            .respond("docker inspect", CommandOutput::failed(1, "No such object: mattermost"));
        let sink = MemorySink::new();

        let outcome = RemoteSettingsPatcher::new(&config, &runner, &sink)
            .run()
            .unwrap();

        assert_eq!(
            outcome,
            RemoteOutcome::SkippedNotRunning {
                container: "mattermost".to_string()
            }
        );
        assert_eq!(runner.commands().len(), 1);
        assert!(!runner.commands().iter().any(|c| c.contains("mmctl")));
        assert!(sink.warnings()[0].contains("not running"));
    }

    #[test]
    fn stopped_container_is_not_running() {
        let config = RemoteSettingsConfig::default();
        let runner = RecordingRunner::new().respond("docker inspect", CommandOutput::ok("false"));
        let sink = MemorySink::new();

        let outcome = RemoteSettingsPatcher::new(&config, &runner, &sink)
            .run()
            .unwrap();
        assert!(matches!(outcome, RemoteOutcome::SkippedNotRunning { .. }));
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn running_container_sets_in_order_then_reloads() {
        let config = RemoteSettingsConfig::default();
        let runner = running();
        let sink = MemorySink::new();

        let outcome = RemoteSettingsPatcher::new(&config, &runner, &sink)
            .run()
            .unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "docker inspect -f {{.State.Running}} mattermost",
                "docker exec -i mattermost mmctl --local config set MetricsSettings.Enable true",
                "docker exec -i mattermost mmctl --local config set MetricsSettings.ListenAddress :8067",
                "docker exec -i mattermost mmctl --local config reload",
            ]
        );
        assert_eq!(
            outcome,
            RemoteOutcome::Reloaded {
                container: "mattermost".to_string(),
                applied: vec![
                    "MetricsSettings.Enable".to_string(),
                    "MetricsSettings.ListenAddress".to_string()
                ],
            }
        );
    }

    #[test]
    fn failed_set_aborts_before_reload() {
        let config = RemoteSettingsConfig::default();
        let runner = running().respond(
            "MetricsSettings.Enable",
            CommandOutput::failed(1, "Error: unable to connect to socket"),
        );
        let sink = MemorySink::new();

        let err = RemoteSettingsPatcher::new(&config, &runner, &sink)
            .run()
            .unwrap_err();

        assert!(matches!(err, PatchError::CommandFailed { .. }));
        assert!(err.to_string().contains("unable to connect to socket"));
        assert!(!runner.commands().iter().any(|c| c.contains("ListenAddress")));
        assert!(!runner.commands().iter().any(|c| c.contains("reload")));
    }

    #[test]
    fn empty_settings_only_reload() {
        let config = RemoteSettingsConfig {
            settings: Vec::new(),
            ..RemoteSettingsConfig::default()
        };
        let runner = running();
        let sink = MemorySink::new();

        RemoteSettingsPatcher::new(&config, &runner, &sink)
            .run()
            .unwrap();
        assert_eq!(runner.commands().len(), 2);
        assert!(runner.commands()[1].ends_with("config reload"));
    }
}
