use crate::error::{PatchError, Result};
use crate::paths;
use crate::redeploy::RedeployStrategy;
use crate::remote::RemoteSetting;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RedeployMode
// ---------------------------------------------------------------------------

/// How the file-patched service is told to pick up its new config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeployMode {
    /// Run the deploy script, restarting the container if the script is missing.
    #[default]
    Script,
    /// Always restart the container.
    Restart,
}

// ---------------------------------------------------------------------------
// FilePatchSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePatchSettings {
    /// Service config file; relative paths are taken from `stack_dir`.
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    #[serde(default = "default_scratch_file")]
    pub scratch_file: PathBuf,
    /// Top-level key owning the service-specific metrics block.
    #[serde(default = "default_service_key")]
    pub service_key: String,
    #[serde(default = "default_file_container")]
    pub container: String,
    #[serde(default)]
    pub redeploy: RedeployMode,
    /// Deploy script; relative paths are taken from the home directory.
    #[serde(default = "default_deploy_script")]
    pub deploy_script: PathBuf,
    /// Program and leading args used to overwrite the protected config file.
    #[serde(default = "default_privileged_copy")]
    pub privileged_copy: Vec<String>,
}

fn default_config_file() -> PathBuf {
    PathBuf::from(paths::ARTIFACTORY_CONFIG_FILE)
}

fn default_scratch_file() -> PathBuf {
    PathBuf::from(paths::ARTIFACTORY_SCRATCH_FILE)
}

fn default_service_key() -> String {
    "artifactory".to_string()
}

fn default_file_container() -> String {
    "artifactory".to_string()
}

fn default_deploy_script() -> PathBuf {
    PathBuf::from(paths::ARTIFACTORY_DEPLOY_SCRIPT)
}

fn default_privileged_copy() -> Vec<String> {
    vec!["sudo".to_string(), "cp".to_string()]
}

impl Default for FilePatchSettings {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            scratch_file: default_scratch_file(),
            service_key: default_service_key(),
            container: default_file_container(),
            redeploy: RedeployMode::default(),
            deploy_script: default_deploy_script(),
            privileged_copy: default_privileged_copy(),
        }
    }
}

impl FilePatchSettings {
    /// Dotted paths forced to `true` in the config document.
    pub fn metric_paths(&self) -> Vec<String> {
        vec![
            "shared.metrics.enabled".to_string(),
            format!("{}.metrics.enabled", self.service_key),
        ]
    }

    pub fn redeploy_strategy(&self) -> RedeployStrategy {
        match self.redeploy {
            RedeployMode::Script => RedeployStrategy::Script {
                script: self.deploy_script.clone(),
            },
            RedeployMode::Restart => RedeployStrategy::Restart,
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteSettingsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettingsConfig {
    #[serde(default = "default_remote_container")]
    pub container: String,
    /// Admin CLI invoked inside the container, e.g. `mmctl --local`.
    #[serde(default = "default_admin_cli")]
    pub admin_cli: Vec<String>,
    #[serde(default = "default_remote_settings")]
    pub settings: Vec<RemoteSetting>,
}

fn default_remote_container() -> String {
    "mattermost".to_string()
}

fn default_admin_cli() -> Vec<String> {
    vec!["mmctl".to_string(), "--local".to_string()]
}

fn default_remote_settings() -> Vec<RemoteSetting> {
    vec![
        RemoteSetting::new("MetricsSettings.Enable", "true"),
        RemoteSetting::new("MetricsSettings.ListenAddress", ":8067"),
    ]
}

impl Default for RemoteSettingsConfig {
    fn default() -> Self {
        Self {
            container: default_remote_container(),
            admin_cli: default_admin_cli(),
            settings: default_remote_settings(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings (top-level)
// ---------------------------------------------------------------------------

/// Everything the patch run needs to know about paths, containers and commands.
///
/// Every field defaults to the stock `cicd_stack` layout, so an empty or absent
/// settings file reproduces the built-in behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Stack root; relative paths are taken from the home directory.
    #[serde(default = "default_stack_dir")]
    pub stack_dir: PathBuf,
    #[serde(default)]
    pub artifactory: FilePatchSettings,
    #[serde(default)]
    pub mattermost: RemoteSettingsConfig,
}

fn default_stack_dir() -> PathBuf {
    PathBuf::from(paths::STACK_DIR)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stack_dir: default_stack_dir(),
            artifactory: FilePatchSettings::default(),
            mattermost: RemoteSettingsConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|source| PatchError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Make every path absolute against `home`.
    pub fn resolve(mut self, home: &Path) -> Self {
        self.stack_dir = paths::resolve_under(home, &self.stack_dir);
        self.artifactory.config_file =
            paths::resolve_under(&self.stack_dir, &self.artifactory.config_file);
        self.artifactory.scratch_file = paths::resolve_under(home, &self.artifactory.scratch_file);
        self.artifactory.deploy_script =
            paths::resolve_under(home, &self.artifactory.deploy_script);
        self
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let file = &self.artifactory;
        let remote = &self.mattermost;

        if file.privileged_copy.iter().all(|a| a.trim().is_empty()) {
            warnings.push(ConfigWarning::error(
                "artifactory.privileged_copy is empty",
            ));
        }
        if file.container.trim().is_empty() {
            warnings.push(ConfigWarning::error("artifactory.container is empty"));
        }
        if file.service_key.trim().is_empty() || file.service_key.contains('.') {
            warnings.push(ConfigWarning::error(format!(
                "artifactory.service_key '{}' must be a single non-empty key",
                file.service_key
            )));
        }
        if file.scratch_file == file.config_file {
            warnings.push(ConfigWarning::error(
                "artifactory.scratch_file must differ from artifactory.config_file",
            ));
        }

        if remote.container.trim().is_empty() {
            warnings.push(ConfigWarning::error("mattermost.container is empty"));
        }
        if remote.admin_cli.iter().all(|a| a.trim().is_empty()) {
            warnings.push(ConfigWarning::error("mattermost.admin_cli is empty"));
        }
        for setting in &remote.settings {
            if setting.key.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "mattermost.settings has an entry with an empty key (value '{}')",
                    setting.value
                )));
            }
        }
        if remote.settings.is_empty() {
            warnings.push(ConfigWarning::warning(
                "mattermost.settings is empty; only a config reload will be issued",
            ));
        }

        warnings
    }

    pub fn has_errors(warnings: &[ConfigWarning]) -> bool {
        warnings.iter().any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
