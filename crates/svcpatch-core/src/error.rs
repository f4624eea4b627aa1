use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("config file not found at {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("cannot read config file {}: try running: sudo chmod o+r {}", .0.display(), .0.display())]
    PermissionDenied(PathBuf),

    #[error("invalid YAML in {}: {source}", .path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config root in {} must be a mapping", .0.display())]
    NotAMapping(PathBuf),

    #[error("invalid patch path '{0}': segments must be non-empty")]
    InvalidPatchPath(String),

    #[error("cannot patch '{path}': '{segment}' holds a non-mapping value")]
    PatchConflict { path: String, segment: String },

    #[error("{description} failed: {stderr}")]
    CommandFailed { description: String, stderr: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deploy script {} failed ({})", .script.display(), exit_label(.code))]
    DeployFailed { script: PathBuf, code: Option<i32> },

    #[error("required tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("empty command: {0}")]
    EmptyCommand(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
