//! Error types for the harness
//!
//! A failing build tool, a missing assertion and a broken workspace are kept
//! as distinct variants so a report can tell a regression in the generated
//! build configuration apart from a broken toolchain.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Command Errors ===
    #[error("Command '{command}' failed with {}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    // === Assertion Errors ===
    #[error("Assertion failed: {0}")]
    Assertion(String),

    // === Workspace Errors ===
    #[error("'{}' exists but is not a directory", .0.display())]
    RepositoryNotDirectory(PathBuf),

    #[error("Build directory '{}' already exists", .0.display())]
    BuildDirExists(PathBuf),

    #[error("Failed to remove '{}': {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unusable path list '{}': {reason}", .path.display())]
    PathList { path: PathBuf, reason: String },

    // === Fixture Errors ===
    #[error("{failed} of {total} fixture(s) failed")]
    FixturesFailed { failed: usize, total: usize },

    #[error("Unknown fixture '{name}'. Available: {available}")]
    UnknownFixture { name: String, available: String },

    // === Toolchain Errors ===
    #[error("Required tool '{0}' not found in PATH")]
    ToolNotFound(String),

    #[error("Tool '{tool}' version {found} is older than required {required}")]
    ToolVersion {
        tool: String,
        found: String,
        required: String,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create a command failed error carrying the captured output
    pub fn command_failed(command: &str, code: Option<i32>, output: String) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            code,
            output,
        }
    }

    /// Create an assertion error
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Create an unknown fixture error listing the known names
    pub fn unknown_fixture<S: AsRef<str>>(name: &str, known: &[S]) -> Self {
        Self::UnknownFixture {
            name: name.to_string(),
            available: known.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Output captured before a command failed, if this is a command failure
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::CommandFailed { .. } | Error::Spawn { .. } => "command_failed",
            Error::Assertion(_) => "assertion_failed",
            Error::RepositoryNotDirectory(_)
            | Error::BuildDirExists(_)
            | Error::Remove { .. }
            | Error::PathList { .. } => "workspace_error",
            Error::ToolNotFound(_) | Error::ToolVersion { .. } => "toolchain_error",
            Error::UnknownFixture { .. } => "unknown_fixture",
            Error::FixturesFailed { .. } => "fixtures_failed",
            _ => "internal_error",
        }
    }
}
