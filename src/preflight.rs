//! Toolchain preflight
//!
//! Confirms git, cmake and ctest are reachable before any fixture runs and
//! that cmake is recent enough for the helper library.

use semver::Version;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::common::config::ToolsConfig;
use crate::common::{Error, Result};
use crate::process::{CommandRunner, Invocation};

/// Status of one required tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of checking the whole toolchain
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub os: String,
    pub tools: Vec<ToolStatus>,
}

impl PreflightReport {
    pub fn all_ok(&self) -> bool {
        self.tools.iter().all(|t| t.ok)
    }
}

/// Locate each tool and query its version
pub async fn check_toolchain(runner: &dyn CommandRunner, tools: &ToolsConfig) -> Result<PreflightReport> {
    let minimum = parse_version(&tools.min_cmake_version).ok_or_else(|| {
        Error::Config(format!(
            "Invalid min_cmake_version '{}'",
            tools.min_cmake_version
        ))
    })?;

    let mut statuses = Vec::new();
    for (tool, min) in [
        (&tools.git, None),
        (&tools.cmake, Some(&minimum)),
        (&tools.ctest, None),
    ] {
        statuses.push(check_tool(runner, tool, min).await);
    }

    Ok(PreflightReport {
        os: os_info::get().to_string(),
        tools: statuses,
    })
}

async fn check_tool(runner: &dyn CommandRunner, tool: &str, minimum: Option<&Version>) -> ToolStatus {
    let mut status = ToolStatus {
        name: tool.to_string(),
        path: None,
        version: None,
        ok: false,
        message: None,
    };

    let path = match which::which(tool) {
        Ok(path) => path,
        Err(_) => {
            status.message = Some(Error::ToolNotFound(tool.to_string()).to_string());
            return status;
        }
    };

    let cwd = path.parent().unwrap_or_else(|| Path::new("."));
    let output = match runner.run(&Invocation::new(tool, cwd).arg("--version")).await {
        Ok(output) => output,
        Err(e) => {
            status.path = Some(path);
            status.message = Some(e.to_string());
            return status;
        }
    };
    status.path = Some(path);

    let version = parse_tool_version(&output);
    status.version = version.as_ref().map(Version::to_string);

    match (minimum, version) {
        (Some(min), Some(found)) => match require_version(tool, &found, min) {
            Ok(()) => status.ok = true,
            Err(e) => status.message = Some(e.to_string()),
        },
        (Some(_), None) => {
            status.message = Some(format!("could not read a version from '{} --version'", tool));
        }
        (None, _) => status.ok = true,
    }

    status
}

/// Extract the version from `<tool> version X.Y.Z` style output
pub fn parse_tool_version(output: &str) -> Option<Version> {
    let first = output.lines().next()?;
    let rest = first.split("version").nth(1)?;
    parse_version(rest.split_whitespace().next()?)
}

/// Parse a version, padding `X` and `X.Y` forms and dropping vendor suffixes
/// such as `2.39.2.windows.1`
pub fn parse_version(text: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(text) {
        return Some(version);
    }

    let numeric: Vec<u64> = text
        .split(|c: char| c == '.' || c == '-')
        .map_while(|part| part.parse().ok())
        .take(3)
        .collect();

    match numeric.as_slice() {
        [major] => Some(Version::new(*major, 0, 0)),
        [major, minor] => Some(Version::new(*major, *minor, 0)),
        [major, minor, patch] => Some(Version::new(*major, *minor, *patch)),
        _ => None,
    }
}

/// Fail when `found` is older than `minimum`
pub fn require_version(tool: &str, found: &Version, minimum: &Version) -> Result<()> {
    if found < minimum {
        return Err(Error::ToolVersion {
            tool: tool.to_string(),
            found: found.to_string(),
            required: minimum.to_string(),
        });
    }
    Ok(())
}
