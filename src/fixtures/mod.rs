//! Fixture cases
//!
//! Each fixture is described by a [`FixtureCase`] record and exercised by one
//! generic body, [`FixtureRunner::run`]: clean the workspace, configure,
//! build, check the compiler invocations for the expected live-dependency
//! include paths, then run the fixture's tests.

mod manifest;

pub use manifest::{load_cases, select_cases, Manifest};

use serde::{Deserialize, Serialize};

use crate::common::config::Config;
use crate::common::Result;
use crate::lifecycle::{LifecycleDriver, PlatformOptions};
use crate::platform::Platform;
use crate::process::{expect_in_filtered, CommandRunner};
use crate::workspace::FixtureWorkspace;

/// Declarative description of one fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Directory name under the fixtures directory
    pub name: String,

    /// Include paths that must show up in the compile line of
    /// `source_filter`; empty when the fixture has no live dependency
    #[serde(default)]
    pub live_dependency_includes: Vec<String>,

    /// Source file whose compile lines are checked
    #[serde(default = "default_source_filter")]
    pub source_filter: String,

    /// Platforms the fixture's build approach does not support
    #[serde(default)]
    pub skip_on: Vec<Platform>,

    /// Run ctest after building
    #[serde(default = "default_run_tests")]
    pub run_tests: bool,
}

fn default_source_filter() -> String {
    "main.cpp".to_string()
}

fn default_run_tests() -> bool {
    true
}

impl FixtureCase {
    /// A case with no live dependency that runs its tests on every platform
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            live_dependency_includes: Vec::new(),
            source_filter: default_source_filter(),
            skip_on: Vec::new(),
            run_tests: default_run_tests(),
        }
    }

    pub fn with_includes(mut self, includes: &[&str]) -> Self {
        self.live_dependency_includes = includes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn skip_on(mut self, platforms: &[Platform]) -> Self {
        self.skip_on = platforms.to_vec();
        self
    }

    pub fn without_tests(mut self) -> Self {
        self.run_tests = false;
        self
    }
}

/// Fixtures shipped with the harness
pub fn builtin_cases() -> Vec<FixtureCase> {
    vec![
        // zlib found through the system installation
        FixtureCase::new("zlib_system").without_tests(),
        // zlib fetched and built into external/ZLIB by the fixture itself
        FixtureCase::new("zlib_live")
            .with_includes(&["external/ZLIB", "external/ZLIB/build_external_dep"]),
        // zlib located with pkg-config, which the Windows toolchain lacks
        FixtureCase::new("zlib_pkgconfig").skip_on(&[Platform::Windows]),
    ]
}

/// Captured output of a fixture that ran to completion
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixtureReport {
    pub configure_output: String,
    pub build_output: String,
    /// Lines of the build log that matched the include-path check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_lines: Option<String>,
    /// `None` when the test phase was bypassed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output: Option<String>,
}

/// How a fixture finished
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FixtureOutcome {
    Passed(FixtureReport),
    Skipped { platform: Platform },
}

impl FixtureOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, FixtureOutcome::Skipped { .. })
    }
}

/// Runs fixture cases against one configuration and platform
pub struct FixtureRunner<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
    platform: Platform,
}

impl<'a> FixtureRunner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self {
            runner,
            config,
            platform: Platform::current(),
        }
    }

    /// Pretend to be on `platform` when resolving options
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn workspace(&self, case: &FixtureCase) -> FixtureWorkspace {
        FixtureWorkspace::new(&self.config.fixtures.dir, &case.name)
    }

    /// Run one fixture through the whole lifecycle
    pub async fn run(&self, case: &FixtureCase) -> Result<FixtureOutcome> {
        let options = PlatformOptions::resolve(self.platform, &self.config.platform, &case.skip_on);
        if options.skip {
            tracing::info!(fixture = %case.name, platform = %self.platform, "Skipping unsupported fixture");
            return Ok(FixtureOutcome::Skipped {
                platform: self.platform,
            });
        }

        let workspace = self.workspace(case);
        workspace.clean()?;
        let driver = LifecycleDriver::new(self.runner, workspace, options, &self.config.tools);

        let mut report = FixtureReport {
            configure_output: driver.configure().await?,
            build_output: driver.build().await?,
            ..FixtureReport::default()
        };

        if !case.live_dependency_includes.is_empty() {
            let matched = expect_in_filtered(
                &report.build_output,
                &case.source_filter,
                &case.live_dependency_includes,
            )?;
            report.matched_lines = Some(matched);
        }

        if case.run_tests {
            report.test_output = Some(driver.test().await?);
        } else {
            tracing::warn!(fixture = %case.name, "Test phase bypassed for this fixture");
        }

        Ok(FixtureOutcome::Passed(report))
    }
}
