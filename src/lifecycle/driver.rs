//! Configure, build and test phases for one fixture
//!
//! Each phase is one external command. Phases can be called on their own,
//! but build expects a configured build directory and test expects a build.
//! Every phase hands back the captured output so callers can assert on it
//! before moving on.

use crate::common::config::ToolsConfig;
use crate::common::Result;
use crate::process::{CommandRunner, Invocation};
use crate::workspace::FixtureWorkspace;

use super::options::PlatformOptions;
use super::search_path::with_search_path;

/// A build phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Configure,
    Build,
    Test,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Configure => write!(f, "configure"),
            Phase::Build => write!(f, "build"),
            Phase::Test => write!(f, "test"),
        }
    }
}

/// Drives the cmake/ctest lifecycle of one fixture workspace
pub struct LifecycleDriver<'a> {
    runner: &'a dyn CommandRunner,
    workspace: FixtureWorkspace,
    options: PlatformOptions,
    cmake: String,
    ctest: String,
}

impl<'a> LifecycleDriver<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        workspace: FixtureWorkspace,
        options: PlatformOptions,
        tools: &ToolsConfig,
    ) -> Self {
        Self {
            runner,
            workspace,
            options,
            cmake: tools.cmake.clone(),
            ctest: tools.ctest.clone(),
        }
    }

    pub fn workspace(&self) -> &FixtureWorkspace {
        &self.workspace
    }

    pub fn options(&self) -> &PlatformOptions {
        &self.options
    }

    /// Recreate the build directory and run cmake against the fixture
    pub async fn configure(&self) -> Result<String> {
        tracing::info!(fixture = %self.workspace.name(), phase = %Phase::Configure, "Running phase");
        self.workspace.remove_build_dir()?;
        self.workspace.create_build_dir()?;

        // The build directory always sits directly inside the source directory.
        let invocation = Invocation::new(&self.cmake, self.workspace.build_dir())
            .arg("..")
            .args(self.options.configure_args());
        self.runner.run(&invocation).await
    }

    /// Build inside the existing build directory
    pub async fn build(&self) -> Result<String> {
        tracing::info!(fixture = %self.workspace.name(), phase = %Phase::Build, "Running phase");
        let invocation =
            Invocation::new(&self.cmake, self.workspace.build_dir()).args(["--build", "."]);
        self.runner.run(&invocation).await
    }

    /// Run the fixture's tests, with the search path augmented if needed
    pub async fn test(&self) -> Result<String> {
        tracing::info!(fixture = %self.workspace.name(), phase = %Phase::Test, "Running phase");
        let invocation = Invocation::new(&self.ctest, self.workspace.build_dir())
            .args(self.options.test_args());
        with_search_path(
            self.options.search_path.as_ref(),
            self.workspace.build_dir(),
            self.runner.run(&invocation),
        )
        .await
    }
}
