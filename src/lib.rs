//! cmake-harness - integration tests for the vigra_cmake helpers
//!
//! This library runs external build tools against fixture projects, captures
//! their output without blocking, and checks that output for the compiler
//! flags the helpers are supposed to produce.

pub mod cli;
pub mod commands;
pub mod common;
pub mod fixtures;
pub mod lifecycle;
pub mod platform;
pub mod preflight;
pub mod process;
pub mod testing;
pub mod workspace;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use process::{filter_output, CommandRunner, Invocation, ProcessRunner};
