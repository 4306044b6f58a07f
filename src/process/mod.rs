//! Process execution and output inspection

pub mod filter;
pub mod runner;

pub use filter::{contains_line, expect_in_filtered, filter_output};
pub use runner::{CommandRunner, Invocation, ProcessRunner};
