//! Test support
//!
//! A [`CommandRunner`] that replays canned results instead of spawning
//! processes, so lifecycle sequencing can be checked without cmake.

use std::ffi::OsString;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::process::{CommandRunner, Invocation};

/// Scripted reply for invocations matching a program and first argument
#[derive(Debug, Clone)]
struct Rule {
    program: String,
    first_arg: Option<String>,
    reply: Reply,
}

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Fail { code: i32, output: String },
}

/// Records every invocation and answers from a list of rules
///
/// Rules are checked in insertion order. Invocations matching no rule
/// succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    watch_var: Option<String>,
    calls: Mutex<Vec<Invocation>>,
    observed: Mutex<Vec<Option<OsString>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to any invocation of `program`
    pub fn output(self, program: &str, output: &str) -> Self {
        self.rule(program, None, Reply::Output(output.to_string()))
    }

    /// Reply with `output` when `program` is invoked with `first_arg` first
    pub fn output_for(self, program: &str, first_arg: &str, output: &str) -> Self {
        self.rule(
            program,
            Some(first_arg),
            Reply::Output(output.to_string()),
        )
    }

    /// Fail invocations of `program` with `code`, carrying `output`
    pub fn fail(self, program: &str, code: i32, output: &str) -> Self {
        self.rule(
            program,
            None,
            Reply::Fail {
                code,
                output: output.to_string(),
            },
        )
    }

    /// Fail when `program` is invoked with `first_arg` first
    pub fn fail_for(self, program: &str, first_arg: &str, code: i32, output: &str) -> Self {
        self.rule(
            program,
            Some(first_arg),
            Reply::Fail {
                code,
                output: output.to_string(),
            },
        )
    }

    /// Record the value of environment variable `var` at each invocation
    pub fn watch_env(mut self, var: &str) -> Self {
        self.watch_var = Some(var.to_string());
        self
    }

    fn rule(mut self, program: &str, first_arg: Option<&str>, reply: Reply) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            first_arg: first_arg.map(str::to_string),
            reply,
        });
        self
    }

    /// Invocations seen so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Watched variable values, one per invocation
    pub fn observed_env(&self) -> Vec<Option<OsString>> {
        self.observed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation.clone());

        if let Some(var) = &self.watch_var {
            self.observed
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(std::env::var_os(var));
        }

        let rule = self.rules.iter().find(|rule| {
            rule.program == invocation.program()
                && rule.first_arg.as_deref().map_or(true, |arg| {
                    invocation.arguments().first().map(String::as_str) == Some(arg)
                })
        });

        match rule.map(|r| &r.reply) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Fail { code, output }) => Err(Error::command_failed(
                &invocation.command_line(),
                Some(*code),
                output.clone(),
            )),
            None => Ok(String::new()),
        }
    }
}
