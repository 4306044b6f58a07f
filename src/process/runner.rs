//! External command execution
//!
//! Spawns one command at a time with stdout and stderr both attached to the
//! write end of a single pipe, so the child's output lands in the order it
//! was written, exactly as `2>&1` would. The read end is drained line by line
//! as data arrives. A build that writes megabytes of output can never stall
//! on a full pipe while we wait for it to exit.

use std::ffi::{OsStr, OsString};
use std::io::{BufRead, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::common::{Error, Result};

/// A single external command, its working directory and spawn overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    envs: Vec<(OsString, OsString)>,
}

impl Invocation {
    /// Create an invocation of `program` running inside `cwd`
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child only
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Human-readable command line, quoting arguments that contain spaces
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Something that can execute an [`Invocation`] and hand back its output
///
/// The lifecycle driver only talks to this trait, so phase sequencing can be
/// exercised without a real toolchain.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. Exit code zero returns the merged output, anything
    /// else is `Error::CommandFailed` carrying it.
    async fn run(&self, invocation: &Invocation) -> Result<String>;
}

/// Runs invocations as real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    verbose: bool,
    progress: bool,
}

impl ProcessRunner {
    /// `verbose` echoes every output line to stderr as it arrives
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress: false,
        }
    }

    /// Show a spinner with the latest output line while not verbose
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<String> {
        let mut sink = if self.verbose {
            Sink::Echo
        } else if self.progress && std::io::stderr().is_terminal() {
            Sink::spinner(&invocation.command_line())
        } else {
            Sink::Silent
        };

        let result = run_command(invocation, &mut sink).await;
        sink.finish();
        result
    }
}

/// Where streamed lines go besides the captured buffer
enum Sink {
    Silent,
    Echo,
    Spinner(ProgressBar),
}

impl Sink {
    fn spinner(command_line: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {prefix} {wide_msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(command_line.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Sink::Spinner(pb)
    }

    fn line(&mut self, line: &str) {
        match self {
            Sink::Silent => {}
            Sink::Echo => {
                let trimmed = line.strip_suffix('\n').unwrap_or(line);
                eprintln!("  {}", trimmed.dimmed());
            }
            Sink::Spinner(pb) => pb.set_message(line.trim_end().to_string()),
        }
    }

    fn finish(&mut self) {
        if let Sink::Spinner(pb) = self {
            pb.finish_and_clear();
        }
    }
}

/// Lines buffered between the pipe reader and the sink
const LINE_QUEUE: usize = 256;

/// Spawn `invocation`, stream its merged output into `sink`, and collect it
async fn run_command(invocation: &Invocation, sink: &mut Sink) -> Result<String> {
    let command_line = invocation.command_line();
    tracing::debug!(
        command = %command_line,
        cwd = %invocation.cwd.display(),
        "Spawning command"
    );

    let spawn_error = |source: std::io::Error| Error::Spawn {
        command: command_line.clone(),
        source,
    };

    let (reader, writer) = std::io::pipe().map_err(spawn_error)?;
    let err_writer = writer.try_clone().map_err(spawn_error)?;

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .envs(invocation.envs.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(err_writer)
        .kill_on_drop(true);
    let spawned = command.spawn();
    // The command keeps its copies of the write end alive; the reader only
    // sees EOF once every copy outside the child is closed.
    drop(command);
    let mut child = spawned.map_err(spawn_error)?;

    let captured = drain_lines(reader, sink).await?;
    let status = child.wait().await?;

    if status.success() {
        tracing::debug!(command = %command_line, bytes = captured.len(), "Command succeeded");
        Ok(captured)
    } else {
        tracing::debug!(command = %command_line, code = ?status.code(), "Command failed");
        Err(Error::command_failed(&command_line, status.code(), captured))
    }
}

/// Read `reader` until EOF, passing each line to `sink` as it arrives
///
/// The pipe is read on the blocking pool and lines are handed back over a
/// bounded channel. Bytes are decoded per line, so invalid UTF-8 becomes
/// U+FFFD and a final line without a newline is kept as is.
async fn drain_lines<R>(reader: R, sink: &mut Sink) -> Result<String>
where
    R: Read + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(LINE_QUEUE);
    let pump = tokio::task::spawn_blocking(move || read_lines(reader, tx));

    let mut captured = String::new();
    while let Some(bytes) = rx.recv().await {
        let line = String::from_utf8_lossy(&bytes);
        sink.line(&line);
        captured.push_str(&line);
    }

    pump.await.map_err(|e| std::io::Error::other(e.to_string()))??;
    Ok(captured)
}

fn read_lines<R: Read>(reader: R, tx: mpsc::Sender<Vec<u8>>) -> std::io::Result<()> {
    let mut reader = std::io::BufReader::new(reader);
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        if tx.blocking_send(line).is_err() {
            // Receiver gone, nobody is collecting any more.
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_spaced_arguments() {
        let inv = Invocation::new("cmake", "/tmp")
            .arg("..")
            .args(["-G", "Visual Studio 14 2015 Win64"]);
        assert_eq!(inv.command_line(), "cmake .. -G \"Visual Studio 14 2015 Win64\"");
    }

    #[test]
    fn test_invocation_accessors() {
        let inv = Invocation::new("ctest", "build").args(["-C", "Debug"]).env("X", "1");
        assert_eq!(inv.program(), "ctest");
        assert_eq!(inv.arguments(), ["-C", "Debug"]);
        assert_eq!(inv.cwd(), Path::new("build"));
    }

    #[tokio::test]
    async fn test_drain_lines_keeps_unterminated_tail() {
        let output: &'static [u8] = b"first\nsecond\nno newline";
        let captured = drain_lines(output, &mut Sink::Silent).await.unwrap();
        assert_eq!(captured, "first\nsecond\nno newline");
    }

    #[tokio::test]
    async fn test_drain_lines_replaces_invalid_utf8() {
        let output: &'static [u8] = b"ok\n\xff\xfe bad\n";
        let captured = drain_lines(output, &mut Sink::Silent).await.unwrap();
        assert_eq!(captured, "ok\n\u{FFFD}\u{FFFD} bad\n");
    }

    #[tokio::test]
    async fn test_drain_lines_outlasts_the_line_queue() {
        let text: String = (0..LINE_QUEUE * 4).map(|i| format!("line {}\n", i)).collect();
        let captured = drain_lines(std::io::Cursor::new(text.clone().into_bytes()), &mut Sink::Silent)
            .await
            .unwrap();
        assert_eq!(captured, text);
    }

    #[tokio::test]
    async fn test_drain_lines_empty_input() {
        let output: &'static [u8] = b"";
        let captured = drain_lines(output, &mut Sink::Silent).await.unwrap();
        assert_eq!(captured, "");
    }
}
