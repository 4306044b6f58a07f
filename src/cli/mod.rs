//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

use std::time::Instant;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::fixtures::{load_cases, select_cases, FixtureOutcome, FixtureRunner};
use crate::platform::Platform;
use crate::preflight;
use crate::process::{CommandRunner, ProcessRunner};
use crate::workspace::{ensure_repository, FixtureWorkspace, RepositoryAction};

/// Lines of captured output shown under a failed command
const FAILURE_TAIL_LINES: usize = 40;

/// The runtime commands execute on
///
/// Single-threaded: the search-path shim mutates the process environment,
/// and no worker thread may read it meanwhile.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            fixtures,
            no_sync,
            verbose,
            fail_fast,
            json,
        } => {
            let runner = ProcessRunner::new(verbose && !json).with_progress(!json);
            if !no_sync {
                sync_repository(&runner, config).await?;
            }
            run_fixtures(&runner, config, &fixtures, fail_fast, json).await
        }

        Commands::List { json } => {
            let cases = load_cases(&config.fixtures)?;
            let platform = Platform::current();

            if json {
                println!("{}", serde_json::to_string_pretty(&cases)?);
                return Ok(());
            }

            for case in &cases {
                let note = if case.skip_on.contains(&platform) {
                    format!("(skipped on {})", platform).dimmed().to_string()
                } else if !case.run_tests {
                    "(build only)".dimmed().to_string()
                } else {
                    String::new()
                };
                println!("  {:20} {}", case.name, note);
            }
            Ok(())
        }

        Commands::Sync { verbose } => {
            let runner = ProcessRunner::new(verbose).with_progress(true);
            sync_repository(&runner, config).await
        }

        Commands::Check { json } => {
            let runner = ProcessRunner::new(false);
            let report = preflight::check_toolchain(&runner, &config.tools).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Platform: {}\n", report.os);
                for tool in &report.tools {
                    let indicator = if tool.ok { "✓".green() } else { "✗".red() };
                    let version = tool.version.as_deref().unwrap_or("unknown");
                    println!("  {} {:8} {}", indicator, tool.name, version.dimmed());
                    if let Some(message) = &tool.message {
                        println!("      {}", message);
                    }
                }
            }

            if report.all_ok() {
                Ok(())
            } else {
                Err(Error::Config("toolchain check failed".to_string()))
            }
        }

        Commands::Clean { fixtures } => {
            let cases = select_cases(load_cases(&config.fixtures)?, &fixtures)?;
            for case in &cases {
                FixtureWorkspace::new(&config.fixtures.dir, &case.name).clean()?;
                println!("  {} cleaned {}", "✓".green(), case.name);
            }
            Ok(())
        }
    }
}

/// Clone or update the companion repository
async fn sync_repository(runner: &dyn CommandRunner, config: &Config) -> Result<()> {
    let action = ensure_repository(
        runner,
        &config.tools.git,
        &config.repository.url,
        &config.repository.path,
    )
    .await?;

    let verb = match action {
        RepositoryAction::Cloned => "Cloned",
        RepositoryAction::Updated => "Updated",
    };
    eprintln!(
        "{} {} {}",
        verb.cyan(),
        config.repository.url.dimmed(),
        config.repository.path.display()
    );
    Ok(())
}

/// Run the selected fixtures and report each one
async fn run_fixtures(
    runner: &dyn CommandRunner,
    config: &Config,
    names: &[String],
    fail_fast: bool,
    json: bool,
) -> Result<()> {
    let cases = select_cases(load_cases(&config.fixtures)?, names)?;
    let harness = FixtureRunner::new(runner, config);

    let mut records = Vec::new();
    let mut failed = 0;

    for case in &cases {
        if !json {
            println!("\n{} {}", "Fixture:".blue().bold(), case.name.white().bold());
        }

        let started = Instant::now();
        let result = harness.run(case).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(FixtureOutcome::Passed(_)) => {
                if !json {
                    println!("  {} passed ({} ms)", "✓".green(), elapsed_ms);
                }
            }
            Ok(FixtureOutcome::Skipped { platform }) => {
                if !json {
                    println!("  {} skipped on {}", "-".yellow(), platform);
                }
            }
            Err(e) => {
                failed += 1;
                if !json {
                    println!("  {} {}", "✗".red(), e);
                    if let Some(output) = e.captured_output() {
                        for line in tail(output, FAILURE_TAIL_LINES).lines() {
                            println!("    {}", line.dimmed());
                        }
                    }
                }
            }
        }

        records.push(fixture_record(&case.name, &result, elapsed_ms));

        if result.is_err() && fail_fast {
            break;
        }
    }

    let total = cases.len();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total": total,
                "failed": failed,
                "fixtures": records,
            }))?
        );
    } else if failed == 0 {
        println!("\n{} {} fixture(s)\n", "✓".green().bold(), total);
    } else {
        println!(
            "\n{} {} of {} fixture(s) failed\n",
            "✗".red().bold(),
            failed,
            total
        );
    }

    if failed > 0 {
        return Err(Error::FixturesFailed { failed, total });
    }
    Ok(())
}

fn fixture_record(name: &str, result: &Result<FixtureOutcome>, elapsed_ms: u64) -> serde_json::Value {
    match result {
        Ok(outcome) => serde_json::json!({
            "name": name,
            "duration_ms": elapsed_ms,
            "outcome": outcome,
        }),
        Err(e) => serde_json::json!({
            "name": name,
            "duration_ms": elapsed_ms,
            "outcome": {
                "status": "failed",
                "kind": e.kind(),
                "message": e.to_string(),
                "output_tail": e.captured_output().map(|o| tail(o, FAILURE_TAIL_LINES)),
            },
        }),
    }
}

/// The last `n` lines of `output`
fn tail(output: &str, n: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_is_single_threaded() {
        let rt = runtime().unwrap();
        assert_eq!(
            rt.handle().runtime_flavor(),
            tokio::runtime::RuntimeFlavor::CurrentThread
        );
        assert_eq!(rt.block_on(async { 7 }), 7);
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\nd\n", 2), "c\nd");
        assert_eq!(tail("only", 5), "only");
        assert_eq!(tail("", 3), "");
    }

    #[test]
    fn test_failed_record_carries_kind_and_tail() {
        let result: Result<FixtureOutcome> = Err(Error::command_failed(
            "cmake --build .",
            Some(2),
            "compiling\nerror: zlib.h missing\n".to_string(),
        ));
        let record = fixture_record("zlib_live", &result, 12);
        assert_eq!(record["outcome"]["status"], "failed");
        assert_eq!(record["outcome"]["kind"], "command_failed");
        assert_eq!(record["outcome"]["output_tail"], "compiling\nerror: zlib.h missing");
    }

    #[test]
    fn test_skipped_record() {
        let result: Result<FixtureOutcome> = Ok(FixtureOutcome::Skipped {
            platform: Platform::Windows,
        });
        let record = fixture_record("zlib_pkgconfig", &result, 0);
        assert_eq!(record["outcome"]["status"], "skipped");
        assert_eq!(record["outcome"]["platform"], "windows");
    }
}
