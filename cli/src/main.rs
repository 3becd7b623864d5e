//! # Juspawn Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `juspawn` CLI. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on `--quiet` / `--verbose`
//! - Running the spawn command, cancellable with Ctrl-C
//! - Mapping the outcome to the process exit status
//!
//! ## Exit Status
//!
//! - `0`: The container is running and its URLs were printed.
//! - `1`: Any fatal error, including no image being available after a pull.
//! - `130`: Interrupted with Ctrl-C. A container that was already created keeps running.
//!
//! ## Examples
//!
//! ```bash
//! # Spawn with the current directory's `data` folder mounted
//! juspawn ./data
//!
//! # Only warnings and errors on stderr
//! juspawn -q ./data
//!
//! # Debug logging
//! juspawn -v ./data
//! ```
//!
use clap::Parser;
use std::future::Future;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // The spawn command
mod common; // Docker steps and shared utilities
mod core; // Configuration and errors

use crate::core::error::SpawnError;

/// Defines the command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "juspawn",
    about = "Spawn a new Jupyter compute container",
    long_about = "Spawn a disposable, single-user Jupyter compute container on the local Docker host.\n\
                  Each VOLUMEDIR appears in ~/notebooks/data/ inside the container with the same basename.",
    version
)]
struct Cli {
    #[command(flatten)]
    spawn: commands::spawn::SpawnArgs,
    /// Reduce logging verbosity.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Increase logging verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Runs `run` unless `signal` fires first, which yields `SpawnError::Cancelled`.
/// If the signal cannot be listened for, `run` simply continues.
async fn run_until_cancelled<R, S>(run: R, signal: S) -> anyhow::Result<()>
where
    R: Future<Output = anyhow::Result<()>>,
    S: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(run);
    tokio::select! {
        result = &mut run => result,
        signal = signal => match signal {
            Ok(()) => Err(anyhow::anyhow!(SpawnError::Cancelled)),
            Err(e) => {
                tracing::warn!("Cannot listen for Ctrl-C ({}); the run is not cancellable.", e);
                run.await
            }
        },
    }
}

/// Process exit status for a failed run: 130 when cancelled, 1 otherwise.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<SpawnError>() {
        Some(SpawnError::Cancelled) => 130,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.quiet, cli.verbose)));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = run_until_cancelled(
        commands::spawn::handle_spawn(cli.spawn),
        tokio::signal::ctrl_c(),
    )
    .await;

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

// --- Basic Integration Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["juspawn"]).unwrap();
        assert_eq!(cli.spawn.ip, "localhost");
        assert!(cli.spawn.volumes.is_empty());
        assert_eq!(cli.spawn.user, None);
        assert_eq!(cli.spawn.uid, None);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_volumes_and_options() {
        let cli = Cli::try_parse_from([
            "juspawn", "-q", "--ip", "0.0.0.0", "--user", "bob", "--uid", "2000", "/data/a",
            "/data/b",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.spawn.ip, "0.0.0.0");
        assert_eq!(cli.spawn.user.as_deref(), Some("bob"));
        assert_eq!(cli.spawn.uid, Some(2000));
        assert_eq!(cli.spawn.volumes, vec!["/data/a", "/data/b"]);
    }

    #[test]
    fn test_negative_uid_rejected() {
        assert!(Cli::try_parse_from(["juspawn", "--uid", "-1"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let unavailable = anyhow::anyhow!(SpawnError::ImageUnavailable {
            repository: "rjw57/jupyter".to_string(),
        });
        assert_eq!(exit_code(&unavailable), 1);

        let cancelled = anyhow::anyhow!(SpawnError::Cancelled);
        assert_eq!(exit_code(&cancelled), 130);

        let engine_failure = anyhow::anyhow!(SpawnError::DockerApi {
            source: bollard::errors::Error::DockerResponseServerError {
                status_code: 500,
                message: "boom".to_string(),
            },
        })
        .context("Failed to start container 'c0ffee'");
        assert_eq!(exit_code(&engine_failure), 1);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&plain), 1);
    }

    #[tokio::test]
    async fn test_signal_cancels_run() {
        let result =
            run_until_cancelled(std::future::pending(), std::future::ready(Ok(()))).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpawnError>(),
            Some(SpawnError::Cancelled)
        ));
        assert_eq!(exit_code(&err), 130);
    }

    #[tokio::test]
    async fn test_signal_setup_failure_keeps_running() {
        let run = async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok::<(), anyhow::Error>(())
        };
        let signal = std::future::ready(Err(std::io::Error::other("no signal driver")));
        assert!(run_until_cancelled(run, signal).await.is_ok());
    }

    #[tokio::test]
    async fn test_finished_run_wins_over_signal() {
        let result = run_until_cancelled(async { Ok::<(), anyhow::Error>(()) }, std::future::pending()).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(true, 0), "warn");
        assert_eq!(log_level(false, 0), "info");
        assert_eq!(log_level(false, 1), "debug");
        assert_eq!(log_level(false, 5), "trace");
    }
}
