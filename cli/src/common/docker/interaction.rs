//! # Juspawn Container Interaction
//!
//! File: cli/src/common/docker/interaction.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The two steps that talk to the *running* container:
//!
//! - **`wait_for_ready`** follows the container log until a line containing
//!   the readiness marker (the notebook server's startup banner) shows up.
//! - **`provision`** runs a one-shot setup script inside the container, as
//!   the target user, linking the mounted volumes into `~/notebooks/data` and
//!   the SSH credentials into `~/.ssh`.
//!
//! ## Architecture
//!
//! Log output arrives in arbitrary chunks, not lines. A `LineScanner` per
//! output stream (stdout and stderr) buffers bytes and tests each complete
//! line, and the trailing partial line when the stream ends, with a plain
//! substring match. The wait stops at the first matching line or when the
//! stream ends, and is bounded by the readiness timeout when one is
//! configured.
//!
//! A failing setup script is reported with a warning and otherwise ignored:
//! the notebook is usable without the links. Engine errors while creating or
//! running the exec instance are still fatal.
//!
use super::engine::{ContainerEngine, LogStream};
use crate::core::error::{Result, SpawnError};
use anyhow::{anyhow, Context};
use bollard::{container::LogOutput, errors::Error as DockerError, exec::CreateExecOptions};
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// How the readiness wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// A log line contained the marker.
    Ready,
    /// The log stream closed without the marker (e.g. the server exited).
    StreamEnded,
}

/// Splits a byte stream into lines and looks for `marker` in each.
struct LineScanner<'a> {
    marker: &'a str,
    pending: Vec<u8>,
}

impl<'a> LineScanner<'a> {
    fn new(marker: &'a str) -> Self {
        Self {
            marker,
            pending: Vec::new(),
        }
    }

    /// Feeds a chunk; true once a complete line contains the marker.
    fn push(&mut self, chunk: &[u8]) -> bool {
        self.pending.extend_from_slice(chunk);
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if self.matches(&line) {
                return true;
            }
        }
        false
    }

    /// Checks the unterminated remainder at end of stream.
    fn finish(&mut self) -> bool {
        let rest = std::mem::take(&mut self.pending);
        !rest.is_empty() && self.matches(&rest)
    }

    fn matches(&self, line: &[u8]) -> bool {
        let text = String::from_utf8_lossy(line);
        debug!("log: {}", text.trim_end());
        text.contains(self.marker)
    }
}

async fn scan_for_marker(
    mut stream: LogStream,
    marker: &str,
) -> std::result::Result<Readiness, DockerError> {
    // Frames of the two streams interleave; a line never spans both.
    let mut out = LineScanner::new(marker);
    let mut err = LineScanner::new(marker);
    while let Some(frame) = stream.next().await {
        let matched = match frame? {
            LogOutput::StdErr { message } => err.push(&message),
            other => out.push(&other.into_bytes()),
        };
        if matched {
            return Ok(Readiness::Ready);
        }
    }
    if out.finish() || err.finish() {
        Ok(Readiness::Ready)
    } else {
        Ok(Readiness::StreamEnded)
    }
}

/// Blocks until the container logs a line containing `marker`, the log stream
/// ends, or `deadline` passes.
///
/// # Errors
///
/// * `SpawnError::ReadinessTimeout` - The marker did not appear within `deadline`.
///   The container is left running.
/// * `SpawnError::DockerApi` - The log stream failed.
#[instrument(skip_all, fields(container = %container_id))]
pub async fn wait_for_ready(
    engine: &dyn ContainerEngine,
    container_id: &str,
    marker: &str,
    deadline: Option<Duration>,
) -> Result<Readiness> {
    info!("Waiting for start...");
    let scan = scan_for_marker(engine.logs(container_id), marker);
    let scanned = match deadline {
        Some(limit) => match tokio::time::timeout(limit, scan).await {
            Ok(scanned) => scanned,
            Err(_) => {
                error!(
                    "No '{}' in the log of container {} after {}s. It is still running; remove it with: docker rm -f {}",
                    marker,
                    container_id,
                    limit.as_secs(),
                    container_id
                );
                return Err(anyhow!(SpawnError::ReadinessTimeout {
                    container: container_id.to_string(),
                    secs: limit.as_secs(),
                }));
            }
        },
        None => scan.await,
    };

    let readiness = scanned
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to read logs of container '{}'", container_id))?;
    match readiness {
        Readiness::Ready => debug!("Readiness marker '{}' seen.", marker),
        Readiness::StreamEnded => warn!(
            "Log stream of container {} ended before '{}' appeared.",
            container_id, marker
        ),
    }
    Ok(readiness)
}

/// Setup script run inside the container as the target user.
///
/// Links `/ssh/$USER` to `~/.ssh` when mounted, and every `/volumes/*` entry
/// into `~/notebooks/data` under its basename.
pub const PROVISION_SCRIPT: &str = r#"
mkdir -p ~/notebooks/data &&
if [ -d "/ssh/${USER}" ]; then
    ln -s "/ssh/${USER}" ~/.ssh;
fi &&
for d in /volumes/*; do
    [ -e "${d}" ] || continue;
    ln -s "${d}" ~/notebooks/data/"$(basename "${d}")";
done
"#;

/// Command line of the setup exec.
pub fn provision_command() -> Vec<String> {
    vec![
        "/bin/bash".to_string(),
        "-c".to_string(),
        PROVISION_SCRIPT.to_string(),
    ]
}

/// How the provisioning step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Nothing was mounted, so nothing was run.
    Skipped,
    Completed,
    /// The script ran but exited non-zero.
    Failed(String),
}

/// Runs the setup script in `container_id` as `user`, unless `has_volumes`
/// is false.
///
/// # Errors
///
/// * `SpawnError::DockerApi` - The exec instance could not be created or run.
///   A non-zero exit of the script itself is not an error; it is returned as
///   `ProvisionOutcome::Failed` and logged.
#[instrument(skip_all, fields(container = %container_id, user = %user))]
pub async fn provision(
    engine: &dyn ContainerEngine,
    container_id: &str,
    user: &str,
    has_volumes: bool,
) -> Result<ProvisionOutcome> {
    if !has_volumes {
        debug!("No volumes mounted; skipping provisioning.");
        return Ok(ProvisionOutcome::Skipped);
    }

    info!("Linking bind mounts into notebook dir...");
    let options = CreateExecOptions {
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        cmd: Some(provision_command()),
        user: Some(user.to_string()),
        ..Default::default()
    };

    let result = engine
        .run_exec(container_id, options)
        .await
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to run setup in container '{}'", container_id))?;

    for line in result.output.lines() {
        info!("output:{}", line);
    }

    match result.exit_code {
        Some(code) if code != 0 => {
            let failure = SpawnError::ProvisioningFailed(format!(
                "setup script exited with status {}",
                code
            ));
            warn!("{}", failure);
            Ok(ProvisionOutcome::Failed(failure.to_string()))
        }
        _ => Ok(ProvisionOutcome::Completed),
    }
}
