//! # Juspawn Docker Connection Helper
//!
//! File: cli/src/common/docker/connect.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This internal utility module provides a single, standardized function,
//! `connect_engine`, responsible for establishing a connection to the local
//! Docker daemon using default settings provided by the `bollard` crate and
//! wrapping it as the [`ContainerEngine`](super::engine::ContainerEngine) the
//! spawn sequence runs against.
//!
//! ## Architecture
//!
//! - Calls `bollard::Docker::connect_with_local_defaults()`, which honours
//!   `DOCKER_HOST` and otherwise uses the platform socket
//!   (`/var/run/docker.sock` on Unix, a named pipe on Windows).
//! - Wraps connection errors into `SpawnError::DockerApi` with a hint about
//!   the daemon not running.
//!
//! Connecting does not contact the daemon yet; the first real request does.
//!
use super::engine::BollardEngine;
use crate::core::error::{Result, SpawnError};
use anyhow::{anyhow, Context};
use bollard::Docker;
use tracing::instrument;

/// Establishes a connection to the local Docker daemon using default settings.
///
/// # Errors
///
/// Returns an `Err` wrapping `SpawnError::DockerApi` if the client cannot be
/// configured (for example a malformed `DOCKER_HOST`).
#[instrument]
pub async fn connect_engine() -> Result<BollardEngine> {
    let docker = Docker::connect_with_local_defaults()
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .context("Failed to connect to Docker daemon. Is it running and accessible?")?;
    Ok(BollardEngine::new(docker))
}
