//! # Juspawn Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error taxonomy of the spawn sequence. Every fatal
//! condition is surfaced immediately and stops the run; nothing triggers an
//! automatic container cleanup, so a failed run may leave an orphaned
//! container behind for the operator to remove.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `SpawnError`: A custom error enum using `thiserror` for the specific failure kinds
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! Callers that need to react to a specific kind (for example `main` choosing
//! an exit status) downcast:
//!
//! ```rust,ignore
//! match result {
//!     Err(e) if matches!(e.downcast_ref::<SpawnError>(), Some(SpawnError::Cancelled)) => 130,
//!     Err(_) => 1,
//!     Ok(_) => 0,
//! }
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the spawn sequence.
#[derive(Error, Debug)]
pub enum SpawnError {
    /// No image for the repository, even after a pull attempt.
    #[error("No image from repository '{repository}' found")]
    ImageUnavailable { repository: String },

    #[error("Cannot resolve bind address '{host}' to an IPv4 address")]
    HostAddressUnresolvable { host: String },

    /// Any failed engine request (create, start, exec, inspect, logs, ...).
    #[error("Docker API interaction failed: {source}")]
    DockerApi {
        #[from]
        source: bollard::errors::Error,
    },

    /// Post-start setup failed. Logged only; never aborts a run.
    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("Container '{container}' did not report readiness within {secs}s")]
    ReadinessTimeout { container: String, secs: u64 },

    #[error("Pulling '{repository}' did not finish within {secs}s")]
    PullTimeout { repository: String, secs: u64 },

    #[error(
        "Volumes '{}' and '{}' would both be mounted at /volumes/{name}",
        first.display(),
        second.display()
    )]
    VolumeNameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interrupted")]
    Cancelled,
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
