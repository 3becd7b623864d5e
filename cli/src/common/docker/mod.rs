//! # Juspawn Docker Module Interface
//!
//! File: cli/src/common/docker/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module groups everything that talks to the container engine. Each
//! step of the spawn sequence lives in its own submodule and receives the
//! engine as a `&dyn ContainerEngine`, so the whole sequence can run against
//! the real daemon or the in-memory engine used by the tests.
//!
//! ## Architecture
//!
//! - **`connect`**: Connects to the local Docker daemon.
//! - **`engine`**: The `ContainerEngine` trait and its `bollard`-backed implementation.
//! - **`images`**: Image Resolver (find or pull the image).
//! - **`mounts`**: Bind-Mount Planner (`/volumes/<name>`, `/ssh/<user>`).
//! - **`operations`**: Container Launcher (create + start).
//! - **`interaction`**: Readiness Detector (log scan) and Post-Start Provisioner (setup exec).
//! - **`state`**: Port-Mapping Resolver (published port → URLs).
//!

/// Handles establishing a connection to the local Docker daemon.
pub mod connect;
/// The container engine seam and its bollard implementation.
pub mod engine;
/// Locates or pulls the compute image.
pub mod images;
/// Waits for readiness and provisions the running container.
pub mod interaction;
/// Plans the bind mounts.
pub mod mounts;
/// Creates and starts the compute container.
pub mod operations;
/// Resolves published ports into access URLs.
pub mod state;

#[cfg(test)]
pub mod testing;

// --- Re-exports for easier access from other parts of the application ---
pub use connect::connect_engine;
pub use engine::ContainerEngine;
pub use images::resolve_image;
pub use interaction::{provision, wait_for_ready};
pub use mounts::plan_binds;
pub use operations::launch_container;
pub use state::resolve_access;
