//! # Juspawn Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared building blocks used by the spawn command, kept apart from the
//! command flow itself (`commands::`) and from core infrastructure (`core::`).
//!
//! - **`docker`**: Everything that talks to the container engine.
//! - **`fs`**: Path handling for volume directories.
//! - **`network`**: Resolving the bind address.
//! - **`system`**: The invoking user's name and uid.
//! - **`ui`**: The access summary printed on success.
//!

/// Container engine access and the individual spawn steps.
pub mod docker;
/// Utilities for filesystem paths.
pub mod fs;
/// Bind address resolution.
pub mod network;
/// OS identity lookups.
pub mod system;
/// Terminal output of the access summary.
pub mod ui;
