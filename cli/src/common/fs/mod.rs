//! # Juspawn Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Filesystem helpers shared by configuration and mount planning.
//!
//! - **`paths`**: Lexical absolutization and basename extraction for volume directories.
//!
pub mod paths;

pub use paths::{absolutize, basename};
