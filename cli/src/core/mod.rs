//! # Juspawn Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Foundational pieces used across the application:
//! - `config`: Merging CLI flags, `config.toml` and defaults into a validated `SpawnConfig`
//! - `error`: The `SpawnError` taxonomy and the `Result` alias
//!
pub mod config;
pub mod error;
