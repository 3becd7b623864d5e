//! # Juspawn Commands
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `juspawn` has a single action, spawning a compute container. Its flow is
//! in `spawn`; `main` only parses arguments, sets up logging and maps the
//! outcome to an exit status.
//!
pub mod spawn;
