//! # Juspawn UI Utilities Module (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Renders the only user-facing output of a successful run: the URLs the
//! notebook can be reached on and the command that removes the container.
//! Everything else goes through `tracing` on stderr, so stdout stays
//! scriptable.
//!
use std::io::{self, Write};

/// Command the operator runs to kill and delete the container.
pub fn teardown_command(container_name: &str) -> String {
    format!("docker rm -f {}", container_name)
}

/// Formats the access summary shown after a successful spawn.
pub fn render_access_summary(urls: &[String], container_name: &str) -> String {
    let mut out = String::from("Access container on:\n");
    for url in urls {
        out.push_str(" - ");
        out.push_str(url);
        out.push('\n');
    }
    out.push_str("Kill *AND DELETE* container using command:\n");
    out.push_str(&teardown_command(container_name));
    out.push('\n');
    out
}

/// Writes the access summary to stdout.
pub fn print_access_summary(urls: &[String], container_name: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(render_access_summary(urls, container_name).as_bytes())?;
    stdout.flush()
}
