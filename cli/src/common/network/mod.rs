//! # Juspawn Network Utilities Module (`common::network`)
//!
//! File: cli/src/common/network/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Resolves the `--ip` option (a hostname or a dotted IPv4 address) to the
//! IPv4 address the container's notebook port is published on. Resolution
//! goes through the system resolver via `tokio::net::lookup_host`, and like
//! classic `gethostbyname` only IPv4 answers are considered.
//!
use crate::core::error::{Result, SpawnError};
use anyhow::anyhow;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::lookup_host;
use tracing::{debug, info, instrument};

/// Resolves `host` to the first IPv4 address the resolver returns.
///
/// # Errors
///
/// * `SpawnError::HostAddressUnresolvable` - The lookup failed or produced no IPv4 address.
#[instrument(skip_all, fields(host = %host))]
pub async fn resolve_bind_ip(host: &str) -> Result<Ipv4Addr> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        info!("Binding host ports to IP {}", ip);
        return Ok(ip);
    }

    let addrs = lookup_host((host, 0)).await.map_err(|e| {
        debug!("Lookup of '{}' failed: {}", host, e);
        anyhow!(SpawnError::HostAddressUnresolvable {
            host: host.to_string()
        })
    })?;

    let ip = first_ipv4(addrs).ok_or_else(|| {
        anyhow!(SpawnError::HostAddressUnresolvable {
            host: host.to_string()
        })
    })?;
    info!("Binding host ports to IP {}", ip);
    Ok(ip)
}

fn first_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    })
}
