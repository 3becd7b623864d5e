//! # Juspawn Port-Mapping Resolver
//!
//! File: cli/src/common/docker/state.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Reads back where the engine actually published the notebook port and turns
//! every binding into an access URL, together with the container name the
//! operator needs for the teardown command.
//!
//! ## Architecture
//!
//! The bindings come from inspecting the container
//! (`NetworkSettings.Ports["8888/tcp"]`). There may be several, e.g. one per
//! address family; URLs keep the engine's order and are rendered verbatim as
//! `http://{HostIp}:{HostPort}/`.
//!
use super::engine::ContainerEngine;
use crate::core::error::{Result, SpawnError};
use anyhow::{anyhow, Context};
use bollard::models::ContainerInspectResponse;
use tracing::{debug, instrument};

/// Where the running container can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessInfo {
    /// Engine-assigned name without the leading `/`.
    pub container_name: String,
    pub urls: Vec<String>,
}

/// `http://{ip}:{port}/`
pub fn access_url(host_ip: &str, host_port: &str) -> String {
    format!("http://{}:{}/", host_ip, host_port)
}

/// URLs for every host binding of `port/tcp` in an inspect response.
pub fn urls_for_port(inspect: &ContainerInspectResponse, port: u16) -> Vec<String> {
    let key = format!("{}/tcp", port);
    inspect
        .network_settings
        .as_ref()
        .and_then(|settings| settings.ports.as_ref())
        .and_then(|ports| ports.get(&key))
        .and_then(|bindings| bindings.as_ref())
        .map(|bindings| {
            bindings
                .iter()
                .map(|b| {
                    access_url(
                        b.host_ip.as_deref().unwrap_or_default(),
                        b.host_port.as_deref().unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Container name as shown by `docker ps`.
pub fn display_name(inspect: &ContainerInspectResponse) -> String {
    inspect
        .name
        .as_deref()
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string()
}

/// Inspects `container_id` and renders the access URLs for `port`.
///
/// # Errors
///
/// * `SpawnError::DockerApi` - The inspect call failed.
#[instrument(skip_all, fields(container = %container_id, port = port))]
pub async fn resolve_access(
    engine: &dyn ContainerEngine,
    container_id: &str,
    port: u16,
) -> Result<AccessInfo> {
    let inspect = engine
        .inspect_container(container_id)
        .await
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to inspect container '{}'", container_id))?;

    let access = AccessInfo {
        container_name: display_name(&inspect),
        urls: urls_for_port(&inspect, port),
    };
    debug!("Resolved access: {:?}", access);
    Ok(access)
}
