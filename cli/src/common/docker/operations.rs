//! # Juspawn Container Launcher
//!
//! File: cli/src/common/docker/operations.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Creates and starts the compute container from the resolved image and the
//! planned bind mounts.
//!
//! ## Architecture
//!
//! - **`build_container_config`** maps the identity, mounts and bind IP onto
//!   `bollard`'s `Config` / `HostConfig`:
//!   - exposed port `8888/tcp`,
//!   - environment exactly `USER=<user>` and `USER_UID=<uid>`,
//!   - hostname `<user>-compute`,
//!   - typed bind mounts,
//!   - a port binding of `8888/tcp` to the bind IP with *no* host port, so
//!     the engine picks a free one (read back later by `state`).
//! - **`launch_container`** creates the container (unnamed; the engine assigns
//!   a name), starts it, and inspects it once to learn that name.
//!
//! Creation and start failures are both fatal. Nothing is cleaned up: a
//! container that was created but failed to start stays behind.
//!
use super::engine::ContainerEngine;
use super::images::ImageDescriptor;
use super::mounts::{to_bollard_mounts, BindMount};
use crate::core::config::Identity;
use crate::core::error::{Result, SpawnError};
use anyhow::{anyhow, Context};
use bollard::{
    container::Config as ContainerConfig,
    models::{HostConfig, PortBinding},
};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::{info, instrument};

/// Port the notebook server listens on inside the container.
pub const NOTEBOOK_PORT: u16 = 8888;

/// Engine port key for the notebook port, `8888/tcp`.
pub fn notebook_port_key() -> String {
    format!("{}/tcp", NOTEBOOK_PORT)
}

/// The container created for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub id: String,
    /// Engine-assigned name, as reported (may carry a leading `/`).
    pub name: String,
    pub hostname: String,
    pub env: Vec<String>,
    pub exposed_port: u16,
    pub host_ip: Ipv4Addr,
}

impl ContainerDescriptor {
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(10)]
    }
}

/// Environment of the container: `USER` and `USER_UID`, nothing else.
pub fn container_env(identity: &Identity) -> Vec<String> {
    vec![
        format!("USER={}", identity.user),
        format!("USER_UID={}", identity.uid),
    ]
}

/// Builds the container creation request.
pub fn build_container_config(
    image: &ImageDescriptor,
    identity: &Identity,
    binds: &[BindMount],
    host_ip: Ipv4Addr,
) -> ContainerConfig<String> {
    let port_key = notebook_port_key();

    let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
    exposed_ports.insert(port_key.clone(), HashMap::new());

    let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
    port_bindings.insert(
        port_key,
        Some(vec![PortBinding {
            host_ip: Some(host_ip.to_string()),
            host_port: None, // engine-assigned
        }]),
    );

    let mounts = to_bollard_mounts(binds);
    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        ..Default::default()
    };

    ContainerConfig {
        image: Some(image.id.clone()),
        hostname: Some(identity.hostname()),
        env: Some(container_env(identity)),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        ..Default::default()
    }
}

/// Creates and starts the compute container.
///
/// # Errors
///
/// * `SpawnError::DockerApi` - Creation, start or the follow-up inspect failed.
#[instrument(skip_all, fields(image = %image.short_id(), user = %identity.user))]
pub async fn launch_container(
    engine: &dyn ContainerEngine,
    image: &ImageDescriptor,
    identity: &Identity,
    binds: &[BindMount],
    host_ip: Ipv4Addr,
) -> Result<ContainerDescriptor> {
    let config = build_container_config(image, identity, binds, host_ip);
    let hostname = config.hostname.clone().unwrap_or_default();
    let env = config.env.clone().unwrap_or_default();

    let created = engine
        .create_container(config)
        .await
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to create container from image '{}'", image.id))?;
    for warning in &created.warnings {
        info!("Engine warning: {}", warning);
    }

    let mut container = ContainerDescriptor {
        id: created.id,
        name: String::new(),
        hostname,
        env,
        exposed_port: NOTEBOOK_PORT,
        host_ip,
    };
    info!("Created container {}", container.short_id());

    info!("Starting...");
    engine
        .start_container(&container.id)
        .await
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to start container '{}'", container.id))?;

    let inspect = engine
        .inspect_container(&container.id)
        .await
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to inspect container '{}'", container.id))?;
    container.name = inspect.name.unwrap_or_default();

    Ok(container)
}
