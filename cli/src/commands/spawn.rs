//! # Juspawn Spawn Command
//!
//! File: cli/src/commands/spawn.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Spawns a disposable, single-user Jupyter container: finds or pulls the
//! image, binds the given directories into it, starts it with the notebook
//! port published on the bind IP, waits for the notebook server, links the
//! volumes into `~/notebooks/data`, and prints where to reach it and how to
//! remove it.
//!
//! ## Architecture
//!
//! - `SpawnArgs`: command-line arguments (clap).
//! - `handle_spawn`: boundary work (configuration, bind address, engine
//!   connection, output).
//! - `spawn`: the sequence itself, strictly in order:
//!   1. `images::resolve_image`
//!   2. `mounts::plan_binds`
//!   3. `operations::launch_container`
//!   4. `interaction::wait_for_ready`
//!   5. `interaction::provision`
//!   6. `state::resolve_access`
//!
//! Each step depends on the side effect of the previous one, so there is no
//! concurrency between them. Any fatal error stops the sequence where it
//! happens; a container that was already created keeps running.
//!
//! ## Examples
//!
//! ```bash
//! # Notebook with two data directories under ~/notebooks/data
//! juspawn ~/datasets/census ./scratch
//!
//! # Publish on all interfaces, as another user
//! juspawn --ip 0.0.0.0 --user guest --uid 2000
//! ```
//!
use crate::common::{
    docker::{
        self,
        images::ImageDescriptor,
        interaction::{ProvisionOutcome, Readiness},
        mounts::MountPlan,
        operations::{ContainerDescriptor, NOTEBOOK_PORT},
        state::AccessInfo,
        ContainerEngine,
    },
    network, ui,
};
use crate::core::{
    config::{self, CliOverrides, SpawnConfig},
    error::Result,
};
use anyhow::Context;
use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// # Spawn Arguments (`SpawnArgs`)
///
/// Options controlling which container is spawned and how it is wired up.
#[derive(Parser, Debug, Clone)]
pub struct SpawnArgs {
    /// Host directories to bind into the container. Each appears in
    /// ~/notebooks/data/ with the same basename.
    #[arg(value_name = "VOLUMEDIR")]
    pub volumes: Vec<String>,

    /// Address (hostname or IPv4) to bind the host port to.
    #[arg(long, value_name = "IP", default_value = "localhost")]
    pub ip: String,

    /// Username inside the container. Defaults to the current user.
    #[arg(long)]
    pub user: Option<String>,

    /// User id inside the container. Defaults to the current uid.
    #[arg(long)]
    pub uid: Option<u32>,

    /// Image repository to spawn from.
    #[arg(long, env = "JUSPAWN_IMAGE", value_name = "REPO")]
    pub image: Option<String>,

    /// Seconds to wait for the notebook server to come up (0 = forever).
    #[arg(long, value_name = "SECS")]
    pub ready_timeout: Option<u64>,

    /// Seconds to wait for an image pull (0 = forever).
    #[arg(long, value_name = "SECS")]
    pub pull_timeout: Option<u64>,

    /// Do not bind ~/.ssh into the container.
    #[arg(long)]
    pub no_ssh: bool,

    /// Read configuration from this file instead of the user config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl SpawnArgs {
    fn into_overrides(self) -> CliOverrides {
        CliOverrides {
            volumes: self.volumes,
            ip: self.ip,
            user: self.user,
            uid: self.uid,
            image: self.image,
            ready_timeout_secs: self.ready_timeout,
            pull_timeout_secs: self.pull_timeout,
            no_ssh: self.no_ssh,
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct SpawnReport {
    pub image: ImageDescriptor,
    pub mounts: MountPlan,
    pub container: ContainerDescriptor,
    pub readiness: Readiness,
    pub provisioning: ProvisionOutcome,
    pub access: AccessInfo,
}

/// Resolves configuration, connects to Docker, runs the spawn sequence and
/// prints the access summary.
pub async fn handle_spawn(args: SpawnArgs) -> Result<()> {
    let file_config = config::load_file_config(args.config.as_deref())?;
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let home = dirs::home_dir();
    let spawn_config = config::resolve(
        file_config,
        args.into_overrides(),
        &cwd,
        home.as_deref(),
    )?;

    let host_ip = network::resolve_bind_ip(&spawn_config.bind_host).await?;
    let engine = docker::connect_engine().await?;

    let report = spawn(&engine, &spawn_config, host_ip).await?;
    log_report(&report);
    ui::print_access_summary(&report.access.urls, &report.access.container_name)
        .context("Failed to write access summary")?;
    Ok(())
}

fn log_report(report: &SpawnReport) {
    info!(
        "Container {} ({}, hostname {}) runs image {}, port {} published on {}",
        report.container.short_id(),
        report.container.name.trim_start_matches('/'),
        report.container.hostname,
        report.image.short_id(),
        report.container.exposed_port,
        report.container.host_ip
    );
    debug!("Container environment: {:?}", report.container.env);
    for bind in &report.mounts.binds {
        debug!("Mounted {}", bind);
    }
    debug!("Readiness: {:?}", report.readiness);
    match &report.provisioning {
        ProvisionOutcome::Failed(reason) => {
            warn!("Volume links in ~/notebooks/data may be incomplete: {}", reason)
        }
        outcome => debug!("Provisioning: {:?}", outcome),
    }
}

/// Runs the spawn sequence against `engine`.
pub async fn spawn(
    engine: &dyn ContainerEngine,
    config: &SpawnConfig,
    host_ip: Ipv4Addr,
) -> Result<SpawnReport> {
    let image =
        docker::resolve_image(engine, &config.image_repository, config.pull_timeout).await?;

    let mounts = docker::plan_binds(
        &config.volumes,
        &config.identity.user,
        config.ssh_dir.as_deref(),
    );

    let container =
        docker::launch_container(engine, &image, &config.identity, &mounts.binds, host_ip).await?;

    let readiness = docker::wait_for_ready(
        engine,
        &container.id,
        &config.readiness_marker,
        config.ready_timeout,
    )
    .await?;

    let provisioning = docker::provision(
        engine,
        &container.id,
        &config.identity.user,
        mounts.has_volumes(),
    )
    .await?;
    debug!("Provisioning outcome: {:?}", provisioning);

    let access = docker::resolve_access(engine, &container.id, NOTEBOOK_PORT).await?;
    info!(
        "Container {} is up with {} access URL(s)",
        access.container_name,
        access.urls.len()
    );

    Ok(SpawnReport {
        image,
        mounts,
        container,
        readiness,
        provisioning,
        access,
    })
}
