//! # Juspawn Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module turns the raw inputs of a run (command-line flags, the optional
//! user configuration file and the invoking OS identity) into one immutable,
//! validated [`SpawnConfig`]. The spawn sequence never looks at flags or files
//! itself; it only ever receives a `SpawnConfig`.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (`CliOverrides`)
//! 2. User-specific `config.toml` in the platform config directory
//!    (e.g. `~/.config/juspawn/config.toml`), or an explicit `--config` path
//! 3. Default values defined in the code
//!
//! Validation happens once, in [`resolve`]: volume paths are tilde-expanded and
//! made absolute, their `/volumes/<basename>` targets must be unique, and the
//! image repository and readiness marker must be non-empty.
//!
//! ## Examples
//!
//! ```toml
//! # ~/.config/juspawn/config.toml
//! image_repository = "rjw57/jupyter"
//! readiness_marker = "NotebookApp"
//! ready_timeout_secs = 120
//! pull_timeout_secs = 0   # never give up on a pull
//! mount_ssh = false
//! ```
//!
use crate::common::{fs as spawn_fs, system};
use crate::core::error::{Result, SpawnError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Repository the compute image is pulled from unless configured otherwise.
pub const DEFAULT_IMAGE_REPOSITORY: &str = "rjw57/jupyter";
/// Substring of the notebook server's startup banner.
pub const DEFAULT_READINESS_MARKER: &str = "NotebookApp";

/// Contents of the optional `config.toml`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_image_repository")]
    pub image_repository: String,
    #[serde(default = "default_readiness_marker")]
    pub readiness_marker: String,
    /// Seconds to wait for the readiness marker. `0` waits forever.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    /// Seconds to wait for an image pull. `0` waits forever.
    #[serde(default = "default_pull_timeout_secs")]
    pub pull_timeout_secs: u64,
    /// Bind `~/.ssh` read-only into the container when it exists.
    #[serde(default = "default_mount_ssh")]
    pub mount_ssh: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            image_repository: default_image_repository(),
            readiness_marker: default_readiness_marker(),
            ready_timeout_secs: default_ready_timeout_secs(),
            pull_timeout_secs: default_pull_timeout_secs(),
            mount_ssh: default_mount_ssh(),
        }
    }
}

fn default_image_repository() -> String {
    DEFAULT_IMAGE_REPOSITORY.to_string()
}
fn default_readiness_marker() -> String {
    DEFAULT_READINESS_MARKER.to_string()
}
fn default_ready_timeout_secs() -> u64 {
    300
}
fn default_pull_timeout_secs() -> u64 {
    1800
}
fn default_mount_ssh() -> bool {
    true
}

/// Values taken from the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub volumes: Vec<String>,
    pub ip: String,
    pub user: Option<String>,
    pub uid: Option<u32>,
    pub image: Option<String>,
    pub ready_timeout_secs: Option<u64>,
    pub pull_timeout_secs: Option<u64>,
    pub no_ssh: bool,
}

/// The user the container is created for. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub uid: u32,
}

impl Identity {
    /// Hostname given to the container, `<user>-compute`.
    pub fn hostname(&self) -> String {
        format!("{}-compute", self.user)
    }
}

/// Fully resolved and validated settings for one spawn.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub identity: Identity,
    /// Hostname or IP the container port is bound to on the host.
    pub bind_host: String,
    /// Absolute host directories, in command-line order.
    pub volumes: Vec<PathBuf>,
    /// Candidate SSH credentials directory. Mounted only if it exists.
    pub ssh_dir: Option<PathBuf>,
    pub image_repository: String,
    pub readiness_marker: String,
    pub ready_timeout: Option<Duration>,
    pub pull_timeout: Option<Duration>,
}

const CONFIG_FILENAME: &str = "config.toml";

/// Loads the file configuration from `explicit` if given, otherwise from the
/// platform config directory. A missing default file yields the defaults; a
/// missing explicit file is an error.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        info!("Loading configuration from: {}", path.display());
        return load_config_from_path(path);
    }
    match ProjectDirs::from("org", "Juspawn", "juspawn") {
        Some(proj_dirs) => {
            let config_path = proj_dirs.config_dir().join(CONFIG_FILENAME);
            if config_path.exists() {
                info!("Loading user configuration from: {}", config_path.display());
                load_config_from_path(&config_path)
            } else {
                debug!(
                    "User configuration file not found at {}",
                    config_path.display()
                );
                Ok(FileConfig::default())
            }
        }
        None => {
            debug!("Could not determine user config directory, using defaults.");
            Ok(FileConfig::default())
        }
    }
}

fn load_config_from_path(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Merges the sources into a [`SpawnConfig`] and validates it.
///
/// `cwd` anchors relative volume paths; `home` locates `~/.ssh`. Both are
/// parameters so the merge stays a pure function of its inputs.
pub fn resolve(
    file: FileConfig,
    cli: CliOverrides,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<SpawnConfig> {
    let identity = resolve_identity(cli.user, cli.uid)?;
    info!(
        "Will create container for user {} ({})",
        identity.user, identity.uid
    );

    let volumes: Vec<PathBuf> = cli
        .volumes
        .iter()
        .map(|v| spawn_fs::absolutize(Path::new(shellexpand::tilde(v).as_ref()), cwd))
        .collect();

    let ssh_dir = if file.mount_ssh && !cli.no_ssh {
        home.map(|h| h.join(".ssh"))
    } else {
        None
    };

    let config = SpawnConfig {
        identity,
        bind_host: cli.ip,
        volumes,
        ssh_dir,
        image_repository: cli.image.unwrap_or(file.image_repository),
        readiness_marker: file.readiness_marker,
        ready_timeout: as_deadline(cli.ready_timeout_secs.unwrap_or(file.ready_timeout_secs)),
        pull_timeout: as_deadline(cli.pull_timeout_secs.unwrap_or(file.pull_timeout_secs)),
    };
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final spawn configuration: {:?}", config);
    Ok(config)
}

fn as_deadline(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn resolve_identity(user: Option<String>, uid: Option<u32>) -> Result<Identity> {
    let user = match user {
        Some(u) => u,
        None => system::current_username().ok_or_else(|| {
            anyhow!(SpawnError::Config(
                "Cannot determine the current username; pass --user.".to_string()
            ))
        })?,
    };
    let uid = uid.unwrap_or_else(system::current_uid);
    Ok(Identity { user, uid })
}

fn validate_config(config: &SpawnConfig) -> Result<()> {
    if config.identity.user.trim().is_empty() {
        return Err(anyhow!(SpawnError::Config(
            "Container username cannot be empty.".to_string()
        )));
    }
    if config.image_repository.trim().is_empty() {
        return Err(anyhow!(SpawnError::Config(
            "Image repository cannot be empty.".to_string()
        )));
    }
    if config.readiness_marker.is_empty() {
        return Err(anyhow!(SpawnError::Config(
            "Readiness marker cannot be empty.".to_string()
        )));
    }

    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    for volume in &config.volumes {
        let name = spawn_fs::basename(volume).ok_or_else(|| {
            anyhow!(SpawnError::Config(format!(
                "Volume '{}' has no directory name to mount it under.",
                volume.display()
            )))
        })?;
        if let Some(first) = seen.get(&name) {
            return Err(anyhow!(SpawnError::VolumeNameCollision {
                name,
                first: (*first).clone(),
                second: volume.clone(),
            }));
        }
        seen.insert(name, volume);
    }
    Ok(())
}
