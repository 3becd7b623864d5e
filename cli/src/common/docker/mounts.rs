//! # Juspawn Bind-Mount Planner
//!
//! File: cli/src/common/docker/mounts.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Turns the volume directories given on the command line (plus the optional
//! `~/.ssh` directory) into the bind mounts the container is created with.
//!
//! ## Architecture
//!
//! - Every volume `v` is bound read-write at `/volumes/<basename(v)>`, in input order.
//! - The SSH directory, when it exists on the host, is appended last and bound
//!   read-only at `/ssh/<user>`. A missing SSH directory is silently skipped.
//! - Volume paths are not checked for existence here; Docker rejects a missing
//!   source when the container is created.
//!
//! Basename uniqueness is enforced earlier, when the configuration is
//! resolved, so the planner can map paths one-to-one without checks.
//!
//! `to_bollard_mounts` converts a plan into `bollard`'s `Mount` models.
//!
use crate::common::fs::paths::basename;
use bollard::models::{Mount, MountTypeEnum};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Container directory the volumes are mounted under.
pub const VOLUMES_ROOT: &str = "/volumes";
/// Container directory the SSH credentials are mounted under.
pub const SSH_ROOT: &str = "/ssh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    ReadWrite,
    ReadOnly,
}

impl MountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountMode::ReadWrite => "rw",
            MountMode::ReadOnly => "ro",
        }
    }
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One host directory bound into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host_path: PathBuf,
    pub container_path: String,
    pub mode: MountMode,
}

impl fmt::Display for BindMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {} ({})",
            self.host_path.display(),
            self.container_path,
            self.mode
        )
    }
}

/// Output of the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountPlan {
    pub binds: Vec<BindMount>,
    /// Host paths of all binds, SSH directory included, in bind order.
    pub host_paths: Vec<PathBuf>,
}

impl MountPlan {
    /// Whether anything is mounted, and so whether provisioning has work to do.
    pub fn has_volumes(&self) -> bool {
        !self.host_paths.is_empty()
    }
}

/// Container path for a generic volume: `/volumes/<basename>`.
pub fn volume_target(host_path: &Path) -> String {
    format!(
        "{}/{}",
        VOLUMES_ROOT,
        basename(host_path).unwrap_or_default()
    )
}

/// Container path for the SSH credentials of `user`: `/ssh/<user>`.
pub fn ssh_target(user: &str) -> String {
    format!("{}/{}", SSH_ROOT, user)
}

/// Plans the binds for `volumes` and, if it is an existing directory, `ssh_dir`.
pub fn plan_binds(volumes: &[PathBuf], user: &str, ssh_dir: Option<&Path>) -> MountPlan {
    let mut plan = MountPlan::default();
    for volume in volumes {
        plan.binds.push(BindMount {
            host_path: volume.clone(),
            container_path: volume_target(volume),
            mode: MountMode::ReadWrite,
        });
        plan.host_paths.push(volume.clone());
    }

    if let Some(ssh_dir) = ssh_dir.filter(|dir| dir.is_dir()) {
        let bind = BindMount {
            host_path: ssh_dir.to_path_buf(),
            container_path: ssh_target(user),
            mode: MountMode::ReadOnly,
        };
        info!("Adding .ssh bind: {}", bind);
        plan.binds.push(bind);
        plan.host_paths.push(ssh_dir.to_path_buf());
    }

    info!(
        "Volumes: {}",
        plan.host_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Binds: {}",
        plan.binds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    plan
}

/// Converts planned binds into `bollard::models::Mount` structs of type `bind`.
pub fn to_bollard_mounts(binds: &[BindMount]) -> Vec<Mount> {
    binds
        .iter()
        .map(|bind| Mount {
            target: Some(bind.container_path.clone()),
            source: Some(bind.host_path.to_string_lossy().into_owned()),
            typ: Some(MountTypeEnum::BIND),
            read_only: Some(bind.mode == MountMode::ReadOnly),
            ..Default::default()
        })
        .collect()
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_plan_generic_volumes_in_order() {
        let volumes = vec![PathBuf::from("/data/a"), PathBuf::from("/data/b")];
        let plan = plan_binds(&volumes, "alice", None);
        assert_eq!(
            plan.binds,
            vec![
                BindMount {
                    host_path: PathBuf::from("/data/a"),
                    container_path: "/volumes/a".into(),
                    mode: MountMode::ReadWrite,
                },
                BindMount {
                    host_path: PathBuf::from("/data/b"),
                    container_path: "/volumes/b".into(),
                    mode: MountMode::ReadWrite,
                },
            ]
        );
        assert_eq!(plan.host_paths, volumes);
        assert!(plan.has_volumes());
    }

    #[test]
    fn test_ssh_dir_appended_last_read_only() {
        let home = tempdir().unwrap();
        let ssh_dir = home.path().join(".ssh");
        std::fs::create_dir(&ssh_dir).unwrap();

        let volumes = vec![PathBuf::from("/data/a")];
        let plan = plan_binds(&volumes, "alice", Some(&ssh_dir));
        assert_eq!(plan.binds.len(), 2);
        let last = plan.binds.last().unwrap();
        assert_eq!(last.host_path, ssh_dir);
        assert_eq!(last.container_path, "/ssh/alice");
        assert_eq!(last.mode, MountMode::ReadOnly);
        assert_eq!(plan.host_paths.last(), Some(&ssh_dir));
    }

    #[test]
    fn test_missing_ssh_dir_is_skipped() {
        let home = tempdir().unwrap();
        let plan = plan_binds(&[], "alice", Some(&home.path().join(".ssh")));
        assert!(plan.binds.is_empty());
        assert!(!plan.has_volumes());
    }

    #[test]
    fn test_ssh_path_that_is_a_file_is_skipped() {
        let home = tempdir().unwrap();
        let not_a_dir = home.path().join(".ssh");
        std::fs::write(&not_a_dir, "").unwrap();
        let plan = plan_binds(&[], "alice", Some(&not_a_dir));
        assert!(plan.binds.is_empty());
    }

    #[test]
    fn test_to_bollard_mounts() {
        let binds = vec![
            BindMount {
                host_path: PathBuf::from("/home/user/code"),
                container_path: "/volumes/code".into(),
                mode: MountMode::ReadWrite,
            },
            BindMount {
                host_path: PathBuf::from("/home/user/.ssh"),
                container_path: "/ssh/user".into(),
                mode: MountMode::ReadOnly,
            },
        ];
        let mounts = to_bollard_mounts(&binds);
        assert_eq!(mounts.len(), 2);

        assert_eq!(mounts[0].source.as_deref(), Some("/home/user/code"));
        assert_eq!(mounts[0].target.as_deref(), Some("/volumes/code"));
        assert_eq!(mounts[0].read_only, Some(false));
        assert_eq!(mounts[0].typ, Some(MountTypeEnum::BIND));

        assert_eq!(mounts[1].source.as_deref(), Some("/home/user/.ssh"));
        assert_eq!(mounts[1].target.as_deref(), Some("/ssh/user"));
        assert_eq!(mounts[1].read_only, Some(true));
    }

    #[test]
    fn test_bind_display() {
        let bind = BindMount {
            host_path: PathBuf::from("/data/a"),
            container_path: "/volumes/a".into(),
            mode: MountMode::ReadWrite,
        };
        assert_eq!(bind.to_string(), "/data/a => /volumes/a (rw)");
    }
}
