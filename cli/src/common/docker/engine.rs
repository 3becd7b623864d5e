//! # Juspawn Container Engine Seam
//!
//! File: cli/src/common/docker/engine.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The spawn sequence talks to Docker exclusively through the
//! [`ContainerEngine`] trait defined here. Production runs use
//! [`BollardEngine`], a thin wrapper over `bollard::Docker`; unit tests use the
//! recording engine in `common::docker::testing`.
//!
//! ## Architecture
//!
//! The trait mirrors the handful of Engine API calls the sequence needs and
//! keeps `bollard`'s request/response models at the boundary, so callers build
//! the same `Config`, `CreateExecOptions`, etc. they would hand to `bollard`
//! directly. Errors stay as `bollard::errors::Error`; callers wrap them into
//! `SpawnError::DockerApi` with context.
//!
//! Two calls are compound on purpose:
//! - `pull_image` drains the pull progress stream and returns once it ends.
//! - `run_exec` creates an exec instance, starts it attached, collects the
//!   combined output and reads back the exit code.
//!
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, InspectContainerOptions, LogOutput, LogsOptions,
        StartContainerOptions,
    },
    errors::Error as DockerError,
    exec::{CreateExecOptions, StartExecResults},
    image::{CreateImageOptions, ListImagesOptions},
    models::{ContainerCreateResponse, ContainerInspectResponse, ImageSummary},
    Docker,
};
use futures_util::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Live stream of a container's multiplexed stdout/stderr.
pub type LogStream = BoxStream<'static, Result<LogOutput, DockerError>>;

/// Result of a completed exec instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Combined stdout and stderr, decoded lossily as UTF-8.
    pub output: String,
    /// Exit code reported by the engine, if any.
    pub exit_code: Option<i64>,
}

/// The container engine operations the spawn sequence consumes.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Lists local images whose reference matches `repository`, in engine order.
    async fn list_images(&self, repository: &str) -> Result<Vec<ImageSummary>, DockerError>;

    /// Pulls `repository` and waits for the pull stream to finish.
    async fn pull_image(&self, repository: &str) -> Result<(), DockerError>;

    /// Creates an unnamed container; the engine picks the name.
    async fn create_container(
        &self,
        config: Config<String>,
    ) -> Result<ContainerCreateResponse, DockerError>;

    async fn start_container(&self, id: &str) -> Result<(), DockerError>;

    /// Follows stdout and stderr of `id` from the beginning.
    fn logs(&self, id: &str) -> LogStream;

    /// Runs a one-shot command in `id` and waits for it to finish.
    async fn run_exec(
        &self,
        id: &str,
        options: CreateExecOptions<String>,
    ) -> Result<ExecOutput, DockerError>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse, DockerError>;
}

/// [`ContainerEngine`] backed by a `bollard` Docker client.
#[derive(Clone)]
pub struct BollardEngine {
    docker: Docker,
}

impl BollardEngine {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

/// Splits `repo[:tag]` into repository and tag, defaulting to `latest`.
///
/// The Engine API pulls *every* tag when none is given, which is never what a
/// single spawn wants. A `:` before the last `/` belongs to a registry port.
/// For `repo@digest` the digest goes in the tag slot, which the API accepts.
pub fn split_repository_tag(reference: &str) -> (&str, &str) {
    if let Some((repository, digest)) = reference.split_once('@') {
        return (repository, digest);
    }
    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    match reference[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            (&reference[..split], &reference[split + 1..])
        }
        None => (reference, "latest"),
    }
}

#[async_trait]
impl ContainerEngine for BollardEngine {
    async fn list_images(&self, repository: &str) -> Result<Vec<ImageSummary>, DockerError> {
        let mut filters = HashMap::new();
        filters.insert("reference".to_string(), vec![repository.to_string()]);
        let options = ListImagesOptions {
            all: false,
            filters,
            ..Default::default()
        };
        self.docker.list_images(Some(options)).await
    }

    async fn pull_image(&self, repository: &str) -> Result<(), DockerError> {
        let (from_image, tag) = split_repository_tag(repository);
        let options = CreateImageOptions {
            from_image: from_image.to_string(),
            tag: tag.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(item) = stream.next().await {
            match item {
                Ok(info) => {
                    if let Some(status) = info.status {
                        match info.progress {
                            Some(progress) => debug!("Pull: {} {}", status, progress),
                            None => debug!("Pull: {}", status),
                        }
                    }
                }
                // The outcome is judged by listing images again afterwards.
                Err(e) => {
                    warn!("Pull of '{}' reported an error: {}", repository, e);
                    break;
                }
            }
        }
        Ok(())
    }

    async fn create_container(
        &self,
        config: Config<String>,
    ) -> Result<ContainerCreateResponse, DockerError> {
        self.docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
    }

    fn logs(&self, id: &str) -> LogStream {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            ..Default::default()
        };
        self.docker.logs(id, Some(options)).boxed()
    }

    async fn run_exec(
        &self,
        id: &str,
        options: CreateExecOptions<String>,
    ) -> Result<ExecOutput, DockerError> {
        let exec = self.docker.create_exec(id, options).await?;
        debug!("Created exec instance ID: {}", exec.id);

        let mut collected = Vec::new();
        match self.docker.start_exec(&exec.id, None).await? {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(chunk) = output.next().await {
                    collected.extend_from_slice(&chunk?.into_bytes());
                }
            }
            StartExecResults::Detached => {
                debug!("Exec instance '{}' started detached.", exec.id);
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        Ok(ExecOutput {
            output: String::from_utf8_lossy(&collected).into_owned(),
            exit_code: inspect.exit_code,
        })
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse, DockerError> {
        self.docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
    }
}
