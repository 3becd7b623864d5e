//! # Juspawn Image Resolver
//!
//! File: cli/src/common/docker/images.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Makes sure an image of the configured repository is present locally,
//! pulling it once if it is not, and picks the image the container is created
//! from.
//!
//! ## Architecture
//!
//! `resolve_image` performs at most: list → pull → list. Selection among
//! several matching images is "first in engine response order"; the list is
//! never re-sorted, so the choice is reproducible against a scripted engine.
//! An empty list after the pull is fatal (`SpawnError::ImageUnavailable`) and
//! no retry is attempted.
//!
//! The pull can take arbitrarily long (layer downloads). It is bounded by the
//! configured pull timeout when one is set.
//!
use super::engine::ContainerEngine;
use crate::core::error::{Result, SpawnError};
use anyhow::{anyhow, Context};
use bollard::models::ImageSummary;
use std::time::Duration;
use tracing::{error, info, instrument};

/// A locally present image of the configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Content identifier, e.g. `sha256:…`.
    pub id: String,
    pub repo_tags: Vec<String>,
}

impl ImageDescriptor {
    /// First 12 hex digits of the id, as `docker images` shows it.
    pub fn short_id(&self) -> &str {
        let hex = self.id.strip_prefix("sha256:").unwrap_or(&self.id);
        &hex[..hex.len().min(12)]
    }
}

impl From<ImageSummary> for ImageDescriptor {
    fn from(summary: ImageSummary) -> Self {
        Self {
            id: summary.id,
            repo_tags: summary.repo_tags,
        }
    }
}

/// Returns the image to create the container from, pulling `repository` first
/// if no local image matches it.
///
/// # Errors
///
/// * `SpawnError::ImageUnavailable` - Nothing matches `repository`, even after the pull.
/// * `SpawnError::PullTimeout` - The pull did not finish within `pull_timeout`.
/// * `SpawnError::DockerApi` - Listing or pulling failed at the API level.
#[instrument(skip_all, fields(repository = %repository))]
pub async fn resolve_image(
    engine: &dyn ContainerEngine,
    repository: &str,
    pull_timeout: Option<Duration>,
) -> Result<ImageDescriptor> {
    let mut images = list_repository(engine, repository).await?;

    if images.is_empty() {
        info!("Pulling {}...", repository);
        let pull = engine.pull_image(repository);
        let pulled = match pull_timeout {
            Some(limit) => tokio::time::timeout(limit, pull).await.map_err(|_| {
                anyhow!(SpawnError::PullTimeout {
                    repository: repository.to_string(),
                    secs: limit.as_secs(),
                })
            })?,
            None => pull.await,
        };
        pulled
            .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
            .with_context(|| format!("Failed to pull '{}'", repository))?;
        images = list_repository(engine, repository).await?;
    }

    let Some(first) = images.into_iter().next() else {
        error!("No image from repo {} found", repository);
        return Err(anyhow!(SpawnError::ImageUnavailable {
            repository: repository.to_string()
        }));
    };

    let image = ImageDescriptor::from(first);
    info!(
        "Using image {} ({})",
        image.short_id(),
        image.repo_tags.join(",")
    );
    Ok(image)
}

async fn list_repository(
    engine: &dyn ContainerEngine,
    repository: &str,
) -> Result<Vec<ImageSummary>> {
    engine
        .list_images(repository)
        .await
        .map_err(|e| anyhow!(SpawnError::DockerApi { source: e }))
        .with_context(|| format!("Failed to list images for '{}'", repository))
}
