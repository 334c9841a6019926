//! Subcommand implementations.

mod build;
mod channels;
mod fanout;

pub use build::build;
pub use channels::channels;
pub use fanout::fanout;

use crate::bundler::{
    ChannelArtifact, PipelineConfig, Platform, RunEnvironment, Settings, SettingsBuilder,
};
use crate::error::{CliError, Result};
use path_absolutize::Absolutize;
use serde::Serialize;
use std::path::Path;

/// Loads `bundler.toml` when present and resolves the settings against the
/// directory holding it.
pub async fn load_settings(config: &Path, environment: RunEnvironment) -> Result<Settings> {
    let config = config.absolutize()?.into_owned();
    let pipeline = if config.is_file() {
        log::info!("Using config {}", config.display());
        PipelineConfig::load(&config).await?
    } else {
        log::info!("No {} found, using defaults", config.display());
        PipelineConfig::default()
    };
    let base_dir = config.parent().unwrap_or(Path::new("."));

    Ok(SettingsBuilder::new()
        .base_dir(base_dir)
        .config(pipeline)
        .environment(environment)
        .build()?)
}

#[derive(Serialize)]
struct ArtifactReport<'a> {
    platform: Platform,
    generated_at: String,
    artifacts: &'a [ChannelArtifact],
}

/// Writes the JSON artifact report.
pub async fn write_report(path: &Path, platform: Platform, artifacts: &[ChannelArtifact]) -> Result<()> {
    let report = ArtifactReport {
        platform,
        generated_at: chrono::Utc::now().to_rfc3339(),
        artifacts,
    };
    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| CliError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    log::info!("✓ Wrote artifact report {}", path.display());
    Ok(())
}
