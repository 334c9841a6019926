//! `channels`: export every channel id for CI job fan-out.

use super::load_settings;
use crate::bundler::RunEnvironment;
use crate::cli::args::ChannelsArgs;
use crate::error::{CliError, Result};
use std::path::Path;

/// Writes `CH_BUILD_LIST=<ids>` for every row of the platform's table.
pub async fn channels(args: &ChannelsArgs, config: &Path) -> Result<i32> {
    let settings = load_settings(config, RunEnvironment::default()).await?;
    let table = crate::bundler::channels::load(settings.layout(), args.platform).await?;
    let line = format!("CH_BUILD_LIST={}", table.ids().join(","));

    tokio::fs::write(&args.output, &line)
        .await
        .map_err(|e| CliError::Output {
            path: args.output.clone(),
            reason: e.to_string(),
        })?;
    log::info!("✓ {line}");
    Ok(0)
}
