//! `fanout`: rebuild channels from an existing export.

use super::{load_settings, write_report};
use crate::bundler::command::preflight;
use crate::bundler::{BuildContext, BuildOptions, BuildRequest, ChannelFanoutBuilder};
use crate::cli::args::FanoutArgs;
use crate::error::Result;
use std::path::Path;

/// Fans out an exported project without recompiling or preparing it again.
pub async fn fanout(args: &FanoutArgs, config: &Path) -> Result<i32> {
    let run = &args.run;
    let settings = load_settings(config, run.environment()).await?;
    let request = BuildRequest::new(
        run.platform,
        run.target.clone(),
        BuildOptions::default(),
        Vec::new(),
    );
    let ctx = BuildContext::load(settings, request).await?;
    preflight(run.platform);

    let builder = match &args.project {
        Some(dir) => ChannelFanoutBuilder::with_project_dir(&ctx, dir),
        None => ChannelFanoutBuilder::new(&ctx),
    };
    log::info!("Fan out {}", builder.project_dir().display());
    let result = builder.build_all().await;

    if let Some(path) = &run.report {
        write_report(path, run.platform, &ctx.artifacts()).await?;
    }
    result?;
    Ok(0)
}
