//! `build`: engine compile with every hook, then fan-out.

use super::{load_settings, write_report};
use crate::bundler::command::preflight;
use crate::bundler::{BuildContext, BuildRequest, CommandEngine, HookPipeline, HookRegistry};
use crate::cli::args::BuildArgs;
use crate::error::Result;
use std::path::Path;

/// Runs the full pipeline.
pub async fn build(args: &BuildArgs, config: &Path) -> Result<i32> {
    let run = &args.run;
    let settings = load_settings(config, run.environment()).await?;
    let request = BuildRequest::new(
        run.platform,
        run.target.clone(),
        args.options(),
        args.scenes.clone(),
    );
    let ctx = BuildContext::load(settings, request).await?;
    preflight(run.platform);

    let mut pipeline = HookPipeline::new(HookRegistry::with_builtins(), Box::new(CommandEngine));
    let result = pipeline.run(&ctx).await;

    // Partial reports still list the channels that made it.
    if let Some(path) = &run.report {
        write_report(path, run.platform, &ctx.artifacts()).await?;
    }
    result?;
    Ok(0)
}
