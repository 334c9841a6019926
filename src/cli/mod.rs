//! Command line interface for the channel bundler.
//!
//! Parses arguments, sets up logging and dispatches to the subcommands.

mod args;
pub mod commands;

pub use args::{Args, BuildArgs, ChannelsArgs, Command, FanoutArgs, RunArgs};

use crate::error::{CliError, Result};
use std::path::Path;

/// Main CLI entry point
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    match &args.command {
        Command::Build(build) => commands::build(build, &args.config).await,
        Command::Fanout(fanout) => commands::fanout(fanout, &args.config).await,
        Command::Channels(channels) => commands::channels(channels, &args.config).await,
    }
}

/// Initializes `env_logger`, defaulting to `info`.
///
/// With `build_log` the log goes to that file instead of stderr.
pub fn init_logging(build_log: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = build_log {
        let file = std::fs::File::create(path).map_err(|e| CliError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    // A logger installed by an embedding process wins.
    let _ = builder.try_init();
    Ok(())
}
