//! Kodegen Bundler Channels - multi-channel fan-out for game builds.
//!
//! This binary exports a native Android or iOS project from the engine and
//! builds one signed artifact per distribution channel from it.

use kodegen_bundler_channels::{Result, cli};
use std::process;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse_args();

    let exit_code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {}", e);
            for hint in e.recovery_suggestions() {
                eprintln!("  hint: {hint}");
            }
            1
        }
    };

    process::exit(exit_code);
}

async fn run(args: cli::Args) -> Result<i32> {
    cli::init_logging(args.build_log.as_deref())?;
    cli::run(args).await
}
