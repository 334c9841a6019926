//! Command line argument parsing and validation.
//!
//! Every run input can also come from the environment variable CI jobs set.

use crate::bundler::{BuildOptions, Platform, RunEnvironment};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Multi-channel build fan-out for game-engine native projects
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_channels",
    version,
    about = "Multi-channel build fan-out for game-engine native projects",
    long_about = "Builds one native project export and fans it out into one signed artifact per channel.

Usage:
  kodegen_bundler_channels build --platform android --target out/Game.apk
  CH_BUILD_LIST=A,B kodegen_bundler_channels fanout --platform android --target out/Game.apk
  kodegen_bundler_channels channels --platform ios --output build_list.properties

Exit code 0 = every selected channel artifact exists."
)]
pub struct Args {
    /// Pipeline configuration file
    #[arg(short, long, global = true, value_name = "PATH", default_value = crate::bundler::CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Write the log to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub build_log: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the engine compile with every hook, then fan out
    Build(BuildArgs),
    /// Fan out an already exported native project without recompiling
    Fanout(FanoutArgs),
    /// Write `CH_BUILD_LIST=<every channel id>` to a file
    Channels(ChannelsArgs),
}

/// Inputs shared by `build` and `fanout`.
#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Target platform: android, ios, desktop
    #[arg(short, long, value_name = "PLATFORM")]
    pub platform: Platform,

    /// Final artifact path, e.g. out/Android/Game.apk
    #[arg(short, long, value_name = "PATH")]
    pub target: PathBuf,

    /// Comma separated channel build ids; defaults to the table's first row
    #[arg(long, env = "CH_BUILD_LIST", value_name = "IDS")]
    pub channels: Option<String>,

    /// CI build number
    #[arg(long, env = "BUILD_NUMBER")]
    pub build_number: Option<String>,

    /// Version string, `<major>.<minor>.<patch>`
    #[arg(long, env = "GAME_VERSION")]
    pub game_version: Option<String>,

    /// Directory iOS packages are shared to
    #[arg(long, env = "SHARE_ROOT_DIR", value_name = "DIR")]
    pub share_dir: Option<PathBuf>,

    /// Ship the minimal main-dex list
    #[arg(long, env = "MINIMAL_MAIN_DEX")]
    pub minimal_main_dex: bool,

    /// Android SDK root
    #[arg(long, env = "ANDROID_SDK", value_name = "DIR")]
    pub android_sdk: Option<PathBuf>,

    /// Automated (CI) run: per-channel artifact names, strict inputs
    #[arg(long, env = "SERVER_BUILD")]
    pub automated: bool,

    /// iOS: stop after patching the Xcode project for the first channel
    #[arg(long, env = "EXPORT_PROJECT_ONLY")]
    pub export_project_only: bool,

    /// Write a JSON report of the produced artifacts
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    /// Run inputs as the pipeline sees them.
    pub fn environment(&self) -> RunEnvironment {
        RunEnvironment {
            channels: self.channels.clone(),
            build_number: self.build_number.clone(),
            game_version: self.game_version.clone(),
            share_dir: self.share_dir.clone(),
            minimal_main_dex: self.minimal_main_dex,
            android_sdk: self.android_sdk.clone(),
            automated: self.automated,
            export_project_only: self.export_project_only,
        }
    }
}

/// `build` arguments.
#[derive(ClapArgs, Debug, Clone)]
pub struct BuildArgs {
    /// Run inputs
    #[command(flatten)]
    pub run: RunArgs,

    /// Engine scenes, in build order
    #[arg(long = "scene", value_name = "SCENE")]
    pub scenes: Vec<String>,

    /// Development build with debugging and profiler
    #[arg(long)]
    pub debug: bool,
}

impl BuildArgs {
    /// Engine build options.
    pub fn options(&self) -> BuildOptions {
        if self.debug {
            BuildOptions::debug()
        } else {
            BuildOptions::default()
        }
    }
}

/// `fanout` arguments.
#[derive(ClapArgs, Debug, Clone)]
pub struct FanoutArgs {
    /// Run inputs
    #[command(flatten)]
    pub run: RunArgs,

    /// Exported project; defaults to the target's export directory
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,
}

/// `channels` arguments.
#[derive(ClapArgs, Debug, Clone)]
pub struct ChannelsArgs {
    /// Platform whose table is listed
    #[arg(short, long, value_name = "PLATFORM", default_value = "android")]
    pub platform: Platform,

    /// File receiving `CH_BUILD_LIST=<ids>`
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let run = match &self.command {
            Command::Build(args) => &args.run,
            Command::Fanout(args) => &args.run,
            Command::Channels(_) => return Ok(()),
        };
        if run.target.as_os_str().is_empty() {
            return Err("Target cannot be empty".to_string());
        }
        if run.export_project_only && run.platform != Platform::Ios {
            return Err("EXPORT_PROJECT_ONLY only applies to iOS builds".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_subcommand_parses_flags() {
        let args = Args::try_parse_from([
            "kodegen_bundler_channels",
            "build",
            "--platform",
            "android",
            "--target",
            "out/Game.apk",
            "--channels",
            "A,B",
            "--scene",
            "Assets/Main.unity",
            "--debug",
        ])
        .unwrap();
        let Command::Build(build) = &args.command else {
            panic!("expected build");
        };
        assert_eq!(build.run.platform, Platform::Android);
        assert_eq!(build.run.environment().channels.as_deref(), Some("A,B"));
        assert_eq!(build.scenes, vec!["Assets/Main.unity"]);
        assert!(build.options().development);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn export_only_is_ios_only() {
        let args = Args::try_parse_from([
            "kodegen_bundler_channels",
            "fanout",
            "--platform",
            "android",
            "--target",
            "out/Game.apk",
            "--export-project-only",
        ])
        .unwrap();
        assert!(args.validate().is_err());
    }
}
