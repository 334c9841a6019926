//! Channel fan-out bundler core.
//!
//! Turns one engine export into one signed artifact per distribution
//! channel:
//!
//! - [`channels`] - channel configuration table and run selection
//! - [`command`] - external toolchain execution
//! - [`project`] - native project file patching
//! - [`signing`] - keystores, certificates and provisioning profiles
//! - [`builder`] - per-channel fan-out
//! - [`hooks`] - ordered pre/post build hooks around the engine compile
//! - [`engine`] - the engine compile step
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_channels::bundler::{
//!     BuildContext, BuildOptions, BuildRequest, CommandEngine, HookPipeline, HookRegistry,
//!     Platform, RunEnvironment, SettingsBuilder,
//! };
//!
//! # async fn example() -> kodegen_bundler_channels::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .base_dir("/work/game")
//!     .environment(RunEnvironment::default())
//!     .build()?;
//! let request = BuildRequest::new(
//!     Platform::Android,
//!     "/work/out/Game.apk".into(),
//!     BuildOptions::default(),
//!     vec!["Assets/Main.unity".into()],
//! );
//! let ctx = BuildContext::load(settings, request).await?;
//! let mut pipeline = HookPipeline::new(HookRegistry::with_builtins(), Box::new(CommandEngine));
//! pipeline.run(&ctx).await?;
//! for artifact in ctx.artifacts() {
//!     println!("{}: {} ({})", artifact.channel_id, artifact.path.display(), artifact.sha256);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod channels;
pub mod command;
mod context;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod project;
pub mod settings;
pub mod signing;
pub mod utils;

pub use builder::ChannelFanoutBuilder;
pub use channels::{Channel, ChannelConfigTable, ChannelSelection};
pub use context::{BuildContext, ChannelArtifact};
pub use engine::{CommandEngine, EngineCompiler};
pub use error::{Error, HookStage, Result};
pub use hooks::{HookPipeline, HookRegistry, PipelineState};
pub use settings::{
    BuildConfiguration, BuildOptions, BuildRequest, CONFIG_FILE_NAME, PipelineConfig, Platform,
    RunEnvironment, Settings, SettingsBuilder,
};
