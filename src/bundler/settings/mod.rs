//! Configuration structures for the fan-out pipeline.
//!
//! This module provides the `bundler.toml` configuration types, the
//! per-invocation [`BuildRequest`] and run inputs, and the builder that
//! resolves them into [`Settings`].

mod android;
mod builder;
mod config;
mod core;
mod environment;
mod ios;
mod project;
mod request;

pub use android::{AndroidCommands, AndroidSettings, KeystoreSettings};
pub use builder::SettingsBuilder;
pub use config::{CONFIG_FILE_NAME, EngineSettings, ExitWait, PipelineConfig, RunnerSettings};
pub use core::Settings;
pub use environment::RunEnvironment;
pub use ios::{IosCommands, IosSettings};
pub use project::ProjectLayout;
pub use request::{BuildConfiguration, BuildOptions, BuildRequest, Platform};
