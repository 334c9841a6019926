//! Ordered build hooks around the engine compile step.
//!
//! Hooks are registered explicitly with a numeric order. Orders 1-49 run
//! before the built-in step at 50, orders 51-99 after it. Slots 0, 50 and 100
//! belong to the pipeline itself.
//!
//! - [`registry`] - hook registration and ordering
//! - [`pipeline`] - the pre-hooks → compile → post-hooks state machine
//! - [`builtin`] - the pipeline's own hooks

pub mod builtin;
mod pipeline;
mod registry;

pub use pipeline::{HookPipeline, PipelineState};
pub use registry::{HookRegistry, RESERVED_ORDERS};

use crate::bundler::context::BuildContext;
use crate::bundler::error::Result;
use crate::bundler::settings::{BuildOptions, Platform};
use async_trait::async_trait;
use std::path::Path;

/// Arguments of a pre-build hook.
#[derive(Debug, Clone, Copy)]
pub struct PreBuildArgs<'a> {
    /// Engine scene list
    pub scenes: &'a [String],
    /// Final artifact path
    pub target: &'a Path,
    /// Target platform
    pub platform: Platform,
    /// Requested build options
    pub options: BuildOptions,
}

/// Arguments of a post-build hook.
#[derive(Debug, Clone, Copy)]
pub struct PostBuildArgs<'a> {
    /// Target platform
    pub platform: Platform,
    /// Exported native project
    pub project_dir: &'a Path,
    /// Final artifact path
    pub target: &'a Path,
}

/// Runs before the engine compile.
#[async_trait]
pub trait PreBuildHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs the hook. An error aborts the pipeline.
    async fn run(&self, ctx: &BuildContext, args: &PreBuildArgs<'_>) -> Result<()>;
}

/// Runs after the engine compile.
#[async_trait]
pub trait PostBuildHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs the hook. An error aborts the pipeline.
    async fn run(&self, ctx: &BuildContext, args: &PostBuildArgs<'_>) -> Result<()>;
}
