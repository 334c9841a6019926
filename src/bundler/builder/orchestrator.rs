//! Channel fan-out orchestration.
//!
//! This module provides the [`ChannelFanoutBuilder`] that walks the selected
//! channels of an exported native project and delegates each one to the
//! platform builder.

use crate::bail;
use super::android::AndroidFanout;
use super::ios::IosFanout;
use super::prepare::{prepare_android, prepare_ios};
use crate::bundler::context::{BuildContext, ChannelArtifact};
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::Platform;
use std::path::{Path, PathBuf};

/// Main fan-out orchestrator.
///
/// Builds one artifact per selected channel, in table order, from a single
/// exported project.
///
/// # Platform Support
///
/// - **Android**: one signed, aligned APK per channel
/// - **iOS**: one signed and one re-signed ipa per channel
/// - **Desktop**: nothing to fan out
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_channels::bundler::{BuildContext, ChannelFanoutBuilder};
///
/// # async fn example(ctx: BuildContext) -> kodegen_bundler_channels::bundler::Result<()> {
/// let builder = ChannelFanoutBuilder::new(&ctx);
/// let artifacts = builder.build_all().await?;
/// println!("Built {} channels", artifacts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChannelFanoutBuilder<'a> {
    ctx: &'a BuildContext,
    project_dir: PathBuf,
}

impl<'a> ChannelFanoutBuilder<'a> {
    /// Creates a builder over the request's export directory.
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self::with_project_dir(ctx, &ctx.request().project_dir())
    }

    /// Creates a builder over an arbitrary, already exported project.
    pub fn with_project_dir(ctx: &'a BuildContext, project_dir: &Path) -> Self {
        Self {
            ctx,
            project_dir: project_dir.to_path_buf(),
        }
    }

    /// Exported project the builder works on.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Runs the one-time preparation of a freshly exported project.
    pub async fn prepare(&self) -> Result<()> {
        match self.ctx.request().platform() {
            Platform::Android => prepare_android(self.ctx, &self.project_dir).await,
            Platform::Ios => prepare_ios(self.ctx, &self.project_dir).await,
            Platform::Desktop => Ok(()),
        }
    }

    /// Builds every selected channel.
    ///
    /// # Returns
    ///
    /// Artifacts of this call, in table order. Each one is also recorded on
    /// the context.
    ///
    /// # Errors
    ///
    /// The first failing channel aborts the run. Selected ids missing from
    /// the table are reported as [`Error::UnknownChannel`] after every known
    /// channel was built.
    pub async fn build_all(&self) -> Result<Vec<ChannelArtifact>> {
        let ctx = self.ctx;
        if !self.project_dir.is_dir() {
            bail!(
                "exported project {} doesn't exist",
                self.project_dir.display()
            );
        }

        let target = ctx.request().target();
        let mut artifacts = Vec::new();

        match ctx.request().platform() {
            Platform::Android => {
                let fanout = AndroidFanout::new(ctx, &self.project_dir)?;
                for channel in ctx.table().selected(ctx.selection()) {
                    let artifact = fanout.build_channel(channel, target).await?;
                    ctx.record_artifact(artifact.clone());
                    artifacts.push(artifact);
                }
            }
            Platform::Ios => {
                let fanout = IosFanout::new(ctx, &self.project_dir);
                for channel in ctx.table().selected(ctx.selection()) {
                    match fanout.build_channel(channel, target).await? {
                        Some(artifact) => {
                            ctx.record_artifact(artifact.clone());
                            artifacts.push(artifact);
                        }
                        // Export-only leaves the project patched for the first channel.
                        None => break,
                    }
                }
            }
            Platform::Desktop => {
                log::info!("No channel fan-out for {}", Platform::Desktop);
            }
        }

        let unknown = ctx.table().unknown_ids(ctx.selection());
        if !unknown.is_empty() {
            return Err(Error::UnknownChannel { ids: unknown });
        }

        log::info!("✓ Built {} channel artifact(s)", artifacts.len());
        Ok(artifacts)
    }
}
