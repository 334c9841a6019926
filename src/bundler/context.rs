//! Per-invocation build context.
//!
//! One [`BuildContext`] is created per pipeline run and passed by reference
//! to every hook, the fan-out builder and the signing manager. Nothing in the
//! pipeline keeps state outside of it.

use crate::bundler::channels::{self, ChannelConfigTable, ChannelSelection};
use crate::bundler::command::CommandRunner;
use crate::bundler::error::Result;
use crate::bundler::settings::{BuildRequest, Platform, Settings};
use crate::bundler::signing::SigningManager;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// A packaged channel build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelArtifact {
    /// Channel build id
    pub channel_id: String,
    /// Final artifact path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256
    pub sha256: String,
}

/// Everything one pipeline invocation works with.
#[derive(Debug)]
pub struct BuildContext {
    settings: Settings,
    request: BuildRequest,
    table: ChannelConfigTable,
    selection: ChannelSelection,
    runner: CommandRunner,
    artifacts: Mutex<Vec<ChannelArtifact>>,
}

impl BuildContext {
    /// Creates a context over an already loaded table.
    ///
    /// The channel selection is resolved from `CH_BUILD_LIST` here, once.
    pub fn new(settings: Settings, request: BuildRequest, table: ChannelConfigTable) -> Self {
        let selection =
            ChannelSelection::resolve(&table, settings.environment().channels.as_deref());
        let runner = CommandRunner::new(settings.runner());
        Self {
            settings,
            request,
            table,
            selection,
            runner,
            artifacts: Mutex::new(Vec::new()),
        }
    }

    /// Loads the platform's channel table and creates the context.
    ///
    /// Desktop builds read the Android table; they never fan out but the
    /// pre-build hooks still consult the selection.
    pub async fn load(settings: Settings, request: BuildRequest) -> Result<Self> {
        let platform = match request.platform() {
            Platform::Ios => Platform::Ios,
            _ => Platform::Android,
        };
        let table = channels::load(settings.layout(), platform).await?;
        Ok(Self::new(settings, request, table))
    }

    /// Resolved settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The build request.
    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    /// Channel configuration table.
    pub fn table(&self) -> &ChannelConfigTable {
        &self.table
    }

    /// Channels this run builds.
    pub fn selection(&self) -> &ChannelSelection {
        &self.selection
    }

    /// Shared command runner.
    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Signing manager bound to this context.
    pub fn signing(&self) -> SigningManager<'_> {
        SigningManager::new(&self.settings, &self.runner)
    }

    /// Records a produced artifact.
    pub fn record_artifact(&self, artifact: ChannelArtifact) {
        log::info!(
            "✓ Channel {} artifact: {} ({} bytes)",
            artifact.channel_id,
            artifact.path.display(),
            artifact.size
        );
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact);
    }

    /// Artifacts produced so far, in production order.
    pub fn artifacts(&self) -> Vec<ChannelArtifact> {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
