//! Builder for constructing Settings.

use super::{PipelineConfig, RunEnvironment, Settings};
use crate::bundler::error::{Context, ErrorExt, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// Resolves every relative path in the configuration against the base
/// directory (the directory holding `bundler.toml`).
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_channels::bundler::{PipelineConfig, RunEnvironment, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_channels::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .base_dir("/work/game")
///     .config(PipelineConfig::default())
///     .environment(RunEnvironment::default())
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    base_dir: Option<PathBuf>,
    config: PipelineConfig,
    environment: RunEnvironment,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the directory relative paths are resolved against.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn base_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.base_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the pipeline configuration.
    ///
    /// Default: [`PipelineConfig::default`]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the run inputs.
    ///
    /// Default: a local run with no inputs
    pub fn environment(mut self, environment: RunEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` is missing or a path can't be resolved.
    pub fn build(self) -> Result<Settings> {
        let base = self.base_dir.context("base_dir is required")?;
        let mut config = self.config;
        let mut environment = self.environment;

        let project = &mut config.project;
        for dir in [
            &mut project.root_dir,
            &mut project.engine_project_dir,
            &mut project.shared_libraries_dir,
        ] {
            *dir = absolute(&base, dir)?;
        }
        for path in [
            config.android.sdk_root.as_mut(),
            config.android.keystore.path.as_mut(),
            config.ios.profile_store.as_mut(),
            environment.share_dir.as_mut(),
            environment.android_sdk.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            *path = absolute(&base, path)?;
        }

        Ok(Settings::new(config, environment))
    }
}

fn absolute(base: &Path, path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize_from(base)
        .fs_context("resolving path", path)?
        .into_owned())
}
