//! Core Settings struct and implementations.

use super::{
    AndroidSettings, EngineSettings, IosSettings, PipelineConfig, ProjectLayout, RunEnvironment,
    RunnerSettings,
};
use crate::bundler::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Version used by local runs that were given none.
const LOCAL_GAME_VERSION: &str = "0.0.1";

/// Build number used by local runs.
const LOCAL_BUILD_NUMBER: &str = "1";

/// Resolved settings for one pipeline invocation.
///
/// Central configuration for the pipeline, constructed via
/// [`SettingsBuilder`](super::SettingsBuilder). All paths are absolute.
#[derive(Clone, Debug)]
pub struct Settings {
    config: PipelineConfig,
    environment: RunEnvironment,
}

impl Settings {
    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(config: PipelineConfig, environment: RunEnvironment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Project layout.
    pub fn layout(&self) -> &ProjectLayout {
        &self.config.project
    }

    /// Android toolchain settings.
    pub fn android(&self) -> &AndroidSettings {
        &self.config.android
    }

    /// iOS toolchain settings.
    pub fn ios(&self) -> &IosSettings {
        &self.config.ios
    }

    /// Engine compile settings.
    pub fn engine(&self) -> &EngineSettings {
        &self.config.engine
    }

    /// Command runner settings.
    pub fn runner(&self) -> &RunnerSettings {
        &self.config.runner
    }

    /// Run inputs.
    pub fn environment(&self) -> &RunEnvironment {
        &self.environment
    }

    /// Whether this is an automated (CI) run.
    ///
    /// Automated runs name artifacts per channel and require a version
    /// string and build number.
    pub fn is_automated(&self) -> bool {
        self.environment.automated
    }

    /// Android SDK root: `ANDROID_SDK` first, then the config file.
    ///
    /// # Errors
    ///
    /// Fails if neither is set or the directory doesn't exist.
    pub fn android_sdk_root(&self) -> Result<&Path> {
        let sdk = self
            .environment
            .android_sdk
            .as_deref()
            .or(self.config.android.sdk_root.as_deref())
            .ok_or_else(|| Error::GenericError("Can't find Android SDK, set ANDROID_SDK".into()))?;
        if !sdk.is_dir() {
            return Err(Error::GenericError(format!(
                "Android SDK doesn't exist: {}",
                sdk.display()
            )));
        }
        Ok(sdk)
    }

    /// Version string with line breaks trimmed.
    ///
    /// Local runs default to `0.0.1`; automated runs require one.
    pub fn game_version(&self) -> Result<String> {
        match self
            .environment
            .game_version
            .as_deref()
            .map(|v| v.trim_matches(['\r', '\n']))
            .filter(|v| !v.is_empty())
        {
            Some(version) => Ok(version.to_string()),
            None if self.is_automated() => Err(Error::GenericError(
                "missing GAME_VERSION in automated build".into(),
            )),
            None => Ok(LOCAL_GAME_VERSION.to_string()),
        }
    }

    /// CI build number. Local runs use `1`; automated runs require one.
    pub fn build_number(&self) -> Result<String> {
        if !self.is_automated() {
            return Ok(LOCAL_BUILD_NUMBER.to_string());
        }
        self.environment
            .build_number
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::GenericError("Can't get BUILD_NUMBER from environment".into()))
    }

    /// Keystore used when a channel has none of its own.
    pub fn default_keystore(&self) -> PathBuf {
        self.config
            .android
            .keystore
            .path
            .clone()
            .unwrap_or_else(|| self.config.project.default_keystore())
    }

    /// Provisioning profile store directory.
    pub fn profile_store(&self) -> Result<PathBuf> {
        if let Some(store) = &self.config.ios.profile_store {
            return Ok(store.clone());
        }
        dirs::home_dir()
            .map(|home| home.join("Library/MobileDevice/Provisioning Profiles"))
            .ok_or_else(|| Error::GenericError("Can't locate home directory".into()))
    }

    /// Directory iOS packages are written to.
    ///
    /// Automated runs require `SHARE_ROOT_DIR` to exist; local runs fall back
    /// to the directory holding the target.
    pub fn share_dir(&self, target: &Path) -> Result<PathBuf> {
        match &self.environment.share_dir {
            Some(dir) if dir.is_dir() => Ok(dir.clone()),
            Some(dir) => Err(Error::GenericError(format!(
                "SHARE_ROOT_DIR doesn't exist, {}",
                dir.display()
            ))),
            None if self.is_automated() => Err(Error::GenericError(
                "SHARE_ROOT_DIR is required in automated builds".into(),
            )),
            None => Ok(target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(environment: RunEnvironment) -> Settings {
        Settings::new(PipelineConfig::default(), environment)
    }

    #[test]
    fn local_runs_default_version_and_build_number() {
        let s = settings(RunEnvironment::default());
        assert_eq!(s.game_version().unwrap(), "0.0.1");
        assert_eq!(s.build_number().unwrap(), "1");
    }

    #[test]
    fn automated_runs_require_version_and_build_number() {
        let s = settings(RunEnvironment {
            automated: true,
            ..Default::default()
        });
        assert!(s.game_version().is_err());
        assert!(s.build_number().is_err());
    }

    #[test]
    fn version_is_trimmed_of_line_breaks() {
        let s = settings(RunEnvironment {
            game_version: Some("1.2.3\r\n".into()),
            ..Default::default()
        });
        assert_eq!(s.game_version().unwrap(), "1.2.3");
    }

    #[test]
    fn local_share_dir_falls_back_to_target_parent() {
        let s = settings(RunEnvironment::default());
        assert_eq!(
            s.share_dir(Path::new("/out/Game.xcode_ios")).unwrap(),
            PathBuf::from("/out")
        );
    }
}
