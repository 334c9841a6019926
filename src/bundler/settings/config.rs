//! `bundler.toml` pipeline configuration.

use super::{AndroidSettings, IosSettings, ProjectLayout};
use crate::bundler::error::{Error, ErrorExt, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "bundler.toml";

/// Whole pipeline configuration. Every section is optional.
///
/// ```toml
/// [project]
/// app-name = "Game"
/// shared-libraries-dir = "../SharedLibraries"
///
/// [android.commands]
/// build = "ant release"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Project layout
    pub project: ProjectLayout,
    /// Android toolchain
    pub android: AndroidSettings,
    /// iOS toolchain
    pub ios: IosSettings,
    /// Engine compile step
    pub engine: EngineSettings,
    /// External command execution
    pub runner: RunnerSettings,
}

impl PipelineConfig {
    /// Reads and parses a config file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading pipeline config", path)?;
        toml::from_str(&text).map_err(|e| Error::ConfigFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Engine compile step settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineSettings {
    /// Command template exporting the native project. Variables: `project`
    /// (engine project dir), `platform`, `output` (project dir to export),
    /// `scenes` (comma separated), `development`.
    pub command: Option<String>,

    /// Release builds do not force assertions on.
    pub release_version: bool,
}

/// How the runner learns that a child process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitWait {
    /// Await the child's exit status.
    Signal,
    /// Poll the pid for liveness, with a bounded wait after output EOF.
    PollPid,
}

impl Default for ExitWait {
    fn default() -> Self {
        if cfg!(windows) {
            Self::PollPid
        } else {
            Self::Signal
        }
    }
}

/// External command execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunnerSettings {
    /// Exit detection strategy
    pub exit_wait: ExitWait,
    /// Liveness poll interval for [`ExitWait::PollPid`]
    pub poll_interval_ms: u64,
    /// Maximum wait after both output streams closed, for [`ExitWait::PollPid`]
    pub max_exit_wait_ms: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            exit_wait: ExitWait::default(),
            poll_interval_ms: 500,
            max_exit_wait_ms: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.project.app_name, "Game");
        assert_eq!(config.android.sdk_module_prefix, "SdkCH-");
        assert_eq!(config.runner.max_exit_wait_ms, 2000);
    }

    #[test]
    fn sections_are_kebab_case() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [project]
            app-name = "Space Game"

            [android.commands]
            build = "true"

            [runner]
            exit-wait = "poll-pid"
            "#,
        )
        .unwrap();
        assert_eq!(config.project.app_name, "Space Game");
        assert_eq!(config.android.commands.build, "true");
        assert_eq!(config.runner.exit_wait, ExitWait::PollPid);
        assert!(config.android.commands.sign.contains("jarsigner"));
    }
}
