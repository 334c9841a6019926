//! Per-invocation inputs supplied by the CI job or the local user.

use std::path::PathBuf;

/// Run inputs, normally sourced from environment variables through the CLI.
#[derive(Debug, Clone, Default)]
pub struct RunEnvironment {
    /// Raw comma-separated channel list (`CH_BUILD_LIST`)
    pub channels: Option<String>,
    /// CI build number (`BUILD_NUMBER`)
    pub build_number: Option<String>,
    /// Version string (`GAME_VERSION`)
    pub game_version: Option<String>,
    /// Artifact share directory (`SHARE_ROOT_DIR`)
    pub share_dir: Option<PathBuf>,
    /// Ship the minimal main-dex list (`MINIMAL_MAIN_DEX`)
    pub minimal_main_dex: bool,
    /// Android SDK override (`ANDROID_SDK`)
    pub android_sdk: Option<PathBuf>,
    /// Automated (CI) run (`SERVER_BUILD`)
    pub automated: bool,
    /// Stop iOS fan-out after patching the project (`EXPORT_PROJECT_ONLY`)
    pub export_project_only: bool,
}
