//! Engine project and channel repository layout.

use super::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the engine project, the shared SDK library and the
/// per-channel override trees.
///
/// Relative paths are resolved against the directory holding `bundler.toml`
/// when [`SettingsBuilder`](super::SettingsBuilder) builds the settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectLayout {
    /// Product name. Names the main module of the exported Android project
    /// and is normalized into `_GameVersion.sh`.
    pub app_name: String,

    /// Application identifier the engine bakes into the exported project,
    /// replaced by each channel's package name.
    pub application_id: String,

    /// Directory holding `ChannelConfigs.*` and `Channels/`.
    pub root_dir: PathBuf,

    /// Engine project root (overlay target of `_Unity`, home of `_GameVersion.sh`).
    pub engine_project_dir: PathBuf,

    /// Shared SDK/library repository.
    pub shared_libraries_dir: PathBuf,

    /// Extension of the channel table files (`toml` or `tsv`).
    pub table_extension: String,

    /// Generated build-info source, relative to the engine project.
    pub build_info_path: PathBuf,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            app_name: "Game".into(),
            application_id: "com.example.game".into(),
            root_dir: PathBuf::from("."),
            engine_project_dir: PathBuf::from("."),
            shared_libraries_dir: PathBuf::from("SharedLibraries"),
            table_extension: "toml".into(),
            build_info_path: PathBuf::from("Assets/Plugins/Common/Utils/BuildEnv_Gen.cs"),
        }
    }
}

impl ProjectLayout {
    /// Channel table for a platform: `ChannelConfigs.<ext>` or `ChannelConfigs_iOS.<ext>`.
    pub fn table_path(&self, platform: Platform) -> PathBuf {
        let stem = match platform {
            Platform::Ios => "ChannelConfigs_iOS",
            _ => "ChannelConfigs",
        };
        self.root_dir
            .join(format!("{stem}.{}", self.table_extension))
    }

    /// Per-channel override root for a platform.
    pub fn channels_dir(&self, platform: Platform) -> PathBuf {
        let sub = match platform {
            Platform::Ios => "iOS",
            _ => "Android",
        };
        self.root_dir.join("Channels").join(sub)
    }

    /// Override directory of one channel.
    pub fn channel_dir(&self, platform: Platform, id: &str) -> PathBuf {
        self.channels_dir(platform).join(id)
    }

    /// Root of the shared SDK modules.
    pub fn sdks_dir(&self) -> PathBuf {
        self.shared_libraries_dir.join("SDKs")
    }

    /// Android SDK modules, one directory per SDK name.
    pub fn android_sdks_dir(&self) -> PathBuf {
        self.sdks_dir().join("_Android")
    }

    /// Stock `ChannelActivity.java` / `ChannelApplication.java` glue.
    pub fn channel_glue_dir(&self) -> PathBuf {
        self.sdks_dir().join("ChannelSdk").join("Editor")
    }

    /// Android build fix-ups (`build_fixed.xml`, `fixed_dex.py`, main dex lists).
    pub fn build_fixed_dir(&self) -> PathBuf {
        self.shared_libraries_dir.join("Libs").join("build_fixed")
    }

    /// Keystore used when a channel ships none.
    pub fn default_keystore(&self) -> PathBuf {
        self.shared_libraries_dir
            .join("Libs")
            .join("keystore")
            .join("android.keystore")
    }

    /// Generated build-info source file.
    pub fn build_info_file(&self) -> PathBuf {
        self.engine_project_dir.join(&self.build_info_path)
    }

    /// `_GameVersion.sh` at the engine project root.
    pub fn game_version_script(&self) -> PathBuf {
        self.engine_project_dir.join("_GameVersion.sh")
    }

    /// Main module directory inside an exported Android project.
    pub fn main_module(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.app_name)
    }

    /// Product name with spaces replaced, as exported to shell scripts.
    pub fn normalized_app_name(&self) -> String {
        self.app_name.replace(' ', "_")
    }
}
