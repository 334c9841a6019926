//! Build request: what is being built, for which platform, and where to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target platform of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android native project (Ant/Eclipse layout)
    Android,
    /// iOS Xcode project
    Ios,
    /// Desktop player, no channel fan-out
    Desktop,
}

impl Platform {
    /// Extension of the per-channel artifact.
    pub fn artifact_extension(&self) -> Option<&'static str> {
        match self {
            Self::Android => Some("apk"),
            Self::Ios => Some("ipa"),
            Self::Desktop => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Android => f.write_str("Android"),
            Self::Ios => f.write_str("iOS"),
            Self::Desktop => f.write_str("Desktop"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            "desktop" | "win32" | "standalone" => Ok(Self::Desktop),
            other => Err(format!(
                "Invalid platform: {other}. Valid platforms: android, ios, desktop"
            )),
        }
    }
}

/// Native build configuration, used to pick signing material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildConfiguration {
    /// Development signing
    Debug,
    /// Distribution signing
    Release,
}

impl BuildConfiguration {
    /// Both configurations, in the order they are configured in Xcode projects.
    pub const ALL: [BuildConfiguration; 2] = [Self::Debug, Self::Release];

    /// Configuration name as it appears in file names and Xcode projects.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Engine build option flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Development player
    pub development: bool,
    /// Script debugging enabled
    pub allow_debugging: bool,
    /// Auto-connect the profiler
    pub connect_profiler: bool,
    /// Assertions compiled in even for non-development players
    pub force_assertions: bool,
    /// Export a native project instead of a finished package
    pub accept_external_modifications: bool,
}

impl BuildOptions {
    /// Options for a debug build: development, debugging and profiler.
    pub fn debug() -> Self {
        Self {
            development: true,
            allow_debugging: true,
            connect_profiler: true,
            ..Default::default()
        }
    }
}

/// A single pipeline invocation's request.
///
/// Created once at invocation time and never mutated during the run.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    platform: Platform,
    target: PathBuf,
    options: BuildOptions,
    scenes: Vec<String>,
}

impl BuildRequest {
    /// Creates a new request.
    pub fn new(platform: Platform, target: PathBuf, options: BuildOptions, scenes: Vec<String>) -> Self {
        Self {
            platform,
            target,
            options,
            scenes,
        }
    }

    /// Target platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Final artifact output path, e.g. `target/Android/Game.apk`.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Engine build options as requested.
    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Engine scene list.
    pub fn scenes(&self) -> &[String] {
        &self.scenes
    }

    /// Directory the engine exports the native project into.
    ///
    /// Android exports beside the target with a `_prj` suffix; other
    /// platforms export directly at the target path.
    pub fn project_dir(&self) -> PathBuf {
        match self.platform {
            Platform::Android => {
                let mut name = self.target.as_os_str().to_owned();
                name.push("_prj");
                PathBuf::from(name)
            }
            _ => self.target.clone(),
        }
    }

    /// Options handed to the engine compile step.
    pub fn compile_options(&self, release_version: bool) -> BuildOptions {
        let mut options = self.options;
        if !release_version {
            options.force_assertions = true;
        }
        if self.platform == Platform::Android {
            options.accept_external_modifications = true;
        }
        options
    }
}
