//! Error types for the channel fan-out pipeline.
//!
//! Every variant is fatal for the run: the pipeline has no retry logic, so a
//! returned error always aborts the invocation with a non-zero exit status.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result alias used throughout the bundler core.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the engine compile a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// Before the engine compile step.
    PreBuild,
    /// After the engine compile step.
    PostBuild,
}

impl Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreBuild => f.write_str("pre-build"),
            Self::PostBuild => f.write_str("post-build"),
        }
    }
}

/// Core pipeline errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Channel table violates its format invariants.
    #[error("channel config format error in {}: {reason}", path.display())]
    ConfigFormat {
        /// Table file that failed validation
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// No hook registered for a pipeline stage.
    #[error("no {stage} hook registered")]
    NoHook {
        /// Stage with an empty hook list
        stage: HookStage,
    },

    /// Hook order collides with a reserved slot or is out of range.
    #[error("hook order {order} is reserved (0, 50 and 100 are internal, maximum is 99)")]
    ReservedHookOrder {
        /// Requested order
        order: u8,
    },

    /// Engine compile step reported an error string.
    #[error("engine compile failed: {0}")]
    Compile(String),

    /// External manifest merge tool failed.
    #[error("failed to merge manifest {} into {}: {source}", lib.display(), main.display())]
    Merge {
        /// Main manifest path
        main: PathBuf,
        /// Library manifest path
        lib: PathBuf,
        /// Underlying command failure
        #[source]
        source: Box<Error>,
    },

    /// Channel configuration names an SDK that has no module directory.
    #[error("SDK {sdk} doesn't exist, expected module at {}", path.display())]
    MissingSdk {
        /// SDK name from CHANNEL_SDKS
        sdk: String,
        /// Directory that was looked up
        path: PathBuf,
    },

    /// SDK dependency declarations form a cycle.
    #[error("SDK dependency cycle detected at {sdk}")]
    SdkDependencyCycle {
        /// SDK participating in the cycle
        sdk: String,
    },

    /// Selected channel ids absent from the channel table.
    #[error("channels not in channel config table: {}", ids.join(", "))]
    UnknownChannel {
        /// Unknown ids, in selection order
        ids: Vec<String>,
    },

    /// Selected channels use different SDK sets on a platform that can't mix them.
    #[error("building channels with different SDK sets at once is not supported on {platform}")]
    HeterogeneousSdks {
        /// Platform that refused the selection
        platform: String,
    },

    /// Xcode project file lacks a structure an edit depends on.
    #[error("unexpected Xcode project structure in {}: {reason}", path.display())]
    XcodeProject {
        /// project.pbxproj path
        path: PathBuf,
        /// What was missing
        reason: String,
    },

    /// Signing credential could not be located or parsed.
    #[error("signing material error ({}): {reason}", path.display())]
    SigningMaterial {
        /// File or directory that was searched
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Provisioning profile identifier disagrees with the package name.
    #[error("provisioning profile is for {found}, but package name is {expected}")]
    ProfileMismatch {
        /// Package name of the channel
        expected: String,
        /// Application identifier embedded in the profile
        found: String,
    },

    /// Provisioning profile lacks a required field.
    #[error("can't find {field} in provisioning profile {}", path.display())]
    ProfileParse {
        /// Profile file
        path: PathBuf,
        /// Missing field
        field: String,
    },

    /// External command failed under the fatal policy.
    #[error("command failed (exit code {exit_code:?}): {command}\n{output}")]
    Command {
        /// Rendered command line
        command: String,
        /// Exit code, when the process exit could be observed
        exit_code: Option<i32>,
        /// Full captured output
        output: String,
    },

    /// Filesystem operation failed on a specific path.
    #[error("{context} {}: {source}", path.display())]
    Fs {
        /// Operation being performed
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error with additional context.
    #[error("{context}: {source}")]
    Context {
        /// Description of what was being attempted
        context: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// IO errors
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Template rendering errors
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Property list errors
    #[error("plist error: {0}")]
    Plist(#[from] plist::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation errors
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Directory walk errors
    #[error("walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// Glob pattern errors
    #[error("glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// Path prefix errors
    #[error("path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

/// Attach path context to I/O results.
pub trait ErrorExt<T> {
    /// Converts an I/O error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Attach human-readable context to fallible values.
pub trait Context<T> {
    /// Wraps the failure with a static context message.
    fn context<C: Display>(self, context: C) -> Result<T>;

    /// Wraps the failure with a lazily built context message.
    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::Context {
            context: context.to_string(),
            source: Box::new(e),
        })
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Context {
            context: f().to_string(),
            source: Box::new(e),
        })
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
