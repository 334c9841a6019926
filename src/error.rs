//! Error types for the command line layer.
//!
//! Pipeline failures arrive as [`crate::bundler::Error`] and are wrapped; the
//! CLI adds argument and report errors of its own.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type of the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A file the CLI writes couldn't be created
    #[error("Can't write {}: {reason}", path.display())]
    Output {
        /// File being written
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Actionable hints for this error, printed after the message.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error as E;
        match self {
            Self::Bundler(E::UnknownChannel { .. }) => vec![
                "Check CH_BUILD_LIST against the CH_BUILD_ID column of the channel table".into(),
            ],
            Self::Bundler(E::NoHook { .. }) => {
                vec!["Register at least one pre-build and one post-build hook".into()]
            }
            Self::Bundler(E::MissingSdk { .. }) => {
                vec!["Check CHANNEL_SDKS and the shared SDK repository checkout".into()]
            }
            Self::Bundler(E::Command { .. }) => vec![
                "Check the command templates in bundler.toml and the toolchain on PATH".into(),
            ],
            Self::Bundler(E::SigningMaterial { .. } | E::ProfileMismatch { .. }) => vec![
                "Check the channel's provisioning directory and installed credentials".into(),
            ],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_keep_their_message() {
        let err = BundlerError::from(crate::bundler::Error::UnknownChannel {
            ids: vec!["Z".into()],
        });
        assert_eq!(err.to_string(), "channels not in channel config table: Z");
        assert_eq!(err.recovery_suggestions().len(), 1);
    }
}
