//! Multi-channel build fan-out for game-engine native projects
//!
//! This library turns a single Android or iOS export into one signed
//! artifact per distribution channel:
//! - ordered pre/post build hooks around the engine compile
//! - per-channel SDK injection, manifest and project rewriting
//! - signing, packaging and per-channel artifact naming
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
