//! Channel fan-out over an exported native project.
//!
//! The engine exports one Android or Xcode project per run. This module
//! prepares it once, then rewrites and packages it once per selected
//! channel:
//!
//! 1. [`prepare`] - one-time fixes and pristine copies of rewritten files
//! 2. [`android`] / [`ios`] - per-channel overlay, signing and packaging
//! 3. [`sdk`] - channel SDK modules in dependency order
//! 4. [`checksum`] - size and SHA-256 of each artifact
//!
//! [`ChannelFanoutBuilder`] drives the loop.

pub mod android;
mod checksum;
pub mod ios;
mod orchestrator;
pub mod prepare;
pub mod sdk;

pub use android::AndroidFanout;
pub use checksum::{calculate_sha256, describe_artifact};
pub use ios::IosFanout;
pub use orchestrator::ChannelFanoutBuilder;
pub use sdk::{SdkArena, SdkModule};
