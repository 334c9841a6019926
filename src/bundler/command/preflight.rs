//! External tool availability checking.
//!
//! Toolchain command lines are configurable, so a missing default tool is
//! only reported, never fatal: the configured templates may not use it.

use crate::bundler::settings::Platform;
use std::sync::LazyLock;

/// Tools the default Android templates invoke.
const ANDROID_TOOLS: &[&str] = &["java", "ant", "keytool", "jarsigner"];

/// Tools the default iOS templates invoke.
const IOS_TOOLS: &[&str] = &["xcodebuild", "xcrun", "openssl", "security"];

/// Whether a POSIX shell is on PATH. Cached for the process lifetime.
pub static HAS_SHELL: LazyLock<bool> = LazyLock::new(|| {
    let shell = if cfg!(windows) { "cmd" } else { "sh" };
    match which::which(shell) {
        Ok(path) => {
            log::debug!("Found {} at: {}", shell, path.display());
            true
        }
        Err(e) => {
            log::warn!("{} not found in PATH: {}. External commands will fail.", shell, e);
            false
        }
    }
});

/// Reports default toolchain binaries missing from PATH for `platform`.
///
/// Returns the missing tool names.
pub fn preflight(platform: Platform) -> Vec<&'static str> {
    let tools = match platform {
        Platform::Android => ANDROID_TOOLS,
        Platform::Ios => IOS_TOOLS,
        Platform::Desktop => &[],
    };

    let missing: Vec<&'static str> = tools
        .iter()
        .copied()
        .filter(|tool| match which::which(tool) {
            Ok(path) => {
                log::debug!("Found {} at: {}", tool, path.display());
                false
            }
            Err(_) => true,
        })
        .collect();

    if missing.is_empty() {
        log::info!("✓ {} toolchain available", platform);
    } else {
        log::warn!(
            "{} tools not found in PATH: {}. Builds using the default command templates will fail.",
            platform,
            missing.join(", ")
        );
    }
    missing
}
