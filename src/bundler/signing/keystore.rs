//! Android keystores.

use super::{SigningManager, find_file_by_pattern};
use crate::bundler::command::ErrorPolicy;
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::Platform;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static KEYSTORE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.keystore$").expect("invalid keystore pattern"));

static PRIVATE_KEY_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^,]+), \d+-\d+-\d+, PrivateKeyEntry,").expect("invalid keytool pattern")
});

/// Signing identity of an APK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystore {
    /// Keystore file
    pub path: PathBuf,
    /// Store password
    pub storepass: String,
    /// Key alias
    pub alias: String,
}

impl SigningManager<'_> {
    /// Keystore for an Android channel.
    ///
    /// A channel ships its own as `_keystore/<storepass>.keystore`; the
    /// alias is the first `PrivateKeyEntry` listed by keytool. Channels
    /// without one use the configured default.
    pub async fn resolve_keystore(&self, channel_id: &str) -> Result<Keystore> {
        let dir = self
            .settings
            .layout()
            .channel_dir(Platform::Android, channel_id)
            .join("_keystore");

        let Some((path, storepass)) = find_file_by_pattern(&dir, &KEYSTORE_FILE).await? else {
            let defaults = &self.settings.android().keystore;
            let keystore = Keystore {
                path: self.settings.default_keystore(),
                storepass: defaults.storepass.clone(),
                alias: defaults.alias.clone(),
            };
            log::info!("Sign with default keystore {}", keystore.path.display());
            return Ok(keystore);
        };

        let data = BTreeMap::from([
            ("keystore", path.display().to_string()),
            ("storepass", storepass.clone()),
        ]);
        let listing = self
            .runner
            .run_template(
                &self.settings.android().commands.keytool_list,
                &data,
                None,
                ErrorPolicy::Fatal,
            )
            .await?;

        let alias = listing
            .lines
            .iter()
            .find_map(|line| PRIVATE_KEY_ENTRY.captures(line).map(|caps| caps[1].to_string()))
            .ok_or_else(|| Error::SigningMaterial {
                path: path.clone(),
                reason: "can't get alias from keystore".into(),
            })?;

        log::info!("Sign with keystore {} (alias {})", path.display(), alias);
        Ok(Keystore {
            path,
            storepass,
            alias,
        })
    }
}
