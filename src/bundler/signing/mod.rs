//! Per-channel signing material.
//!
//! iOS credentials, certificates and provisioning profiles live in
//! `<channels_ios>/<id>/mobileprovision`, Android keystores in
//! `<channels_android>/<id>/_keystore`. Material is resolved fresh for every
//! channel and never cached across channels.

mod credential;
mod keystore;
mod profile;

pub use credential::certificate_name;
pub use keystore::Keystore;
pub use profile::ProvisioningProfile;

use crate::bundler::command::CommandRunner;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::{BuildConfiguration, Platform, Settings};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Everything needed to sign one channel in one build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    /// Keychain certificate name, e.g. `iPhone Distribution: Studio (ABCDE12345)`
    pub certificate_name: String,
    /// Provisioning profile UUID
    pub profile_uuid: String,
    /// Provisioning profile display name
    pub profile_name: String,
    /// Team identifier
    pub team_id: String,
}

/// Locates and installs signing material for channels.
pub struct SigningManager<'a> {
    settings: &'a Settings,
    runner: &'a CommandRunner,
}

impl<'a> SigningManager<'a> {
    /// Creates a manager over the run's settings and command runner.
    pub fn new(settings: &'a Settings, runner: &'a CommandRunner) -> Self {
        Self { settings, runner }
    }

    /// `<channels_ios>/<id>/mobileprovision`
    pub fn provisioning_dir(&self, channel_id: &str) -> PathBuf {
        self.settings
            .layout()
            .channel_dir(Platform::Ios, channel_id)
            .join("mobileprovision")
    }

    /// Path of `<Config>.mobileprovision` for a channel.
    pub fn profile_path(&self, channel_id: &str, config: BuildConfiguration) -> PathBuf {
        self.provisioning_dir(channel_id)
            .join(format!("{}.mobileprovision", config.name()))
    }

    /// Installs the credential, certificate and profile of `config`.
    ///
    /// The profile is checked against `package` when one is given.
    pub async fn resolve_identity(
        &self,
        channel_id: &str,
        config: BuildConfiguration,
        package: Option<&str>,
    ) -> Result<SigningIdentity> {
        let certificate_name = self.install_credential(channel_id, config).await?;
        self.install_certificate(channel_id, config).await?;

        let profile_path = self.profile_path(channel_id, config);
        if !profile_path.is_file() {
            return Err(Error::SigningMaterial {
                path: profile_path,
                reason: format!("can't find channel {} provisioning profile", config),
            });
        }
        let profile = self.install_profile(&profile_path, package).await?;

        Ok(SigningIdentity {
            certificate_name,
            profile_uuid: profile.uuid,
            profile_name: profile.name,
            team_id: profile.team_id,
        })
    }
}

/// First file in `dir` (sorted by name) whose name matches `pattern`,
/// with the pattern's first capture group.
pub(crate) async fn find_file_by_pattern(
    dir: &Path,
    pattern: &Regex,
) -> Result<Option<(PathBuf, String)>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .fs_context("reading directory", dir)?;
    let mut matches = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading directory", dir)?
    {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(caps) = pattern.captures(name) {
            let group = caps.get(1).map_or("", |m| m.as_str()).to_string();
            matches.push((path.clone(), group));
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::settings::{PipelineConfig, RunEnvironment, SettingsBuilder};
    use tempfile::TempDir;

    pub(super) fn settings(root: &Path, config: PipelineConfig) -> Settings {
        SettingsBuilder::new()
            .base_dir(root)
            .config(config)
            .environment(RunEnvironment::default())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn find_file_returns_first_sorted_match() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Release_b.p12"), "").unwrap();
        std::fs::write(tmp.path().join("Release_a.p12"), "").unwrap();
        std::fs::write(tmp.path().join("Debug_c.p12"), "").unwrap();

        let re = Regex::new(r"^Release_(.*)\.p12$").unwrap();
        let (path, group) = find_file_by_pattern(tmp.path(), &re).await.unwrap().unwrap();
        assert_eq!(path, tmp.path().join("Release_a.p12"));
        assert_eq!(group, "a");

        let none = find_file_by_pattern(&tmp.path().join("missing"), &re).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn resolve_identity_installs_everything() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Channels/iOS/alpha/mobileprovision");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Release_secret.p12"),
            "friendlyName: iPhone Distribution: Studio Ltd (ABCDE12345)\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("Release.mobileprovision"),
            profile::tests::profile_xml("ABCDE12345.com.studio.alpha"),
        )
        .unwrap();

        let mut config = PipelineConfig::default();
        config.ios.commands.pkcs12_dump = r#"cat "{{p12}}""#.into();
        config.ios.commands.import_credential = "true".into();
        config.ios.profile_store = Some(tmp.path().join("store"));
        let settings = settings(tmp.path(), config);
        let runner = CommandRunner::new(settings.runner());

        let identity = SigningManager::new(&settings, &runner)
            .resolve_identity("alpha", BuildConfiguration::Release, Some("com.studio.alpha"))
            .await
            .unwrap();

        assert_eq!(
            identity.certificate_name,
            "iPhone Distribution: Studio Ltd (ABCDE12345)"
        );
        assert_eq!(identity.team_id, "ABCDE12345");
        assert!(tmp
            .path()
            .join("store")
            .join(format!("{}.mobileprovision", identity.profile_uuid))
            .is_file());
    }
}
