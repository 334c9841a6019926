//! PKCS#12 credentials and certificates.

use super::{SigningManager, find_file_by_pattern};
use crate::bundler::command::ErrorPolicy;
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::BuildConfiguration;
use regex::Regex;
use std::collections::BTreeMap;

fn friendly_name(dump: &str, kind: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r"friendlyName: (iPhone \b{kind}\b: [^\(]+ \([A-Z0-9]+\))"
    ))
    .ok()?;
    re.captures(dump).map(|caps| caps[1].to_string())
}

/// Extracts the certificate name for `config` from a PKCS#12 text dump.
///
/// Debug wants a Developer certificate, Release a Distribution one. A
/// Release lookup falls back to Developer with a warning, since some
/// channels ship a development credential for release builds.
pub fn certificate_name(dump: &str, config: BuildConfiguration) -> Option<String> {
    match config {
        BuildConfiguration::Debug => friendly_name(dump, "Developer"),
        BuildConfiguration::Release => friendly_name(dump, "Distribution").or_else(|| {
            let name = friendly_name(dump, "Developer")?;
            log::warn!("No distribution certificate in release credential, using {name}");
            Some(name)
        }),
    }
}

impl SigningManager<'_> {
    /// Installs `<Config>_<passphrase>.p12` of a channel and returns the
    /// certificate name it holds.
    pub async fn install_credential(
        &self,
        channel_id: &str,
        config: BuildConfiguration,
    ) -> Result<String> {
        let dir = self.provisioning_dir(channel_id);
        let pattern = Regex::new(&format!(r"^{}_(.*)\.p12$", config.name()))?;
        let (p12, passphrase) = find_file_by_pattern(&dir, &pattern)
            .await?
            .ok_or_else(|| Error::SigningMaterial {
                path: dir.clone(),
                reason: format!("can't find p12 file by {}", pattern.as_str()),
            })?;

        let commands = &self.settings.ios().commands;
        let data = BTreeMap::from([
            ("p12", p12.display().to_string()),
            ("passphrase", passphrase),
        ]);

        // openssl writes progress to stderr even on success.
        let dump = self
            .runner
            .run_template(&commands.pkcs12_dump, &data, None, ErrorPolicy::Ignore)
            .await?;
        let name = certificate_name(&dump.text(), config).ok_or_else(|| Error::SigningMaterial {
            path: p12.clone(),
            reason: "can't get friendlyName from p12 file".into(),
        })?;
        log::info!("Certificate name: {name}");

        self.runner
            .run_template(&commands.import_credential, &data, None, ErrorPolicy::Fatal)
            .await?;
        log::info!("✓ Installed {} credential for channel {}", config, channel_id);
        Ok(name)
    }

    /// Imports the optional `<Config>.cer` of a channel.
    pub async fn install_certificate(
        &self,
        channel_id: &str,
        config: BuildConfiguration,
    ) -> Result<()> {
        let cer = self
            .provisioning_dir(channel_id)
            .join(format!("{}.cer", config.name()));
        if !cer.is_file() {
            log::warn!(".cer file doesn't exist, ignore: {}", cer.display());
            return Ok(());
        }

        let data = BTreeMap::from([("cer", cer.display().to_string())]);
        self.runner
            .run_template(
                &self.settings.ios().commands.import_certificate,
                &data,
                None,
                ErrorPolicy::Ignore,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISTRIBUTION: &str = "Bag Attributes\n    friendlyName: iPhone Distribution: Studio Ltd (ABCDE12345)\n";
    const DEVELOPER: &str = "Bag Attributes\n    friendlyName: iPhone Developer: Jo Smith (XYZ9876543)\n";

    #[test]
    fn release_prefers_distribution() {
        let dump = format!("{DEVELOPER}{DISTRIBUTION}");
        assert_eq!(
            certificate_name(&dump, BuildConfiguration::Release).as_deref(),
            Some("iPhone Distribution: Studio Ltd (ABCDE12345)")
        );
    }

    #[test]
    fn release_falls_back_to_developer() {
        assert_eq!(
            certificate_name(DEVELOPER, BuildConfiguration::Release).as_deref(),
            Some("iPhone Developer: Jo Smith (XYZ9876543)")
        );
    }

    #[test]
    fn debug_never_takes_distribution() {
        assert!(certificate_name(DISTRIBUTION, BuildConfiguration::Debug).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_p12_is_signing_material_error() {
        use crate::bundler::command::CommandRunner;
        use crate::bundler::settings::PipelineConfig;

        let tmp = tempfile::TempDir::new().unwrap();
        let settings = super::super::tests::settings(tmp.path(), PipelineConfig::default());
        let runner = CommandRunner::new(settings.runner());
        let err = SigningManager::new(&settings, &runner)
            .install_credential("alpha", BuildConfiguration::Release)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SigningMaterial { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_cer_is_only_a_warning() {
        use crate::bundler::command::CommandRunner;
        use crate::bundler::settings::PipelineConfig;

        let tmp = tempfile::TempDir::new().unwrap();
        let settings = super::super::tests::settings(tmp.path(), PipelineConfig::default());
        let runner = CommandRunner::new(settings.runner());
        SigningManager::new(&settings, &runner)
            .install_certificate("alpha", BuildConfiguration::Debug)
            .await
            .unwrap();
    }
}
