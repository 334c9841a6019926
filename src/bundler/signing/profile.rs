//! Provisioning profiles.

use super::SigningManager;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::utils::fs;
use plist::{Dictionary, Value};
use std::path::Path;

/// Fields of a provisioning profile the build needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningProfile {
    /// Profile UUID, used as its installed file name
    pub uuid: String,
    /// Profile display name
    pub name: String,
    /// Team identifier
    pub team_id: String,
    /// Application identifier without the team prefix, may end in `*`
    pub app_id: String,
}

impl ProvisioningProfile {
    /// Reads a `.mobileprovision` file.
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .fs_context("reading provisioning profile", path)?;
        Self::parse(&bytes, path)
    }

    /// Parses the property list embedded in a signed profile.
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        let missing = |field: &str| Error::ProfileParse {
            path: path.to_path_buf(),
            field: field.to_string(),
        };

        let start = find(bytes, b"<?xml").ok_or_else(|| missing("property list"))?;
        let end = find(&bytes[start..], b"</plist>")
            .map(|p| start + p + b"</plist>".len())
            .ok_or_else(|| missing("property list"))?;
        let root = Value::from_reader_xml(&bytes[start..end])?;
        let dict = root
            .as_dictionary()
            .ok_or_else(|| missing("property list"))?;
        let entitlements = dict.get("Entitlements").and_then(Value::as_dictionary);

        let string = |dict: Option<&Dictionary>, key: &str| -> Result<String> {
            dict.and_then(|d| d.get(key))
                .and_then(Value::as_string)
                .map(str::to_string)
                .ok_or_else(|| missing(key))
        };

        let full_app_id = string(entitlements, "application-identifier")?;
        let app_id = match full_app_id.split_once('.') {
            Some((_, id)) => id.to_string(),
            None => return Err(missing("application-identifier")),
        };

        let team_id = string(entitlements, "com.apple.developer.team-identifier").or_else(|_| {
            dict.get("TeamIdentifier")
                .and_then(Value::as_array)
                .and_then(|ids| ids.first())
                .and_then(Value::as_string)
                .map(str::to_string)
                .ok_or_else(|| missing("com.apple.developer.team-identifier"))
        })?;

        Ok(Self {
            uuid: string(Some(dict), "UUID")?,
            name: string(Some(dict), "Name")?,
            team_id,
            app_id,
        })
    }

    /// Whether the profile covers `package`.
    ///
    /// `package` must start with the profile's application identifier, a
    /// trailing `*` dropped. The check is a plain prefix test for exact
    /// identifiers too, so `com.studio.alpha` also covers
    /// `com.studio.alphabeta`.
    pub fn matches(&self, package: &str) -> bool {
        self.app_id == package || package.starts_with(self.app_id.trim_end_matches('*'))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl SigningManager<'_> {
    /// Parses a profile, checks it against `expected_package` when given,
    /// and copies it into the profile store as `<uuid>.mobileprovision`.
    pub async fn install_profile(
        &self,
        path: &Path,
        expected_package: Option<&str>,
    ) -> Result<ProvisioningProfile> {
        if !path.is_file() {
            return Err(Error::SigningMaterial {
                path: path.to_path_buf(),
                reason: "provisioning profile doesn't exist".into(),
            });
        }
        let profile = ProvisioningProfile::read(path).await?;
        log::info!(
            "Provisioning profile {} ({}), team {}",
            profile.name,
            profile.uuid,
            profile.team_id
        );

        if let Some(package) = expected_package.filter(|p| !p.is_empty()) {
            if !profile.matches(package) {
                return Err(Error::ProfileMismatch {
                    expected: package.to_string(),
                    found: profile.app_id,
                });
            }
        }

        let store = self.settings.profile_store()?;
        let installed = store.join(format!("{}.mobileprovision", profile.uuid));
        fs::copy_file(path, &installed).await?;
        log::info!("✓ Installed provisioning profile to {}", installed.display());
        Ok(profile)
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    /// A profile as stored on disk: binary signature around an XML plist.
    pub(crate) fn profile_xml(app_id: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>Entitlements</key>
	<dict>
		<key>application-identifier</key>
		<string>{app_id}</string>
		<key>com.apple.developer.team-identifier</key>
		<string>ABCDE12345</string>
	</dict>
	<key>Name</key>
	<string>Alpha Distribution</string>
	<key>TeamIdentifier</key>
	<array>
		<string>ABCDE12345</string>
	</array>
	<key>UUID</key>
	<string>0f8fad5b-d9cb-469f-a165-70867728950e</string>
</dict>
</plist>"#
        );
        let mut bytes = vec![0x30, 0x82, 0x1d, 0x00, 0x06, 0x09];
        bytes.extend_from_slice(xml.as_bytes());
        bytes.extend_from_slice(&[0xa0, 0x82, 0x0b, 0x00]);
        bytes
    }

    #[test]
    fn parses_embedded_plist() {
        let profile =
            ProvisioningProfile::parse(&profile_xml("ABCDE12345.com.studio.*"), Path::new("p"))
                .unwrap();
        assert_eq!(profile.uuid, "0f8fad5b-d9cb-469f-a165-70867728950e");
        assert_eq!(profile.name, "Alpha Distribution");
        assert_eq!(profile.team_id, "ABCDE12345");
        assert_eq!(profile.app_id, "com.studio.*");
    }

    #[test]
    fn wildcard_and_exact_matching() {
        let wildcard =
            ProvisioningProfile::parse(&profile_xml("ABCDE12345.com.studio.*"), Path::new("p"))
                .unwrap();
        assert!(wildcard.matches("com.studio.alpha"));
        assert!(!wildcard.matches("com.other.alpha"));

        let exact =
            ProvisioningProfile::parse(&profile_xml("ABCDE12345.com.studio.alpha"), Path::new("p"))
                .unwrap();
        assert!(exact.matches("com.studio.alpha"));
        assert!(!exact.matches("com.studio.beta"));
    }

    #[test]
    fn exact_identifier_is_a_prefix_match() {
        let exact =
            ProvisioningProfile::parse(&profile_xml("ABCDE12345.com.studio.alpha"), Path::new("p"))
                .unwrap();
        assert!(exact.matches("com.studio.alphabeta"));
        assert!(exact.matches("com.studio.alpha.lite"));
        assert!(!exact.matches("com.studio.alp"));
    }

    #[test]
    fn missing_uuid_is_a_parse_error() {
        let text = String::from_utf8_lossy(&profile_xml("T.com.a"))
            .replace("<key>UUID</key>", "<key>NotUUID</key>");
        let err = ProvisioningProfile::parse(text.as_bytes(), Path::new("p")).unwrap_err();
        assert!(matches!(err, Error::ProfileParse { ref field, .. } if field == "UUID"));
    }
}
