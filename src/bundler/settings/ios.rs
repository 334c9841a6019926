//! iOS toolchain settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// iOS fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IosSettings {
    /// Xcode project directory inside the exported project.
    pub xcode_project: String,

    /// Channel config JSON inside the exported project, overlaid with `"key"` delimiters.
    pub config_json: PathBuf,

    /// Engine-side iOS plugin directory, relative to the engine project,
    /// searched for `ChannelAppController.mm`.
    pub plugins_dir: PathBuf,

    /// Provisioning profile store. Defaults to
    /// `~/Library/MobileDevice/Provisioning Profiles`.
    pub profile_store: Option<PathBuf>,

    /// Toolchain command templates.
    pub commands: IosCommands,
}

impl Default for IosSettings {
    fn default() -> Self {
        Self {
            xcode_project: "Unity-iPhone.xcodeproj".into(),
            config_json: PathBuf::from("Libraries/channel_ios.json"),
            plugins_dir: PathBuf::from("Assets/Plugins/iOS"),
            profile_store: None,
            commands: IosCommands::default(),
        }
    }
}

/// iOS command templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IosCommands {
    /// Dump a PKCS#12 bundle as text: `p12`, `passphrase`.
    pub pkcs12_dump: String,
    /// Import the credential into the keychain: `p12`, `passphrase`.
    pub import_credential: String,
    /// Import an optional certificate: `cer`.
    pub import_certificate: String,
    /// Clean the project: `project`.
    pub clean: String,
    /// Build the project: `project`.
    pub build: String,
    /// Package the app: `app`, `ipa`.
    pub package: String,
    /// Re-sign a package: `certificate`, `profile`, `ipa`, `resigned`.
    pub resign: String,
}

impl Default for IosCommands {
    fn default() -> Self {
        Self {
            pkcs12_dump: r#"openssl pkcs12 -in "{{p12}}" -nodes -passin pass:"{{passphrase}}""#.into(),
            import_credential: concat!(
                r#"security import "{{p12}}" -k login.keychain -P "{{passphrase}}" -T /usr/bin/codesign && "#,
                r#"security set-key-partition-list -S apple-tool:,apple: -s login.keychain"#
            )
            .into(),
            import_certificate: r#"security add-certificates -k login.keychain "{{cer}}""#.into(),
            clean: "xcodebuild clean -project {{project}} -configuration Release".into(),
            build: "xcodebuild -project {{project}} -configuration Release".into(),
            package: r#"xcrun -sdk iphoneos PackageApplication -v "{{app}}" -o "{{ipa}}""#.into(),
            resign: r#"AppResign -v -c "{{certificate}}" -p "{{profile}}" -n "*" "{{ipa}}" "{{resigned}}""#
                .into(),
        }
    }
}
