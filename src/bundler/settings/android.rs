//! Android toolchain settings.
//!
//! External tools are invoked through handlebars command templates so the
//! exact command lines stay configurable per build machine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Android fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AndroidSettings {
    /// Android SDK root. Overridden by `ANDROID_SDK`.
    pub sdk_root: Option<PathBuf>,

    /// Aggregator module that references every channel SDK module.
    pub channel_sdk_module: String,

    /// Module holding `GameActivity.java` with the lifecycle placeholder.
    pub common_module: String,

    /// Directory name prefix of injected SDK modules.
    pub sdk_module_prefix: String,

    /// Java package of the generated `ChannelSdkGen` class.
    pub channel_sdk_package: String,

    /// Package prefix of SDK entry classes; the SDK name is appended lowercased.
    pub sdk_class_package_prefix: String,

    /// Unsigned/aligned APK produced inside the main module, relative to it.
    pub release_apk: PathBuf,

    /// Default signing identity.
    pub keystore: KeystoreSettings,

    /// Toolchain command templates.
    pub commands: AndroidCommands,
}

impl Default for AndroidSettings {
    fn default() -> Self {
        Self {
            sdk_root: None,
            channel_sdk_module: "ChannelSdk".into(),
            common_module: "AndroidCommon".into(),
            sdk_module_prefix: "SdkCH-".into(),
            channel_sdk_package: "net.comtavie.channelsdk".into(),
            sdk_class_package_prefix: "net.comtavie.channel".into(),
            release_apk: PathBuf::from("bin/Game-release.apk"),
            keystore: KeystoreSettings::default(),
            commands: AndroidCommands::default(),
        }
    }
}

/// Keystore used when a channel has no `_keystore` directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct KeystoreSettings {
    /// Keystore path; defaults to `SharedLibraries/Libs/keystore/android.keystore`.
    pub path: Option<PathBuf>,
    /// Store password
    pub storepass: String,
    /// Key alias
    pub alias: String,
}

impl Default for KeystoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            storepass: "123456".into(),
            alias: "android.keystore".into(),
        }
    }
}

/// Android command templates.
///
/// Variables available to every template: `sdk_root`, `android` (the
/// `tools/android` binary). Per-template variables are listed on each field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AndroidCommands {
    /// Configure the main module: `path`, `name`.
    pub update_project: String,
    /// Configure a library module: `path`.
    pub update_lib_project: String,
    /// Merge manifests: `main`, `lib`, `out`.
    pub merge_manifest: String,
    /// Build the release APK in the main module.
    pub build: String,
    /// List keystore entries: `keystore`, `storepass`.
    pub keytool_list: String,
    /// Sign in `<main>/bin`: `keystore`, `storepass`, `alias`.
    pub sign: String,
    /// Align in `<main>/bin`: `zipalign`.
    pub align: String,
}

impl Default for AndroidCommands {
    fn default() -> Self {
        Self {
            update_project: r#""{{android}}" update project --path "{{path}}" --name {{name}}"#
                .into(),
            update_lib_project: r#""{{android}}" update lib-project --path "{{path}}""#.into(),
            merge_manifest: concat!(
                r#"java -cp "{{sdk_root}}/tools/lib/manifest-merger.jar" "#,
                r#"com.android.manifmerger.Merger --main "{{main}}" --libs "{{lib}}" "#,
                r#"--out "{{out}}" --log INFO"#
            )
            .into(),
            build: "ant release -Djava.source=7 -Djava.target=7".into(),
            keytool_list: r#"keytool -list -keystore "{{keystore}}" -storepass {{storepass}}"#
                .into(),
            sign: concat!(
                r#"jarsigner -verbose -digestalg SHA1 -sigalg MD5withRSA -keystore "{{keystore}}" "#,
                r#"-storepass {{storepass}} -signedjar Game-release-unaligned.apk "#,
                r#"Game-release-unsigned.apk {{alias}}"#
            )
            .into(),
            align: r#""{{zipalign}}" -f -v 4 Game-release-unaligned.apk Game-release.apk"#.into(),
        }
    }
}
