//! End-to-end Android fan-out with shell stubs standing in for the toolchain.
#![cfg(unix)]

mod common;

use common::{MAIN_MANIFEST, fixture};
use kodegen_bundler_channels::bundler::{
    BuildContext, BuildOptions, BuildRequest, ChannelFanoutBuilder, Error, PipelineConfig,
    Platform, RunEnvironment, SettingsBuilder,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config() -> PipelineConfig {
    toml::from_str(common::BUNDLER_TOML).unwrap()
}

async fn context(root: &Path, channels: &str) -> BuildContext {
    let environment = RunEnvironment {
        channels: Some(channels.into()),
        build_number: Some("7".into()),
        game_version: Some("1.0.0".into()),
        android_sdk: Some(root.join("android-sdk")),
        automated: true,
        ..Default::default()
    };
    let settings = SettingsBuilder::new()
        .base_dir(root)
        .config(config())
        .environment(environment)
        .build()
        .unwrap();
    let request = BuildRequest::new(
        Platform::Android,
        root.join("out/Game.apk"),
        BuildOptions::default(),
        vec![],
    );
    BuildContext::load(settings, request).await.unwrap()
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[tokio::test]
async fn each_selected_channel_gets_its_own_apk() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fixture(root);

    let ctx = context(root, "A,B").await;
    let artifacts = ChannelFanoutBuilder::new(&ctx).build_all().await.unwrap();

    let ids: Vec<&str> = artifacts.iter().map(|a| a.channel_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(ctx.artifacts(), artifacts);

    let apk_a = read(root.join("out/Game_A.apk"));
    assert!(apk_a.contains(r#"package="com.game.a""#));
    assert!(apk_a.contains(r#"android:value="channel_a""#));
    assert!(apk_a.contains("channel A strings"));

    let apk_b = read(root.join("out/Game_B.apk"));
    assert!(apk_b.contains(r#"package="com.game.b""#));
    assert!(apk_b.contains(r#"android:value="channel_b""#));
    assert!(apk_b.contains("stock strings"));
    assert!(!apk_b.contains("com.game.a"));

    for artifact in &artifacts {
        assert_eq!(artifact.sha256.len(), 64);
        assert_eq!(artifact.size, fs::metadata(&artifact.path).unwrap().len());
    }
}

#[tokio::test]
async fn previous_channel_state_is_reset() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fixture(root);

    let ctx = context(root, "A,B").await;
    ChannelFanoutBuilder::new(&ctx).build_all().await.unwrap();

    let project = root.join("out/Game.apk_prj");
    assert!(!project.join("SdkCH-Pay").exists());
    assert!(!project.join("Game/assets/pay.cfg").exists());
    assert!(project.join("Game/assets/game.dat").exists());
    assert!(!read(project.join("Game/project.properties")).contains("SdkCH-Pay"));
    assert!(!read(project.join("ChannelSdk/project.properties")).contains("SdkCH-Pay"));
    assert_eq!(read(project.join("Game/res/strings.xml")), "stock strings");
    assert_eq!(
        read(project.join("Game/AndroidManifest.xml.original")),
        MAIN_MANIFEST
    );

    let aggregator = project.join("ChannelSdk/src");
    assert_eq!(read(aggregator.join("ChannelActivity.java")), "activity");
    assert!(!read(aggregator.join("ChannelSdkGen.java")).contains("registerSdk("));
}

#[tokio::test]
async fn sdk_modules_are_injected_and_referenced() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fixture(root);

    let ctx = context(root, "A").await;
    ChannelFanoutBuilder::new(&ctx).build_all().await.unwrap();

    let project = root.join("out/Game.apk_prj");
    let module = project.join("SdkCH-Pay");
    assert!(module.join("src/Pay.java").is_file());
    assert!(module.join("src/ChannelActivity.java").is_file());
    assert!(module.join("AndroidManifest.xml.original").is_file());
    assert!(project.join("Game/assets/pay.cfg").is_file());
    assert!(
        read(project.join("Game/project.properties"))
            .contains("android.library.reference.1=../SdkCH-Pay")
    );
    assert!(
        read(project.join("ChannelSdk/src/ChannelSdkGen.java"))
            .contains("Class.forName(\"net.comtavie.channelpay.Pay\")")
    );
}

#[tokio::test]
async fn unknown_channel_is_reported_after_known_ones() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fixture(root);

    let ctx = context(root, "A,Z").await;
    let err = ChannelFanoutBuilder::new(&ctx).build_all().await.unwrap_err();

    assert!(matches!(err, Error::UnknownChannel { ref ids } if ids == &["Z".to_string()]));
    assert!(root.join("out/Game_A.apk").is_file());
    assert_eq!(ctx.artifacts().len(), 1);
}

#[tokio::test]
async fn missing_sdk_aborts_the_channel() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fixture(root);
    fs::remove_dir_all(root.join("SharedLibraries/SDKs/_Android/Pay")).unwrap();

    let ctx = context(root, "A").await;
    let err = ChannelFanoutBuilder::new(&ctx).build_all().await.unwrap_err();
    assert!(matches!(err, Error::MissingSdk { ref sdk, .. } if sdk == "Pay"));
    assert!(ctx.artifacts().is_empty());
}
