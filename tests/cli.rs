//! Binary-level tests driving `kodegen_bundler_channels` like a CI job does.
#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::{BUNDLER_TOML, fixture, write};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const RUN_ENV: &[&str] = &[
    "CH_BUILD_LIST",
    "BUILD_NUMBER",
    "GAME_VERSION",
    "SHARE_ROOT_DIR",
    "MINIMAL_MAIN_DEX",
    "ANDROID_SDK",
    "SERVER_BUILD",
    "EXPORT_PROJECT_ONLY",
    "RUST_LOG",
];

fn bundler() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_channels").unwrap();
    for key in RUN_ENV {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn help_lists_subcommands() {
    bundler()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fanout"))
        .stdout(predicate::str::contains("channels"));
}

#[test]
fn channels_writes_every_table_id() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::copy(
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ChannelConfigs.toml"),
        root.join("ChannelConfigs.toml"),
    )
    .unwrap();
    let output = root.join("build_list.properties");
    let log = root.join("build.log");

    bundler()
        .arg("--config")
        .arg(root.join("bundler.toml"))
        .arg("--build-log")
        .arg(&log)
        .args(["channels", "--platform", "android", "--output"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "CH_BUILD_LIST=Huawei,Xiaomi,Official"
    );
    assert!(
        fs::read_to_string(&log)
            .unwrap()
            .contains("CH_BUILD_LIST=Huawei,Xiaomi,Official")
    );
}

#[test]
fn invalid_platform_is_rejected() {
    bundler()
        .args(["channels", "--platform", "psp", "--output", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid platform: psp"));
}

#[test]
fn export_only_outside_ios_fails_validation() {
    bundler()
        .args(["fanout", "--platform", "android", "--target", "out/Game.apk"])
        .env("EXPORT_PROJECT_ONLY", "true")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("only applies to iOS"));
}

#[test]
fn fanout_reports_unknown_channels_and_keeps_built_ones() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fixture(root);
    write(&root.join("bundler.toml"), BUNDLER_TOML);
    let report = root.join("report.json");

    bundler()
        .current_dir(root)
        .arg("--config")
        .arg(root.join("bundler.toml"))
        .args(["fanout", "--platform", "android", "--target"])
        .arg(root.join("out/Game.apk"))
        .arg("--report")
        .arg(&report)
        .env("CH_BUILD_LIST", "A,Z")
        .env("SERVER_BUILD", "true")
        .env("BUILD_NUMBER", "7")
        .env("GAME_VERSION", "1.0.0")
        .env("ANDROID_SDK", root.join("android-sdk"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "channels not in channel config table: Z",
        ));

    assert!(root.join("out/Game_A.apk").is_file());
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["platform"], "android");
    let artifacts = report["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0]["channel_id"], "A");
}
