//! One-time preparation of a freshly exported native project.
//!
//! Runs once after the engine compile, before the first channel. Re-running
//! the fan-out on an already prepared project skips this.

use super::android::AndroidFanout;
use crate::bundler::command::ErrorPolicy;
use crate::bundler::context::BuildContext;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::project::plist::{INFO_PLIST, set_entries};
use crate::bundler::project::{MANIFEST, PBXPROJ, PRISTINE_SUFFIX, merge_manifest};
use crate::bundler::utils::fs;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Ant project name of the main module; names `bin/<name>-release.apk`.
pub const ANT_PROJECT_NAME: &str = "Game";

/// Placeholder in `GameActivity.java` replaced by lifecycle registrations.
pub const LIFECALLBACKS_PLACEHOLDER: &str = "__ADD_LIFECALLBACKS__";

const LIFECALLBACKS_SOURCE: &str = "ActivityLifeCallbacks.java";

static JAVA_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"package ([^;]+);").expect("invalid java package pattern"));

/// Prepares an exported ant project for per-channel builds.
pub async fn prepare_android(ctx: &BuildContext, project_dir: &Path) -> Result<()> {
    let settings = ctx.settings();
    let layout = settings.layout();
    let android = settings.android();
    let fanout = AndroidFanout::new(ctx, project_dir)?;
    let main = layout.main_module(project_dir);
    let modules = fs::subdirectories(project_dir).await?;

    log::info!("Update Android project");
    for module in &modules {
        fs::create_dir_all(&module.join("src"), false).await?;

        if *module == main {
            let mut data = fanout.vars().clone();
            data.insert("path", module.display().to_string());
            data.insert("name", ANT_PROJECT_NAME.to_string());
            ctx.runner()
                .run_template(&android.commands.update_project, &data, None, ErrorPolicy::Fatal)
                .await?;
        } else {
            let unity_classes = main.join("libs").join("unity-classes.jar");
            if unity_classes.is_file() {
                fs::copy_file(&unity_classes, &module.join("libs").join("unity-classes.jar"))
                    .await?;
            }
            move_assets_to_main(module, &main).await?;

            let mut data = fanout.vars().clone();
            data.insert("path", module.display().to_string());
            ctx.runner()
                .run_template(&android.commands.update_lib_project, &data, None, ErrorPolicy::Fatal)
                .await?;
        }

        let manifest = module.join(MANIFEST);
        if manifest.is_file() {
            fs::copy_file(&manifest, &fs::with_suffix(&manifest, PRISTINE_SUFFIX)).await?;
        }
    }

    log::info!("Merge base library manifests");
    let main_pristine = fs::with_suffix(&main.join(MANIFEST), PRISTINE_SUFFIX);
    for module in modules.iter().filter(|m| **m != main) {
        if module.join(MANIFEST).is_file() {
            merge_manifest(
                ctx.runner(),
                &android.commands.merge_manifest,
                fanout.vars(),
                &main_pristine,
                module,
            )
            .await?;
        }
    }

    install_build_fixes(ctx, &main).await?;
    register_lifecycle_callbacks(project_dir, &modules, &main, &android.common_module).await?;
    log::info!("✓ Prepared Android project {}", project_dir.display());
    Ok(())
}

async fn move_assets_to_main(module: &Path, main: &Path) -> Result<()> {
    let assets = module.join("assets");
    if !assets.is_dir() {
        return Ok(());
    }
    let mut entries = tokio::fs::read_dir(&assets)
        .await
        .fs_context("reading directory", &assets)?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading directory", &assets)?
    {
        let dest = main.join("assets").join(entry.file_name());
        fs::create_dir_all(&main.join("assets"), false).await?;
        tokio::fs::rename(entry.path(), &dest)
            .await
            .fs_context("moving asset", entry.path())?;
    }
    Ok(())
}

/// Appends the `build_fixed.xml` fragment to `build.xml` and ships the
/// dex helpers.
async fn install_build_fixes(ctx: &BuildContext, main: &Path) -> Result<()> {
    let fixed_dir = ctx.settings().layout().build_fixed_dir();

    log::info!("Add build_fixed.xml into build.xml");
    let build_xml = main.join("build.xml");
    let mut lines = tokio::fs::read_to_string(&build_xml)
        .await
        .fs_context("reading build.xml", &build_xml)?;
    let fixed_xml = fixed_dir.join("build_fixed.xml");
    let fixed = tokio::fs::read_to_string(&fixed_xml)
        .await
        .fs_context("reading build fix fragment", &fixed_xml)?;
    let pos = lines
        .rfind("</project>")
        .filter(|&pos| pos > 0)
        .ok_or_else(|| Error::GenericError("Can't find \"</project>\" in build.xml".into()))?;
    lines.insert_str(pos, &fixed);
    tokio::fs::write(&build_xml, lines)
        .await
        .fs_context("writing build.xml", &build_xml)?;

    fs::copy_file(&fixed_dir.join("fixed_dex.py"), &main.join("fixed_dex.py")).await?;

    let dex_list = if ctx.settings().environment().minimal_main_dex {
        "min_main_dex_list_starts_with.txt"
    } else {
        "main_dex_list_starts_with.txt"
    };
    log::info!("Add {dex_list}");
    fs::copy_file(
        &fixed_dir.join("main_dex_list_starts_with.txt"),
        &main.join(dex_list),
    )
    .await
}

/// Replaces the lifecycle placeholder in the common module's
/// `GameActivity.java` with one registration per library module that ships
/// an `ActivityLifeCallbacks` class. Returns the registered packages.
pub async fn register_lifecycle_callbacks(
    project_dir: &Path,
    modules: &[std::path::PathBuf],
    main: &Path,
    common_module: &str,
) -> Result<Vec<String>> {
    let mut packages = Vec::new();
    for module in modules {
        if module == main || fs::file_name(module) == common_module {
            continue;
        }
        let path = module.join("src").join(LIFECALLBACKS_SOURCE);
        if !path.is_file() {
            continue;
        }
        let source = tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading lifecycle callbacks", &path)?;
        let package = JAVA_PACKAGE
            .captures(&source)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                Error::GenericError(format!("no package declaration in {}", path.display()))
            })?;
        packages.push(package);
    }
    log::info!("ActivityLifeCallbacks:\n\t{}", packages.join("\n\t"));

    let game_activity = project_dir
        .join(common_module)
        .join("src")
        .join("GameActivity.java");
    if !game_activity.is_file() {
        log::debug!("No {}, skipping lifecycle callbacks", game_activity.display());
        return Ok(packages);
    }

    let registrations: Vec<String> = packages
        .iter()
        .map(|name| {
            format!(
                "addLifeCallbacks((LifeCallbacks) Class.forName(\"{name}.ActivityLifeCallbacks\").newInstance());"
            )
        })
        .collect();
    let content = tokio::fs::read_to_string(&game_activity)
        .await
        .fs_context("reading GameActivity", &game_activity)?;
    if !content.contains(LIFECALLBACKS_PLACEHOLDER) {
        return Err(Error::GenericError(format!(
            "{LIFECALLBACKS_PLACEHOLDER} not found in {}",
            game_activity.display()
        )));
    }
    tokio::fs::write(
        &game_activity,
        content.replace(LIFECALLBACKS_PLACEHOLDER, &registrations.join("\n")),
    )
    .await
    .fs_context("writing GameActivity", &game_activity)?;
    Ok(packages)
}

/// Prepares an exported Xcode project: placeholder identifiers in
/// Info.plist and pristine copies of every file the fan-out rewrites.
pub async fn prepare_ios(ctx: &BuildContext, project_dir: &Path) -> Result<()> {
    let ios = ctx.settings().ios();
    let plist = project_dir.join(INFO_PLIST);
    set_entries(
        &plist,
        &[
            ("CFBundleIdentifier", "PACKAGE_NAME".into()),
            ("ChannelSdk", "CHANNEL_SDKS".into()),
        ],
    )?;

    let pbxproj = project_dir.join(&ios.xcode_project).join(PBXPROJ);
    for path in [plist, project_dir.join(&ios.config_json), pbxproj] {
        if path.is_file() {
            fs::copy_file(&path, &fs::with_suffix(&path, PRISTINE_SUFFIX)).await?;
        } else {
            log::warn!("{} doesn't exist, nothing to back up", path.display());
        }
    }
    log::info!("✓ Prepared Xcode project {}", project_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lifecycle_callbacks_are_registered() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path();
        let write = |rel: &str, text: &str| {
            let path = project.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        };
        write(
            "AndroidCommon/src/GameActivity.java",
            "void onCreate() {\n__ADD_LIFECALLBACKS__\n}\n",
        );
        write(
            "Push/src/ActivityLifeCallbacks.java",
            "package com.studio.push;\nclass ActivityLifeCallbacks {}\n",
        );
        write("Game/src/ActivityLifeCallbacks.java", "package com.main;\n");

        let modules = vec![
            project.join("AndroidCommon"),
            project.join("Game"),
            project.join("Push"),
        ];
        let packages =
            register_lifecycle_callbacks(project, &modules, &project.join("Game"), "AndroidCommon")
                .await
                .unwrap();
        assert_eq!(packages, vec!["com.studio.push"]);

        let activity =
            std::fs::read_to_string(project.join("AndroidCommon/src/GameActivity.java")).unwrap();
        assert!(activity.contains(
            "addLifeCallbacks((LifeCallbacks) Class.forName(\"com.studio.push.ActivityLifeCallbacks\").newInstance());"
        ));
        assert!(!activity.contains(LIFECALLBACKS_PLACEHOLDER));
    }

    #[tokio::test]
    async fn missing_placeholder_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("AndroidCommon/src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("GameActivity.java"), "class GameActivity {}").unwrap();

        let modules = vec![tmp.path().join("AndroidCommon")];
        assert!(
            register_lifecycle_callbacks(tmp.path(), &modules, &tmp.path().join("Game"), "AndroidCommon")
                .await
                .is_err()
        );
    }
}
