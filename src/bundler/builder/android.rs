//! Android channel fan-out over an exported ant project.
//!
//! The exported project holds the main module (named after the app), an
//! aggregator module referencing every channel SDK, and base library
//! modules. Each channel resets the SDK modules of the previous channel,
//! injects its own, patches manifests and packages a signed, aligned APK.

use super::checksum::describe_artifact;
use super::sdk::SdkArena;
use crate::bundler::channels::{ANDROID_TARGET_SDK_KEY, Channel, PACKAGE_NAME_KEY};
use crate::bundler::command::ErrorPolicy;
use crate::bundler::context::{BuildContext, ChannelArtifact};
use crate::bundler::error::{Context, ErrorExt, Result};
use crate::bundler::project::{
    Delimiter, MANIFEST, OverlayOptions, PRISTINE_SUFFIX, add_library_reference,
    apply_key_value_overlay, merge_manifest, overlay_channel_tree, remove_library_references,
    restore_backups,
};
use crate::bundler::settings::Platform;
use crate::bundler::utils::fs;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Glue sources every SDK module and, without SDKs, the aggregator must hold.
pub const GLUE_SOURCES: [&str; 2] = ["ChannelActivity.java", "ChannelApplication.java"];

/// Generated SDK registration source inside the aggregator.
pub const CHANNEL_SDK_GEN: &str = "ChannelSdkGen.java";

const CHANNEL_SDK_GEN_TEMPLATE: &str = concat!(
    "package {{package}};\n",
    "import net.comtavie.channelsdkinterface.AbstractSdk;\n",
    "public abstract class ChannelSdkGen extends ChannelSdkBase {\n",
    "    @Override\n",
    "    protected void registerSdks() {\n",
    "        try {\n",
    "{{#each classes}}",
    "            registerSdk((Class<? extends AbstractSdk>) Class.forName(\"{{this}}\"));\n",
    "{{/each}}",
    "        } catch (Exception e) {\n",
    "            throw new RuntimeException(\"Can't register sdk, \" + e.getMessage());\n",
    "        }\n",
    "    }\n",
    "}"
);

#[derive(Serialize)]
struct ChannelSdkGenData<'a> {
    package: &'a str,
    classes: Vec<String>,
}

/// Output path of a channel's artifact.
///
/// Automated runs write `<stem>_<id>.<ext>` beside the target; local runs
/// overwrite the target itself so it can be installed right away.
pub fn artifact_path(target: &Path, channel_id: &str, automated: bool, default_ext: &str) -> PathBuf {
    if !automated {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = target
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(default_ext);
    target.with_file_name(format!("{stem}_{channel_id}.{ext}"))
}

/// Newest `build-tools/<version>` directory of an Android SDK.
pub async fn newest_build_tools(sdk_root: &Path) -> Result<PathBuf> {
    let dir = sdk_root.join("build-tools");
    let mut versions = if dir.is_dir() {
        fs::subdirectories(&dir).await?
    } else {
        Vec::new()
    };
    versions.sort_by_key(|path| version_key(fs::file_name(path)));
    versions
        .pop()
        .with_context(|| format!("no build-tools installed in {}", dir.display()))
}

fn version_key(name: &str) -> (Vec<u64>, String) {
    let numbers = name
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect();
    (numbers, name.to_string())
}

/// Per-channel Android builder over one exported project.
pub struct AndroidFanout<'a> {
    ctx: &'a BuildContext,
    project_dir: PathBuf,
    main_module: PathBuf,
    aggregator: PathBuf,
    sdk_root: PathBuf,
    vars: BTreeMap<&'static str, String>,
}

impl<'a> AndroidFanout<'a> {
    /// Creates the builder. Requires a valid Android SDK root.
    pub fn new(ctx: &'a BuildContext, project_dir: &Path) -> Result<Self> {
        let settings = ctx.settings();
        let sdk_root = settings.android_sdk_root()?.to_path_buf();
        let vars = BTreeMap::from([
            ("sdk_root", sdk_root.display().to_string()),
            (
                "android",
                sdk_root.join("tools").join("android").display().to_string(),
            ),
        ]);
        Ok(Self {
            ctx,
            project_dir: project_dir.to_path_buf(),
            main_module: settings.layout().main_module(project_dir),
            aggregator: project_dir.join(&settings.android().channel_sdk_module),
            sdk_root,
            vars,
        })
    }

    /// Template variables shared by every Android command.
    pub fn vars(&self) -> &BTreeMap<&'static str, String> {
        &self.vars
    }

    fn data(&self, extra: &[(&'static str, String)]) -> BTreeMap<&'static str, String> {
        let mut data = self.vars.clone();
        data.extend(extra.iter().cloned());
        data
    }

    fn prefix(&self) -> &str {
        &self.ctx.settings().android().sdk_module_prefix
    }

    /// Runs every per-channel step and packages the channel's APK.
    pub async fn build_channel(&self, channel: Channel<'_>, target: &Path) -> Result<ChannelArtifact> {
        log::info!("Build apk: {}", channel.id());
        let envs: Vec<String> = channel
            .pairs()
            .map(|(key, value)| format!("{key} -> {value}"))
            .collect();
        log::info!("Set channel env:\n{}", envs.join("\n"));

        self.clean_previous_channel().await?;
        restore_backups(&self.project_dir).await?;
        self.inject_sdks(channel).await?;

        let layout = self.ctx.settings().layout();
        overlay_channel_tree(
            &layout.channel_dir(Platform::Android, channel.id()),
            &self.project_dir,
            &layout.app_name,
        )
        .await?;

        self.overlay_manifests(channel).await?;
        self.merge_sdk_manifests().await?;
        self.package(channel, target).await
    }

    /// Removes the SDK modules of the previous channel and everything that
    /// refers to them.
    pub async fn clean_previous_channel(&self) -> Result<()> {
        let prefix = self.prefix();
        let main_assets = self.main_module.join("assets");

        for dir in fs::subdirectories(&self.project_dir).await? {
            let name = fs::file_name(&dir);
            if !name.starts_with(prefix) {
                continue;
            }
            let assets = dir.join("assets");
            if assets.is_dir() {
                log::info!("Remove assets of previous sdk {name} from main module");
                for rel in fs::relative_files(&assets)? {
                    fs::remove_file(&main_assets.join(rel)).await?;
                }
            }
            log::info!("Remove previous sdk {name}");
            fs::remove_dir_all(&dir).await?;
        }

        for module in [&self.aggregator, &self.main_module] {
            for removed in remove_library_references(module, prefix).await? {
                log::info!("Remove ref {removed} from {}", module.display());
            }
        }

        let src = self.aggregator.join("src");
        for glue in GLUE_SOURCES {
            fs::remove_file(&src.join(glue)).await?;
        }
        // Stale glue classes in bin/ would otherwise be packed.
        fs::remove_dir_all(&self.aggregator.join("bin")).await
    }

    /// Injects the channel's SDK modules in dependency order.
    ///
    /// Returns the injected module directory names.
    pub async fn inject_sdks(&self, channel: Channel<'_>) -> Result<Vec<String>> {
        let settings = self.ctx.settings();
        let layout = settings.layout();
        let prefix = self.prefix();
        let glue_dir = layout.channel_glue_dir();

        let mut requested = Vec::new();
        for sdk in channel.sdks() {
            if self.project_dir.join(sdk).is_dir() {
                log::info!("Sdk {sdk} is already in the exported project");
            } else {
                requested.push(sdk);
            }
        }

        let arena = SdkArena::resolve(&layout.android_sdks_dir(), &requested).await?;
        let has_aggregator = self.aggregator.is_dir();

        if arena.is_empty() && has_aggregator {
            log::info!("No channel sdk, using stock glue in aggregator");
            for glue in GLUE_SOURCES {
                fs::copy_file(&glue_dir.join(glue), &self.aggregator.join("src").join(glue)).await?;
            }
        }

        let mut injected = Vec::new();
        for module in arena.ordered()? {
            let name = module.module_name(prefix);
            let lib = self.project_dir.join(&name);
            if lib.is_dir() {
                log::info!("Sdk module {name} is already present");
                injected.push(name);
                continue;
            }

            log::info!("Sdk {} copy", module.name);
            fs::copy_dir(&module.source, &lib).await?;
            for glue in GLUE_SOURCES {
                let dest = lib.join("src").join(glue);
                if !dest.exists() {
                    fs::copy_file(&glue_dir.join(glue), &dest).await?;
                }
            }

            self.ctx
                .runner()
                .run_template(
                    &settings.android().commands.update_lib_project,
                    &self.data(&[("path", lib.display().to_string())]),
                    None,
                    ErrorPolicy::Fatal,
                )
                .await?;

            for dep in &module.depends {
                add_library_reference(&lib, &format!("{prefix}{dep}")).await?;
            }
            for library in &module.libraries {
                add_library_reference(&lib, library).await?;
            }
            if has_aggregator {
                add_library_reference(&self.aggregator, &name).await?;
            }
            add_library_reference(&self.main_module, &name).await?;

            let manifest = lib.join(MANIFEST);
            if manifest.is_file() {
                fs::move_file(&manifest, &fs::with_suffix(&manifest, PRISTINE_SUFFIX)).await?;
            }

            let assets = lib.join("assets");
            if assets.is_dir() {
                log::info!("Copy assets of {} to main module", module.name);
                fs::copy_dir(&assets, &self.main_module.join("assets")).await?;
            }
            injected.push(name);
        }

        if has_aggregator {
            self.write_channel_sdk_gen(&channel.sdks()).await?;
        }
        Ok(injected)
    }

    /// Renders `ChannelSdkGen.java` registering `sdks` into the aggregator.
    pub async fn write_channel_sdk_gen(&self, sdks: &[&str]) -> Result<PathBuf> {
        let android = self.ctx.settings().android();
        let data = ChannelSdkGenData {
            package: &android.channel_sdk_package,
            classes: sdks
                .iter()
                .map(|sdk| {
                    format!(
                        "{}{}.{}",
                        android.sdk_class_package_prefix,
                        sdk.to_lowercase(),
                        sdk
                    )
                })
                .collect(),
        };
        let source = self
            .ctx
            .runner()
            .templates()
            .render(CHANNEL_SDK_GEN_TEMPLATE, &data)?;

        let path = self.aggregator.join("src").join(CHANNEL_SDK_GEN);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent, false).await?;
        }
        tokio::fs::write(&path, source)
            .await
            .fs_context("writing generated source", &path)?;
        log::debug!("Generated {}", path.display());
        Ok(path)
    }

    /// Rewrites every module manifest from its pristine copy.
    pub async fn overlay_manifests(&self, channel: Channel<'_>) -> Result<()> {
        let application_id = &self.ctx.settings().layout().application_id;
        let pairs: Vec<(&str, &str)> = channel.pairs().collect();
        let target_sdk = channel.get(ANDROID_TARGET_SDK_KEY);

        for module in fs::subdirectories(&self.project_dir).await? {
            let manifest = module.join(MANIFEST);
            if !manifest.is_file() && !fs::with_suffix(&manifest, PRISTINE_SUFFIX).is_file() {
                continue;
            }
            log::info!("Replace manifest key values in {}", module.display());
            let options = OverlayOptions {
                delimiter: Delimiter::Quote,
                bare_keys: &[PACKAGE_NAME_KEY],
                rename_package: (module == self.main_module)
                    .then_some((application_id.as_str(), channel.package_name())),
                target_sdk,
            };
            apply_key_value_overlay(&manifest, &pairs, &options).await?;
        }
        Ok(())
    }

    /// Merges every injected SDK manifest into the main manifest.
    pub async fn merge_sdk_manifests(&self) -> Result<()> {
        let template = &self.ctx.settings().android().commands.merge_manifest;
        for dir in fs::subdirectories(&self.project_dir).await? {
            if fs::file_name(&dir).starts_with(self.prefix()) {
                merge_manifest(self.ctx.runner(), template, &self.vars, &self.main_module, &dir)
                    .await?;
            }
        }
        Ok(())
    }

    /// Builds, signs, aligns and copies the APK to its channel path.
    pub async fn package(&self, channel: Channel<'_>, target: &Path) -> Result<ChannelArtifact> {
        let pattern = self.project_dir.join("**").join("*.bat");
        for script in glob::glob(&pattern.to_string_lossy())?.flatten() {
            if script.is_file() {
                log::debug!("Remove {}", script.display());
                fs::remove_file(&script).await?;
            }
        }

        let settings = self.ctx.settings();
        let android = settings.android();
        let runner = self.ctx.runner();

        log::info!("Ant build");
        runner
            .run_template(
                &android.commands.build,
                &self.vars,
                Some(&self.main_module),
                ErrorPolicy::Fatal,
            )
            .await?;

        let keystore = self.ctx.signing().resolve_keystore(channel.id()).await?;
        let bin = self.main_module.join("bin");
        runner
            .run_template(
                &android.commands.sign,
                &self.data(&[
                    ("keystore", keystore.path.display().to_string()),
                    ("storepass", keystore.storepass.clone()),
                    ("alias", keystore.alias.clone()),
                ]),
                Some(&bin),
                ErrorPolicy::Fatal,
            )
            .await?;

        log::info!("Zip align");
        let zipalign = newest_build_tools(&self.sdk_root).await?.join("zipalign");
        runner
            .run_template(
                &android.commands.align,
                &self.data(&[("zipalign", zipalign.display().to_string())]),
                Some(&bin),
                ErrorPolicy::Fatal,
            )
            .await?;

        let output = artifact_path(target, channel.id(), settings.is_automated(), "apk");
        fs::copy_file(&self.main_module.join(&android.release_apk), &output).await?;
        log::info!("✓ Output apk {}", output.display());
        describe_artifact(channel.id(), &output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::command::Templates;
    use tempfile::TempDir;

    #[test]
    fn automated_artifacts_carry_channel_id() {
        let target = Path::new("/out/Android/Game.apk");
        assert_eq!(
            artifact_path(target, "A", true, "apk"),
            PathBuf::from("/out/Android/Game_A.apk")
        );
        assert_eq!(artifact_path(target, "A", false, "apk"), target);
    }

    #[tokio::test]
    async fn newest_build_tools_compares_versions() {
        let tmp = TempDir::new().unwrap();
        for version in ["9.0.0", "23.0.3", "26.0.2"] {
            std::fs::create_dir_all(tmp.path().join("build-tools").join(version)).unwrap();
        }
        let newest = newest_build_tools(tmp.path()).await.unwrap();
        assert!(newest.ends_with("26.0.2"));
    }

    #[tokio::test]
    async fn missing_build_tools_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(newest_build_tools(tmp.path()).await.is_err());
    }

    #[test]
    fn channel_sdk_gen_registers_each_sdk() {
        let data = ChannelSdkGenData {
            package: "net.comtavie.channelsdk",
            classes: vec![
                "net.comtavie.channelfoo.Foo".into(),
                "net.comtavie.channelbar.Bar".into(),
            ],
        };
        let source = Templates::new()
            .render(CHANNEL_SDK_GEN_TEMPLATE, &data)
            .unwrap();
        assert!(source.starts_with("package net.comtavie.channelsdk;\n"));
        assert!(source.contains(
            "            registerSdk((Class<? extends AbstractSdk>) Class.forName(\"net.comtavie.channelfoo.Foo\"));\n"
        ));
        assert_eq!(source.matches("registerSdk(").count(), 2);
    }

    #[test]
    fn channel_sdk_gen_without_sdks() {
        let data = ChannelSdkGenData {
            package: "p",
            classes: vec![],
        };
        let source = Templates::new()
            .render(CHANNEL_SDK_GEN_TEMPLATE, &data)
            .unwrap();
        assert!(source.contains("        try {\n        } catch"));
    }
}
