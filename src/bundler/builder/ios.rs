//! iOS channel fan-out over an exported Xcode project.

use super::checksum::describe_artifact;
use crate::bundler::channels::{APP_NAME_KEY, Channel};
use crate::bundler::command::ErrorPolicy;
use crate::bundler::context::{BuildContext, ChannelArtifact};
use crate::bundler::error::{Error, Result};
use crate::bundler::project::plist::{INFO_PLIST, set_entries};
use crate::bundler::project::{
    BACKUP_DIR, Delimiter, OverlayOptions, PBXPROJ, PRISTINE_SUFFIX, PbxProject,
    apply_key_value_overlay, backup_then_overlay_tree, restore_backups,
};
use crate::bundler::settings::{BuildConfiguration, Platform};
use crate::bundler::utils::fs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Preprocessor flag telling the app whether a channel app controller is linked.
pub const APP_CONTROLLER_FLAG: &str = "-DSDK_HAS_CHANNEL_APP_CONTROLLER=";

const APP_CONTROLLER_SOURCE: &str = "ChannelAppController.mm";

/// Per-channel iOS builder over one exported Xcode project.
pub struct IosFanout<'a> {
    ctx: &'a BuildContext,
    project_dir: PathBuf,
    xcode_project: PathBuf,
    target: String,
}

impl<'a> IosFanout<'a> {
    /// Creates the builder for the Xcode project inside `project_dir`.
    pub fn new(ctx: &'a BuildContext, project_dir: &Path) -> Self {
        let name = &ctx.settings().ios().xcode_project;
        let target = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        Self {
            ctx,
            project_dir: project_dir.to_path_buf(),
            xcode_project: project_dir.join(name),
            target,
        }
    }

    /// Native target name, the Xcode project name without extension.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Patches the project for `channel` and, unless export-only, packages it.
    ///
    /// Returns `None` when the run stops after patching.
    pub async fn build_channel(
        &self,
        channel: Channel<'_>,
        target: &Path,
    ) -> Result<Option<ChannelArtifact>> {
        log::info!("Build Xcode project: {}", channel.id());
        restore_backups(&self.project_dir).await?;
        self.overlay_config(channel).await?;

        let mut project = self.restore_pbxproj().await?;
        let has_controller = self.has_channel_app_controller(channel);
        project.add_target_setting_value(
            &self.target,
            "OTHER_CFLAGS",
            &format!("{APP_CONTROLLER_FLAG}{}", u8::from(has_controller)),
            Some(APP_CONTROLLER_FLAG),
        )?;
        self.configure_signing(&mut project, channel).await?;
        project.save().await?;

        self.overlay_channel_files(channel).await?;
        self.add_localization(channel).await?;

        if self.ctx.settings().environment().export_project_only {
            log::info!("EXPORT_PROJECT_ONLY is set, stop after patching the Xcode project");
            return Ok(None);
        }

        let ipa = self.package(channel, target).await?;
        Ok(Some(describe_artifact(channel.id(), &ipa).await?))
    }

    /// Rewrites the channel config JSON and Info.plist from their pristine copies.
    pub async fn overlay_config(&self, channel: Channel<'_>) -> Result<()> {
        let pairs: Vec<(&str, &str)> = channel.pairs().collect();
        let json = self.project_dir.join(&self.ctx.settings().ios().config_json);
        if json.is_file() || fs::with_suffix(&json, PRISTINE_SUFFIX).is_file() {
            apply_key_value_overlay(&json, &pairs, &OverlayOptions::default()).await?;
        } else {
            log::warn!("Channel config {} doesn't exist", json.display());
        }

        let plist = self.project_dir.join(INFO_PLIST);
        let options = OverlayOptions {
            delimiter: Delimiter::Angle,
            ..Default::default()
        };
        apply_key_value_overlay(&plist, &pairs, &options).await?;

        if let Some(name) = channel.get(APP_NAME_KEY).filter(|n| !n.is_empty()) {
            set_entries(&plist, &[("CFBundleDisplayName", name.into())])?;
        }
        Ok(())
    }

    /// Loads `project.pbxproj` as exported, discarding edits of the previous channel.
    async fn restore_pbxproj(&self) -> Result<PbxProject> {
        let path = self.xcode_project.join(PBXPROJ);
        let pristine = fs::with_suffix(&path, PRISTINE_SUFFIX);
        if pristine.is_file() {
            fs::copy_file(&pristine, &path).await?;
        } else {
            fs::copy_file(&path, &pristine).await?;
        }
        PbxProject::load(&path).await
    }

    /// Whether any channel SDK, or the engine project, ships a channel app controller.
    pub fn has_channel_app_controller(&self, channel: Channel<'_>) -> bool {
        let layout = self.ctx.settings().layout();
        let sdks_dir = layout.sdks_dir();
        channel
            .sdks()
            .iter()
            .any(|sdk| sdks_dir.join(sdk).join("iOS").join(APP_CONTROLLER_SOURCE).is_file())
            || layout
                .engine_project_dir
                .join(&self.ctx.settings().ios().plugins_dir)
                .join(APP_CONTROLLER_SOURCE)
                .is_file()
    }

    /// Installs Release signing and writes it into both configurations.
    ///
    /// Debug builds are signed with the Release identity too and re-signed
    /// after packaging.
    async fn configure_signing(&self, project: &mut PbxProject, channel: Channel<'_>) -> Result<()> {
        let signing = self.ctx.signing();
        let identity = signing
            .resolve_identity(
                channel.id(),
                BuildConfiguration::Release,
                Some(channel.package_name()),
            )
            .await?;
        signing
            .install_certificate(channel.id(), BuildConfiguration::Debug)
            .await?;

        for config in BuildConfiguration::ALL {
            let id = project.configuration_id(&self.target, config.name())?;
            project.set_build_setting(&id, "PROVISIONING_PROFILE", &identity.profile_uuid)?;
            project.set_build_setting(&id, "CODE_SIGN_IDENTITY", &identity.certificate_name)?;
            project.set_build_setting(
                &id,
                "CODE_SIGN_IDENTITY[sdk=iphoneos*]",
                &identity.certificate_name,
            )?;
        }
        log::info!(
            "✓ Signing {} with {} / {}",
            channel.id(),
            identity.certificate_name,
            identity.profile_name
        );
        Ok(())
    }

    async fn overlay_channel_files(&self, channel: Channel<'_>) -> Result<()> {
        let dir = self
            .ctx
            .settings()
            .layout()
            .channel_dir(Platform::Ios, channel.id())
            .join("xcode_prj");
        if !dir.is_dir() {
            return Ok(());
        }
        log::info!(
            "Copy channel Xcode project files, {} -> {}",
            dir.display(),
            self.project_dir.display()
        );
        backup_then_overlay_tree(&dir, &self.project_dir, &self.project_dir.join(BACKUP_DIR))
            .await?;
        Ok(())
    }

    /// Copies `<channel>/Localization/*.lproj` into the project and registers them.
    pub async fn add_localization(&self, channel: Channel<'_>) -> Result<()> {
        let dir = self
            .ctx
            .settings()
            .layout()
            .channel_dir(Platform::Ios, channel.id())
            .join("Localization");
        if !dir.is_dir() {
            log::warn!("{} doesn't exist", dir.display());
            return Ok(());
        }

        let mut langs = Vec::new();
        for lproj in fs::subdirectories(&dir).await? {
            let name = fs::file_name(&lproj);
            let lang = name.strip_suffix(".lproj").ok_or_else(|| {
                Error::GenericError(format!("{} is not a localization dir", lproj.display()))
            })?;
            langs.push(lang.to_string());
        }
        backup_then_overlay_tree(&dir, &self.project_dir, &self.project_dir.join(BACKUP_DIR))
            .await?;

        let mut project = PbxProject::load(&self.xcode_project).await?;
        project.add_localization(&langs)?;
        project.save().await?;
        log::info!("✓ Added localizations: {}", langs.join(", "));
        Ok(())
    }

    /// Builds, packages and re-signs the ipa. Returns the package path.
    async fn package(&self, channel: Channel<'_>, target: &Path) -> Result<PathBuf> {
        let settings = self.ctx.settings();
        let commands = &settings.ios().commands;
        let runner = self.ctx.runner();
        let project_name = fs::file_name(&self.xcode_project).to_string();
        let data = BTreeMap::from([("project", project_name)]);

        log::info!("Xcode building");
        runner
            .run_template(&commands.clean, &data, Some(&self.project_dir), ErrorPolicy::Ignore)
            .await?;
        runner
            .run_template(&commands.build, &data, Some(&self.project_dir), ErrorPolicy::Ignore)
            .await?;

        log::info!("Packing ipa");
        let product = PbxProject::load(&self.xcode_project)
            .await?
            .product_name(&self.target)?;
        let app = self
            .project_dir
            .join("build/Release-iphoneos")
            .join(format!("{product}.app"));
        let share = settings.share_dir(target)?;
        let ipa = share.join(format!(
            "{product}_{}_v{}_[{}].ipa",
            channel.id(),
            settings.game_version()?,
            settings.build_number()?
        ));
        runner
            .run_template(
                &commands.package,
                &BTreeMap::from([
                    ("app", app.display().to_string()),
                    ("ipa", ipa.display().to_string()),
                ]),
                Some(&self.project_dir),
                ErrorPolicy::Fatal,
            )
            .await?;

        log::info!("Resigning ipa");
        let signing = self.ctx.signing();
        let certificate = signing
            .install_credential(channel.id(), BuildConfiguration::Debug)
            .await?;
        let profile = signing
            .install_profile(
                &signing.profile_path(channel.id(), BuildConfiguration::Debug),
                None,
            )
            .await?;
        let resigned = resigned_path(&ipa);
        runner
            .run_template(
                &commands.resign,
                &BTreeMap::from([
                    ("certificate", certificate),
                    ("profile", format!("{} ({})", profile.name, profile.team_id)),
                    ("ipa", ipa.display().to_string()),
                    ("resigned", resigned.display().to_string()),
                ]),
                Some(&share),
                ErrorPolicy::Fatal,
            )
            .await?;

        let dsym = fs::with_suffix(&app, ".dSYM");
        if dsym.exists() {
            fs::move_file(&dsym, &fs::with_suffix(&ipa, ".dSYM")).await?;
        } else {
            log::warn!("No dSYM at {}", dsym.display());
        }

        log::info!("✓ Output ipa {}", ipa.display());
        Ok(ipa)
    }
}

/// `<name>.ipa` → `<name>_Resigned.ipa`.
pub fn resigned_path(ipa: &Path) -> PathBuf {
    let stem = ipa.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    ipa.with_file_name(format!("{stem}_Resigned.ipa"))
}
