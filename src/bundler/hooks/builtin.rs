//! Hooks the pipeline registers at its reserved slots.

use crate::bail;
use super::{PostBuildArgs, PostBuildHook, PreBuildArgs, PreBuildHook};
use crate::bundler::builder::ChannelFanoutBuilder;
use crate::bundler::context::BuildContext;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::Platform;
use crate::bundler::utils::fs;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Builder name written into build info by automated runs.
pub const AUTOMATED_BUILDER: &str = "Jenkins";

static VERSION_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d\.\d$").expect("invalid version pattern"));

/// Pre-build(0): refuses mixed iOS SDK sets and copies a single channel's
/// `_Unity` tree over the engine project.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelOverlayHook;

#[async_trait]
impl PreBuildHook for ChannelOverlayHook {
    fn name(&self) -> &str {
        "channel-overlay"
    }

    async fn run(&self, ctx: &BuildContext, args: &PreBuildArgs<'_>) -> Result<()> {
        if args.platform == Platform::Ios
            && ctx.table().has_heterogeneous_sdk_sets(ctx.selection())
        {
            return Err(Error::HeterogeneousSdks {
                platform: args.platform.to_string(),
            });
        }

        let Some(id) = ctx.selection().single() else {
            log::info!("No single channel is specified, no file needs to be overridden");
            return Ok(());
        };

        let layout = ctx.settings().layout();
        let dir = layout.channel_dir(args.platform, id).join("_Unity");
        if dir.is_dir() {
            log::info!("Copy specific files for channel {id}");
            let copied = fs::copy_dir(&dir, &layout.engine_project_dir).await?;
            log::info!("✓ Overlaid {} engine project file(s)", copied.len());
        }
        Ok(())
    }
}

/// Pre-build(50): validates the version string and writes the build-info
/// source into the engine project.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildInfoHook;

#[async_trait]
impl PreBuildHook for BuildInfoHook {
    fn name(&self) -> &str {
        "build-info"
    }

    async fn run(&self, ctx: &BuildContext, _args: &PreBuildArgs<'_>) -> Result<()> {
        let settings = ctx.settings();
        let version = settings.game_version()?;
        if settings.is_automated() && !VERSION_FORMAT.is_match(&version) {
            bail!("Game version format is not right: {version}");
        }
        let who = if settings.is_automated() {
            AUTOMATED_BUILDER.to_string()
        } else {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".into())
        };

        let source = render_build_info(&who, &settings.build_number()?, &version);
        let path = settings.layout().build_info_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent, false).await?;
        }
        tokio::fs::write(&path, source)
            .await
            .fs_context("writing build info", &path)?;
        log::info!("✓ Generated {} (version {version})", path.display());
        Ok(())
    }
}

/// Version code: the version string without dots.
pub fn version_code(version: &str) -> String {
    version.replace('.', "")
}

/// Renders the generated build-info class.
pub fn render_build_info(who: &str, build_number: &str, version: &str) -> String {
    format!(
        "// Generated at build, {}.\n\n\
         class BuildEnv_Gen\n{{\n\
         \tpublic const string whosBuild = \"{who}\";\n\
         \tpublic const string buildNumber = \"{build_number}\";\n\
         \tpublic const string gameVersion = \"{version}\";\n\
         \tpublic const string versionCode = \"{}\";\n\
         }}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        version_code(version)
    )
}

/// Post-build(50): prepares the exported project, fans it out over the
/// selected channels and writes `_GameVersion.sh`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FanoutHook;

#[async_trait]
impl PostBuildHook for FanoutHook {
    fn name(&self) -> &str {
        "channel-fanout"
    }

    async fn run(&self, ctx: &BuildContext, args: &PostBuildArgs<'_>) -> Result<()> {
        if args.platform != Platform::Desktop {
            let builder = ChannelFanoutBuilder::with_project_dir(ctx, args.project_dir);
            builder.prepare().await?;
            builder.build_all().await?;
        }

        let layout = ctx.settings().layout();
        let script = layout.game_version_script();
        tokio::fs::write(
            &script,
            format!("export APP_NAME={}\n", layout.normalized_app_name()),
        )
        .await
        .fs_context("writing game version script", &script)?;
        log::info!("✓ Wrote {}", script.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_pattern() {
        assert!(VERSION_FORMAT.is_match("1.2.3"));
        assert!(VERSION_FORMAT.is_match("10.0.1"));
        assert!(!VERSION_FORMAT.is_match("1.10.3"));
        assert!(!VERSION_FORMAT.is_match("1.2"));
        assert!(!VERSION_FORMAT.is_match("1.2.3\n"));
    }

    #[test]
    fn build_info_source() {
        let source = render_build_info(AUTOMATED_BUILDER, "42", "1.2.3");
        assert!(source.contains("class BuildEnv_Gen\n{\n"));
        assert!(source.contains("\tpublic const string whosBuild = \"Jenkins\";\n"));
        assert!(source.contains("\tpublic const string buildNumber = \"42\";\n"));
        assert!(source.contains("\tpublic const string versionCode = \"123\";\n"));
        assert!(source.ends_with("}\n"));
    }
}
