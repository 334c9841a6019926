//! Manifest merging and key/value overlays.

use crate::bundler::command::{CommandRunner, ErrorPolicy};
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::utils::fs;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Suffix of pristine copies used as the overlay source.
pub const PRISTINE_SUFFIX: &str = ".original";

/// Manifest file name inside a module.
pub const MANIFEST: &str = "AndroidManifest.xml";

/// How keys are delimited in the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `"KEY"` → `"value"` (XML attributes, JSON)
    Quote,
    /// `>KEY<` → `>value<` (property list text nodes)
    Angle,
}

impl Delimiter {
    fn wrap(&self, s: &str) -> String {
        match self {
            Self::Quote => format!("\"{s}\""),
            Self::Angle => format!(">{s}<"),
        }
    }
}

/// Options for [`apply_key_value_overlay`].
#[derive(Debug, Clone)]
pub struct OverlayOptions<'a> {
    /// Delimiter around keys and values
    pub delimiter: Delimiter,
    /// Keys substituted bare instead of delimited
    pub bare_keys: &'a [&'a str],
    /// `package="<old>"` renamed to `package="<new>"`
    pub rename_package: Option<(&'a str, &'a str)>,
    /// New `android:targetSdkVersion`; blank leaves it alone
    pub target_sdk: Option<&'a str>,
}

impl Default for OverlayOptions<'_> {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Quote,
            bare_keys: &[],
            rename_package: None,
            target_sdk: None,
        }
    }
}

/// Resolves a module directory or manifest path to the manifest path.
pub fn manifest_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(MANIFEST)
    } else {
        path.to_path_buf()
    }
}

/// Merges the library manifest into the main one with the configured tool.
///
/// The main manifest is moved to `<main>.tmp`, the tool writes the merged
/// result back to `<main>`, and the temp file is removed. Either argument may
/// be a module directory.
pub async fn merge_manifest(
    runner: &CommandRunner,
    template: &str,
    vars: &BTreeMap<&'static str, String>,
    main: &Path,
    lib: &Path,
) -> Result<()> {
    let main = manifest_path(main);
    let lib = manifest_path(lib);
    log::info!("Merge manifest {} into {}", lib.display(), main.display());

    let tmp = fs::with_suffix(&main, ".tmp");
    fs::remove_file(&tmp).await?;
    fs::move_file(&main, &tmp).await?;

    let mut data = vars.clone();
    data.insert("main", tmp.display().to_string());
    data.insert("lib", lib.display().to_string());
    data.insert("out", main.display().to_string());

    runner
        .run_template(template, &data, None, ErrorPolicy::Fatal)
        .await
        .map_err(|source| Error::Merge {
            main: main.clone(),
            lib: lib.clone(),
            source: Box::new(source),
        })?;

    fs::remove_file(&tmp).await
}

/// Substitutes channel values into text.
pub fn substitute(content: &str, pairs: &[(&str, &str)], options: &OverlayOptions<'_>) -> Result<String> {
    let mut content = content.to_string();
    for (key, value) in pairs {
        content = if options.bare_keys.contains(key) {
            content.replace(key, value)
        } else {
            content.replace(&options.delimiter.wrap(key), &options.delimiter.wrap(value))
        };
    }

    if let Some((old, new)) = options.rename_package {
        content = content.replace(&format!("package=\"{old}\""), &format!("package=\"{new}\""));
    }

    if let Some(sdk) = options.target_sdk.filter(|s| !s.is_empty()) {
        let re = Regex::new(r#"android:targetSdkVersion="\d+""#)?;
        content = re
            .replace_all(&content, format!("android:targetSdkVersion=\"{sdk}\""))
            .into_owned();
    }

    Ok(content)
}

/// Rewrites `target` from its pristine copy with the channel's values.
///
/// The pristine copy `<target>.original` is taken from the live file the
/// first time and never overwritten, so applying a second channel's values
/// gives the same result as applying them alone.
pub async fn apply_key_value_overlay(
    target: &Path,
    pairs: &[(&str, &str)],
    options: &OverlayOptions<'_>,
) -> Result<()> {
    let pristine = fs::with_suffix(target, PRISTINE_SUFFIX);
    if !pristine.exists() {
        log::debug!("Backing up pristine {}", target.display());
        fs::copy_file(target, &pristine).await?;
    }

    let content = tokio::fs::read_to_string(&pristine)
        .await
        .fs_context("reading pristine copy", &pristine)?;
    let content = substitute(&content, pairs, options)?;
    tokio::fs::write(target, content)
        .await
        .fs_context("writing overlay", target)?;
    log::debug!("Applied {} values to {}", pairs.len(), target.display());
    Ok(())
}
