//! Channel file overlays with lazily created backups.

use crate::bundler::error::Result;
use crate::bundler::utils::fs;
use std::path::{Path, PathBuf};

/// Backup directory kept inside each overlaid module.
pub const BACKUP_DIR: &str = "_bak";

/// Channel override directory that maps to the main module.
pub const MAIN_MODULE_OVERRIDE: &str = "_main";

/// Copies every file of `override_dir` over `dest_dir`.
///
/// A destination file that exists and has no backup yet is first copied to
/// the same relative path under `backup_dir`. An existing backup is never
/// replaced, so it always holds the file as exported. Each written file is
/// touched. Returns the destination paths written.
pub async fn backup_then_overlay_tree(
    override_dir: &Path,
    dest_dir: &Path,
    backup_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for rel in fs::relative_files(override_dir)? {
        let src = override_dir.join(&rel);
        let dst = dest_dir.join(&rel);
        let bak = backup_dir.join(&rel);

        if dst.is_file() && !bak.exists() {
            log::debug!("Backup {} -> {}", dst.display(), bak.display());
            fs::copy_file(&dst, &bak).await?;
        }

        log::debug!("{} -> {}", src.display(), dst.display());
        fs::copy_file(&src, &dst).await?;
        fs::touch(&dst).await?;
        written.push(dst);
    }
    Ok(written)
}

/// Applies a channel's override tree to the exported project.
///
/// Each top-level directory of `channel_dir` names a module of the project.
/// Names starting with `_` are skipped except `_main`, which targets the
/// main module. Backups go to `<module>/_bak`.
pub async fn overlay_channel_tree(
    channel_dir: &Path,
    project_dir: &Path,
    main_module: &str,
) -> Result<usize> {
    if !channel_dir.is_dir() {
        log::info!("No channel specific files in {}", channel_dir.display());
        return Ok(0);
    }

    log::info!(
        "Replace channel specific files from {}",
        channel_dir.display()
    );
    let mut count = 0;
    for dir in fs::subdirectories(channel_dir).await? {
        let name = fs::file_name(&dir);
        let module = if name == MAIN_MODULE_OVERRIDE {
            main_module
        } else if name.starts_with('_') {
            continue;
        } else {
            name
        };

        let dest = project_dir.join(module);
        count += backup_then_overlay_tree(&dir, &dest, &dest.join(BACKUP_DIR))
            .await?
            .len();
    }
    Ok(count)
}

/// Restores every backed-up file of the project and its modules.
///
/// Looks in `<project>/_bak` and `<project>/<module>/_bak`; each backup is
/// copied back over its live path and touched. Backups are kept.
pub async fn restore_backups(project_dir: &Path) -> Result<usize> {
    log::info!("Restore backed up files in {}", project_dir.display());
    let mut dirs = vec![project_dir.to_path_buf()];
    dirs.extend(fs::subdirectories(project_dir).await?);

    let mut count = 0;
    for dir in dirs {
        let bak = dir.join(BACKUP_DIR);
        if !bak.is_dir() {
            continue;
        }
        for rel in fs::relative_files(&bak)? {
            let dst = dir.join(&rel);
            log::debug!("{} -> {}", bak.join(&rel).display(), dst.display());
            fs::copy_file(&bak.join(&rel), &dst).await?;
            fs::touch(&dst).await?;
            count += 1;
        }
    }
    Ok(count)
}
