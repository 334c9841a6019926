//! File system helpers shared by the project mutators and the fan-out builder.
//!
//! Every helper is idempotent where the name allows it: removing something
//! that is already gone succeeds, creating something that already exists
//! succeeds.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tokio::fs;

/// Returns `path` with `suffix` appended to its file name, e.g.
/// `AndroidManifest.xml` + `.original`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Removes a file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing file", path),
    }
}

/// Renames a file, replacing the destination.
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).await.fs_context("moving file", from)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary. Overwrites the
/// destination.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::GenericError(format!(
            "{} does not exist or is not a file",
            from.display()
        )));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Recursively copies a directory over another one, merging into whatever is
/// already at the destination and overwriting files with the same relative
/// path.
///
/// Preserves symlinks on platforms that support them. Returns the destination
/// path of every regular file written.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{} does not exist or is not a directory",
            from.display()
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut written = Vec::new();
        std::fs::create_dir_all(&to).fs_context("creating directory", &to)?;

        for entry in walkdir::WalkDir::new(&from).sort_by_file_name() {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                if dest_path.symlink_metadata().is_ok() {
                    std::fs::remove_file(&dest_path).fs_context("replacing symlink", &dest_path)?;
                }
                if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                }
                .fs_context("creating symlink", &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
                written.push(dest_path);
            }
        }

        Ok(written)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

/// Lists every regular file below `dir`, sorted, as paths relative to `dir`.
///
/// A missing directory yields an empty list.
pub fn relative_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(dir)?.to_path_buf());
        }
    }
    Ok(files)
}

/// Lists the immediate subdirectories of `dir`, sorted by name.
pub async fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await.fs_context("reading directory", dir)?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading directory", dir)?
    {
        if entry
            .file_type()
            .await
            .fs_context("reading file type", entry.path())?
            .is_dir()
        {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Updates the modification time of `path` to now so incremental native
/// builds pick the file up.
pub async fn touch(path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .fs_context("opening file to touch", &path)?;
        file.set_modified(SystemTime::now())
            .fs_context("touching file", &path)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Touch task panicked: {}", e)))?
}

/// File name of `path` as UTF-8, or an empty string.
pub fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn suffix_is_appended_to_file_name() {
        let p = with_suffix(Path::new("a/AndroidManifest.xml"), ".original");
        assert_eq!(p, PathBuf::from("a/AndroidManifest.xml.original"));
    }

    #[tokio::test]
    async fn copy_dir_merges_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(src.join("res")).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("res/icon.png"), "new").unwrap();
        std::fs::write(dst.join("keep.txt"), "keep").unwrap();

        let written = copy_dir(&src, &dst).await.unwrap();

        assert_eq!(written, vec![dst.join("res/icon.png")]);
        assert_eq!(std::fs::read_to_string(dst.join("res/icon.png")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(dst.join("keep.txt")).unwrap(), "keep");
    }

    #[tokio::test]
    async fn removal_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        remove_dir_all(&missing).await.unwrap();
        remove_file(&missing).await.unwrap();
    }

    #[test]
    fn relative_files_are_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("b")).unwrap();
        std::fs::write(tmp.path().join("b/2.txt"), "").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "").unwrap();
        let files = relative_files(tmp.path()).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.txt"), PathBuf::from("b/2.txt")]);
    }
}
