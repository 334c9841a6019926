//! `project.properties` library references.

use crate::bundler::error::{ErrorExt, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Android ant project properties file.
pub const PROJECT_PROPERTIES: &str = "project.properties";

static LIBRARY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^android\.library\.reference\.(\d+)=\.\./(.+)$")
        .expect("invalid library reference pattern")
});

/// One `android.library.reference.N=../<module>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReference {
    /// Reference index `N`
    pub index: u32,
    /// Referenced sibling module
    pub module: String,
}

fn parse(line: &str) -> Option<LibraryReference> {
    let caps = LIBRARY_REFERENCE.captures(line.trim_end())?;
    Some(LibraryReference {
        index: caps[1].parse().ok()?,
        module: caps[2].to_string(),
    })
}

/// Lists the library references in properties text, in file order.
pub fn library_references(content: &str) -> Vec<LibraryReference> {
    content.lines().filter_map(parse).collect()
}

async fn read(module_dir: &Path) -> Result<(std::path::PathBuf, String)> {
    let path = module_dir.join(PROJECT_PROPERTIES);
    let content = if path.is_file() {
        tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading project properties", &path)?
    } else {
        String::new()
    };
    Ok((path, content))
}

/// Drops every reference whose module name starts with `prefix`.
///
/// Returns the removed module names.
pub async fn remove_library_references(module_dir: &Path, prefix: &str) -> Result<Vec<String>> {
    let (path, content) = read(module_dir).await?;
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    let mut kept = String::with_capacity(content.len());
    for line in content.lines() {
        match parse(line) {
            Some(reference) if reference.module.starts_with(prefix) => removed.push(reference.module),
            _ => {
                kept.push_str(line);
                kept.push('\n');
            }
        }
    }

    if !removed.is_empty() {
        log::debug!("Removed library references {:?} from {}", removed, path.display());
        tokio::fs::write(&path, kept)
            .await
            .fs_context("writing project properties", &path)?;
    }
    Ok(removed)
}

/// Appends `android.library.reference.N=../<module>` with the next free index.
///
/// Does nothing if the module is already referenced. Returns whether a line
/// was added.
pub async fn add_library_reference(module_dir: &Path, module: &str) -> Result<bool> {
    let (path, mut content) = read(module_dir).await?;
    let existing = library_references(&content);
    if existing.iter().any(|r| r.module == module) {
        return Ok(false);
    }

    let index = existing.iter().map(|r| r.index).max().unwrap_or(0) + 1;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format!("android.library.reference.{index}=../{module}\n"));

    log::debug!("Reference {} from {} as #{}", module, path.display(), index);
    tokio::fs::write(&path, content)
        .await
        .fs_context("writing project properties", &path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROPS: &str = "target=android-22\n\
android.library=true\n\
android.library.reference.1=../AndroidCommon\n\
android.library.reference.2=../SdkCH-Alpha\n\
android.library.reference.3=../SdkCH-Beta\n";

    #[test]
    fn parses_references_in_order() {
        let refs = library_references(PROPS);
        let modules: Vec<_> = refs.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(modules, ["AndroidCommon", "SdkCH-Alpha", "SdkCH-Beta"]);
        assert_eq!(refs[2].index, 3);
    }

    #[tokio::test]
    async fn removes_prefixed_references_only() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PROJECT_PROPERTIES), PROPS).unwrap();

        let removed = remove_library_references(tmp.path(), "SdkCH-").await.unwrap();
        assert_eq!(removed, ["SdkCH-Alpha", "SdkCH-Beta"]);

        let content = std::fs::read_to_string(tmp.path().join(PROJECT_PROPERTIES)).unwrap();
        assert!(content.contains("android.library.reference.1=../AndroidCommon"));
        assert!(content.contains("target=android-22"));
        assert!(!content.contains("SdkCH-"));
    }

    #[tokio::test]
    async fn adds_with_next_index_once() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PROJECT_PROPERTIES), PROPS).unwrap();

        assert!(add_library_reference(tmp.path(), "ChannelSdk").await.unwrap());
        assert!(!add_library_reference(tmp.path(), "ChannelSdk").await.unwrap());

        let content = std::fs::read_to_string(tmp.path().join(PROJECT_PROPERTIES)).unwrap();
        assert!(content.ends_with("android.library.reference.4=../ChannelSdk\n"));
        assert_eq!(content.matches("ChannelSdk").count(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_created_on_add() {
        let tmp = TempDir::new().unwrap();
        assert!(add_library_reference(tmp.path(), "SdkCH-Alpha").await.unwrap());
        let content = std::fs::read_to_string(tmp.path().join(PROJECT_PROPERTIES)).unwrap();
        assert_eq!(content, "android.library.reference.1=../SdkCH-Alpha\n");
    }
}
