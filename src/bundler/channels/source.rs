//! Channel table sources.
//!
//! The table is authored as a spreadsheet upstream; the pipeline reads an
//! export of it, either TOML or tab-separated text.

use super::ChannelConfigTable;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::{Platform, ProjectLayout};
use serde::Deserialize;
use std::path::Path;

/// Parses table text into raw keys and rows.
pub trait ChannelTableSource {
    /// Returns `(keys, rows)` as authored, before validation.
    fn parse(&self, text: &str, path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)>;
}

/// `keys = [...]` plus `rows = [[...], ...]`.
#[derive(Debug, Default)]
pub struct TomlTableSource;

#[derive(Deserialize)]
struct TomlTable {
    keys: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ChannelTableSource for TomlTableSource {
    fn parse(&self, text: &str, path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let table: TomlTable = toml::from_str(text).map_err(|e| Error::ConfigFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok((table.keys, table.rows))
    }
}

/// Tab-separated text with the keys on the first line.
#[derive(Debug, Default)]
pub struct TsvTableSource;

impl ChannelTableSource for TsvTableSource {
    fn parse(&self, text: &str, _path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut lines = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty());
        let split = |line: &str| line.split('\t').map(String::from).collect::<Vec<_>>();

        let keys = lines.next().map(split).unwrap_or_default();
        let rows = lines.map(split).collect();
        Ok((keys, rows))
    }
}

/// Picks the source for a file by its extension.
pub fn source_for(path: &Path) -> Result<Box<dyn ChannelTableSource>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(Box::new(TomlTableSource)),
        Some("tsv" | "tab" | "txt") => Ok(Box::new(TsvTableSource)),
        other => Err(Error::ConfigFormat {
            path: path.to_path_buf(),
            reason: format!("unsupported channel table format {other:?}, use .toml or .tsv"),
        }),
    }
}

/// Reads and validates a channel table file.
pub async fn load_table(path: &Path) -> Result<ChannelConfigTable> {
    let source = source_for(path)?;
    let text = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading channel table", path)?;
    let (keys, rows) = source.parse(&text, path)?;
    let table = ChannelConfigTable::new(path, keys, rows)?;
    log::debug!(
        "Loaded {} channels from {}",
        table.ids().len(),
        path.display()
    );
    Ok(table)
}

/// Reads the platform's channel table from the project layout.
pub async fn load(layout: &ProjectLayout, platform: Platform) -> Result<ChannelConfigTable> {
    load_table(&layout.table_path(platform)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tsv_first_line_is_keys() {
        let (keys, rows) = TsvTableSource
            .parse(
                "CH_BUILD_ID\tPACKAGE_NAME\r\nA\tcom.a\r\n\r\nB\tcom.b\n",
                Path::new("t.tsv"),
            )
            .unwrap();
        assert_eq!(keys, vec!["CH_BUILD_ID", "PACKAGE_NAME"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["B", "com.b"]);
    }

    #[test]
    fn tsv_keeps_blank_cells() {
        let (_, rows) = TsvTableSource
            .parse("CH_BUILD_ID\tPACKAGE_NAME\tCHANNEL_SDKS\nA\tcom.a\t\n", Path::new("t.tsv"))
            .unwrap();
        assert_eq!(rows[0], vec!["A", "com.a", ""]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(source_for(Path::new("ChannelConfigs.xlsx")).is_err());
    }

    #[tokio::test]
    async fn loads_toml_table_for_platform() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("ChannelConfigs_iOS.toml"),
            r#"
            keys = ["CH_BUILD_ID", "PACKAGE_NAME", "APP_NAME"]
            rows = [["AppStore", "com.example.game", "Game"]]
            "#,
        )
        .unwrap();
        let layout = ProjectLayout {
            root_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };

        let table = load(&layout, Platform::Ios).await.unwrap();
        assert_eq!(table.first().id(), "AppStore");
        assert_eq!(table.first().get("APP_NAME"), Some("Game"));
    }

    #[tokio::test]
    async fn malformed_toml_is_a_format_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ChannelConfigs.toml");
        std::fs::write(&path, "keys = 3").unwrap();
        let err = load_table(&path).await.unwrap_err();
        assert!(matches!(err, Error::ConfigFormat { .. }));
    }
}
