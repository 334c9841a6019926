//! Validated channel configuration table.

use super::ChannelSelection;
use crate::bundler::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Column 0: channel build id.
pub const BUILD_ID_KEY: &str = "CH_BUILD_ID";
/// Column 1: package name / bundle identifier.
pub const PACKAGE_NAME_KEY: &str = "PACKAGE_NAME";
/// Comma-separated SDK names.
pub const CHANNEL_SDKS_KEY: &str = "CHANNEL_SDKS";
/// Android target SDK override, blank to keep the exported value.
pub const ANDROID_TARGET_SDK_KEY: &str = "ANDROID_TARGET_SDK";
/// iOS display name override, blank to keep the exported value.
pub const APP_NAME_KEY: &str = "APP_NAME";

/// Ordered channel rows keyed by build id.
///
/// Immutable once loaded. Construction enforces:
/// - the first two keys are `CH_BUILD_ID` then `PACKAGE_NAME`
/// - keys and build ids are unique identifiers (`[A-Za-z0-9_]+`)
/// - every row has one cell per key
/// - there is at least one row
#[derive(Debug, Clone)]
pub struct ChannelConfigTable {
    path: PathBuf,
    keys: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One row of the table, viewed through its keys.
#[derive(Debug, Clone, Copy)]
pub struct Channel<'a> {
    keys: &'a [String],
    values: &'a [String],
}

impl<'a> Channel<'a> {
    /// Build id (`CH_BUILD_ID`).
    pub fn id(&self) -> &'a str {
        &self.values[0]
    }

    /// Package name (`PACKAGE_NAME`).
    pub fn package_name(&self) -> &'a str {
        &self.values[1]
    }

    /// Value of `key`, if the table has that column.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|i| self.values[i].as_str())
    }

    /// Raw `CHANNEL_SDKS` cell, empty when the column is absent.
    pub fn sdk_list(&self) -> &'a str {
        self.get(CHANNEL_SDKS_KEY).unwrap_or_default()
    }

    /// SDK names from `CHANNEL_SDKS`; a blank cell means none.
    pub fn sdks(&self) -> Vec<&'a str> {
        self.sdk_list()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Key/value pairs to substitute, every column but the build id.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        let (keys, values) = (self.keys, self.values);
        keys.iter()
            .zip(values)
            .skip(1)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl ChannelConfigTable {
    /// Validates raw keys and rows into a table.
    pub fn new(path: impl AsRef<Path>, keys: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let invalid = |reason: String| Error::ConfigFormat {
            path: path.clone(),
            reason,
        };

        match (keys.first(), keys.get(1)) {
            (Some(first), _) if first != BUILD_ID_KEY => {
                return Err(invalid(format!(
                    "expected first key is {BUILD_ID_KEY}, but it's {first}"
                )));
            }
            (_, Some(second)) if second != PACKAGE_NAME_KEY => {
                return Err(invalid(format!(
                    "expected second key is {PACKAGE_NAME_KEY}, but it's {second}"
                )));
            }
            (None, _) | (_, None) => {
                return Err(invalid(format!(
                    "table needs at least the {BUILD_ID_KEY} and {PACKAGE_NAME_KEY} keys"
                )));
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        for key in &keys {
            if !is_identifier(key) {
                return Err(invalid(format!("invalid key {key:?}")));
            }
            if !seen.insert(key.as_str()) {
                return Err(invalid(format!("duplicate key {key}")));
            }
        }

        if rows.is_empty() {
            return Err(invalid("table has no rows".into()));
        }

        let mut ids = HashSet::new();
        for (line, row) in rows.iter().enumerate() {
            if row.len() != keys.len() {
                return Err(invalid(format!(
                    "row {} has {} cells, expected {}",
                    line + 1,
                    row.len(),
                    keys.len()
                )));
            }
            let id = &row[0];
            if !is_identifier(id) {
                return Err(invalid(format!("invalid {BUILD_ID_KEY} {id:?}")));
            }
            if !ids.insert(id.as_str()) {
                return Err(invalid(format!("duplicate {BUILD_ID_KEY} {id}")));
            }
        }

        Ok(Self { path, keys, rows })
    }

    /// File the table was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column keys in order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Rows in table order.
    pub fn channels(&self) -> impl Iterator<Item = Channel<'_>> {
        self.rows.iter().map(|values| Channel {
            keys: &self.keys,
            values,
        })
    }

    /// First row, the default selection.
    pub fn first(&self) -> Channel<'_> {
        Channel {
            keys: &self.keys,
            values: &self.rows[0],
        }
    }

    /// Row with the given build id.
    pub fn get(&self, id: &str) -> Option<Channel<'_>> {
        self.channels().find(|c| c.id() == id)
    }

    /// Every build id in table order.
    pub fn ids(&self) -> Vec<&str> {
        self.channels().map(|c| c.id()).collect()
    }

    /// Selected rows in table order.
    pub fn selected<'a>(
        &'a self,
        selection: &'a ChannelSelection,
    ) -> impl Iterator<Item = Channel<'a>> + 'a {
        self.channels().filter(|c| selection.contains(c.id()))
    }

    /// Whether any selected channel uses `sdk`.
    pub fn has_sdk(&self, selection: &ChannelSelection, sdk: &str) -> bool {
        self.selected(selection).any(|c| c.sdks().contains(&sdk))
    }

    /// Whether selected channels disagree on their `CHANNEL_SDKS` cell.
    pub fn has_heterogeneous_sdk_sets(&self, selection: &ChannelSelection) -> bool {
        let mut sets = self.selected(selection).map(|c| c.sdk_list());
        match sets.next() {
            Some(first) => sets.any(|s| s != first),
            None => false,
        }
    }

    /// Selected ids missing from the table, in selection order.
    pub fn unknown_ids(&self, selection: &ChannelSelection) -> Vec<String> {
        selection
            .ids()
            .iter()
            .filter(|id| self.get(id).is_none())
            .cloned()
            .collect()
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
