//! Info.plist edits.

use crate::bundler::error::{Error, Result};
use plist::Value;
use std::path::Path;

/// Property list file of an exported Xcode project.
pub const INFO_PLIST: &str = "Info.plist";

/// Sets top-level entries of a property list file.
///
/// Other entries are kept; the file is rewritten as XML.
pub fn set_entries(path: &Path, entries: &[(&str, Value)]) -> Result<()> {
    let mut root = Value::from_file(path)?;
    let dict = root.as_dictionary_mut().ok_or_else(|| {
        Error::GenericError(format!("{} is not a dictionary plist", path.display()))
    })?;
    for (key, value) in entries {
        log::debug!("{}: {} = {:?}", path.display(), key, value);
        dict.insert((*key).to_string(), value.clone());
    }
    root.to_file_xml(path)?;
    Ok(())
}

/// Reads a top-level string entry.
pub fn string_entry(path: &Path, key: &str) -> Result<Option<String>> {
    let root = Value::from_file(path)?;
    Ok(root
        .as_dictionary()
        .and_then(|dict| dict.get(key))
        .and_then(Value::as_string)
        .map(str::to_string))
}
