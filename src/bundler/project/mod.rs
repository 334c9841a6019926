//! Exported project mutation.
//!
//! Everything here edits an engine-exported native project in place:
//!
//! - [`overlay`] - per-channel file overlays with `_bak` backups
//! - [`manifest`] - manifest merging and `.original`-based key/value overlays
//! - [`properties`] - ant `project.properties` library references
//! - [`pbxproj`] - Xcode project build settings and localization
//! - [`plist`] - Info.plist entries

pub mod manifest;
pub mod overlay;
pub mod pbxproj;
pub mod plist;
pub mod properties;

pub use manifest::{
    Delimiter, MANIFEST, OverlayOptions, PRISTINE_SUFFIX, apply_key_value_overlay, manifest_path,
    merge_manifest, substitute,
};
pub use overlay::{
    BACKUP_DIR, MAIN_MODULE_OVERRIDE, backup_then_overlay_tree, overlay_channel_tree,
    restore_backups,
};
pub use pbxproj::{ConfigurationRef, PBXPROJ, PbxProject};
pub use properties::{
    LibraryReference, PROJECT_PROPERTIES, add_library_reference, library_references,
    remove_library_references,
};
