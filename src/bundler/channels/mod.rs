//! Channel configuration store.
//!
//! Loads the table of channel variants for a platform and resolves which of
//! them this run builds.

mod selection;
mod source;
mod table;

pub use selection::ChannelSelection;
pub use source::{ChannelTableSource, TomlTableSource, TsvTableSource, load, load_table, source_for};
pub use table::{
    ANDROID_TARGET_SDK_KEY, APP_NAME_KEY, BUILD_ID_KEY, CHANNEL_SDKS_KEY, Channel,
    ChannelConfigTable, PACKAGE_NAME_KEY,
};
