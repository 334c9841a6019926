//! Utility modules for the bundler core.

pub mod fs;
