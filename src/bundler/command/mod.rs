//! External command execution.
//!
//! - [`runner`] - shell command execution with output capture and error policy
//! - [`template`] - handlebars rendering of configured command lines
//! - [`preflight`] - toolchain availability checks

mod preflight;
mod runner;
mod template;

pub use preflight::{HAS_SHELL, preflight};
pub use runner::{CommandOutput, CommandRunner, ErrorPolicy};
pub use template::Templates;
