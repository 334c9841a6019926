//! Command line and source file templates.

use crate::bundler::error::Result;
use handlebars::Handlebars;
use serde::Serialize;

/// Strict handlebars registry without HTML escaping.
///
/// Strict mode turns a misspelled variable into a render error instead of an
/// empty string in the middle of a command line.
#[derive(Debug, Clone)]
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl Templates {
    /// Creates the registry.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    /// Renders an inline template.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        Ok(self.registry.render_template(template, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn renders_without_escaping() {
        let mut data = BTreeMap::new();
        data.insert("path", "a/<b>&c");
        let out = Templates::new()
            .render(r#"ls "{{path}}""#, &data)
            .unwrap();
        assert_eq!(out, r#"ls "a/<b>&c""#);
    }

    #[test]
    fn missing_variable_is_an_error() {
        let data: BTreeMap<&str, &str> = BTreeMap::new();
        assert!(Templates::new().render("echo {{nope}}", &data).is_err());
    }
}
