//! Requested channel set for one run.

use super::ChannelConfigTable;

/// Build ids requested for this run, in request order.
///
/// Membership against the table is not checked here; the fan-out reports
/// unknown ids after every known one has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSelection {
    ids: Vec<String>,
    defaulted: bool,
}

impl ChannelSelection {
    /// Resolves the selection from a raw comma-separated list.
    ///
    /// Entries are trimmed and blanks dropped. An empty request selects the
    /// table's first row.
    pub fn resolve(table: &ChannelConfigTable, requested: Option<&str>) -> Self {
        let ids: Vec<String> = requested
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        if ids.is_empty() {
            let first = table.first().id().to_string();
            log::info!(
                "No CH_BUILD_LIST set, will build from the first row of {}: {first}",
                table.path().display()
            );
            return Self {
                ids: vec![first],
                defaulted: true,
            };
        }

        Self {
            ids,
            defaulted: false,
        }
    }

    /// Explicit selection.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            defaulted: false,
        }
    }

    /// Selected ids.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    /// The only selected id, when exactly one was selected.
    pub fn single(&self) -> Option<&str> {
        match self.ids.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Whether the selection fell back to the first row.
    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ChannelConfigTable {
        ChannelConfigTable::new(
            "t.toml",
            vec!["CH_BUILD_ID".into(), "PACKAGE_NAME".into()],
            vec![
                vec!["first".into(), "a".into()],
                vec!["second".into(), "b".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_request_selects_first_row() {
        let t = table();
        for requested in [None, Some(""), Some(" , ")] {
            let sel = ChannelSelection::resolve(&t, requested);
            assert_eq!(sel.ids(), ["first".to_string()]);
            assert!(sel.is_defaulted());
        }
    }

    #[test]
    fn request_is_split_and_trimmed() {
        let sel = ChannelSelection::resolve(&table(), Some("second, Z ,"));
        assert_eq!(sel.ids(), ["second".to_string(), "Z".to_string()]);
        assert!(sel.contains("Z"));
        assert_eq!(sel.single(), None);
    }
}
