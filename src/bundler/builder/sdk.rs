//! Channel SDK modules and their dependency order.
//!
//! Every SDK named in `CHANNEL_SDKS` is a library module under the shared
//! `SDKs/_Android` directory. A module may carry an `sdk.toml` descriptor:
//!
//! ```toml
//! depends = ["Push"]            # other SDK modules, injected as well
//! libraries = ["AndroidCommon"] # modules already in the exported project
//! ```
//!
//! The arena collects the requested SDKs plus everything they depend on and
//! hands them back dependencies first.

use crate::bundler::error::{Error, ErrorExt, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Optional dependency descriptor inside an SDK module.
pub const SDK_DESCRIPTOR: &str = "sdk.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SdkDescriptor {
    depends: Vec<String>,
    libraries: Vec<String>,
}

/// One SDK library module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkModule {
    /// SDK name as written in `CHANNEL_SDKS`
    pub name: String,
    /// Module directory in the shared SDK repository
    pub source: PathBuf,
    /// SDKs this one needs injected and referenced
    pub depends: Vec<String>,
    /// Exported project modules this one references
    pub libraries: Vec<String>,
}

impl SdkModule {
    async fn load(sdks_dir: &Path, name: &str) -> Result<Self> {
        let source = sdks_dir.join(name);
        if !source.is_dir() {
            return Err(Error::MissingSdk {
                sdk: name.to_string(),
                path: source,
            });
        }

        let descriptor_path = source.join(SDK_DESCRIPTOR);
        let descriptor: SdkDescriptor = if descriptor_path.is_file() {
            let text = tokio::fs::read_to_string(&descriptor_path)
                .await
                .fs_context("reading SDK descriptor", &descriptor_path)?;
            toml::from_str(&text)?
        } else {
            SdkDescriptor::default()
        };

        Ok(Self {
            name: name.to_string(),
            source,
            depends: descriptor.depends,
            libraries: descriptor.libraries,
        })
    }

    /// Directory name of the module once injected, e.g. `SdkCH-Push`.
    pub fn module_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.name)
    }
}

/// SDK modules of one channel with their dependency edges.
#[derive(Debug, Default)]
pub struct SdkArena {
    graph: DiGraph<SdkModule, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl SdkArena {
    /// Loads `names` and, transitively, every SDK they depend on.
    ///
    /// # Errors
    ///
    /// [`Error::MissingSdk`] for any name without a module directory.
    pub async fn resolve(sdks_dir: &Path, names: &[&str]) -> Result<Self> {
        let mut arena = Self::default();
        let mut queue: VecDeque<String> = names.iter().map(|n| n.to_string()).collect();

        while let Some(name) = queue.pop_front() {
            if arena.nodes.contains_key(&name) {
                continue;
            }
            let module = SdkModule::load(sdks_dir, &name).await?;
            queue.extend(module.depends.iter().cloned());
            let index = arena.graph.add_node(module);
            arena.nodes.insert(name, index);
        }

        let edges: Vec<(NodeIndex, NodeIndex)> = arena
            .graph
            .node_indices()
            .flat_map(|index| {
                let nodes = &arena.nodes;
                arena.graph[index]
                    .depends
                    .iter()
                    .filter_map(move |dep| nodes.get(dep).map(|&dep| (dep, index)))
            })
            .collect();
        for (dependency, dependent) in edges {
            arena.graph.add_edge(dependency, dependent, ());
        }

        Ok(arena)
    }

    /// Number of modules, dependencies included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the channel uses no SDK.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Module by SDK name.
    pub fn get(&self, name: &str) -> Option<&SdkModule> {
        self.nodes.get(name).map(|&index| &self.graph[index])
    }

    /// Modules with every dependency ahead of its dependents.
    ///
    /// Independent modules keep the order they were requested in.
    pub fn ordered(&self) -> Result<Vec<&SdkModule>> {
        let order = toposort(&self.graph, None).map_err(|cycle| Error::SdkDependencyCycle {
            sdk: self.graph[cycle.node_id()].name.clone(),
        })?;
        Ok(order.into_iter().map(|index| &self.graph[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sdk(root: &Path, name: &str, descriptor: Option<&str>) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        if let Some(text) = descriptor {
            std::fs::write(dir.join(SDK_DESCRIPTOR), text).unwrap();
        }
    }

    fn names(modules: &[&SdkModule]) -> Vec<String> {
        modules.iter().map(|m| m.name.clone()).collect()
    }

    #[tokio::test]
    async fn independent_sdks_keep_requested_order() {
        let tmp = TempDir::new().unwrap();
        sdk(tmp.path(), "Foo", None);
        sdk(tmp.path(), "Bar", None);

        let arena = SdkArena::resolve(tmp.path(), &["Foo", "Bar"]).await.unwrap();
        assert_eq!(names(&arena.ordered().unwrap()), vec!["Foo", "Bar"]);
    }

    #[tokio::test]
    async fn dependencies_come_first_and_are_pulled_in() {
        let tmp = TempDir::new().unwrap();
        sdk(tmp.path(), "Pay", Some(r#"depends = ["Account"]"#));
        sdk(
            tmp.path(),
            "Account",
            Some(r#"libraries = ["AndroidCommon"]"#),
        );

        let arena = SdkArena::resolve(tmp.path(), &["Pay"]).await.unwrap();
        assert_eq!(arena.len(), 2);
        assert_eq!(names(&arena.ordered().unwrap()), vec!["Account", "Pay"]);
        assert_eq!(arena.get("Account").unwrap().libraries, vec!["AndroidCommon"]);
        assert_eq!(arena.get("Pay").unwrap().module_name("SdkCH-"), "SdkCH-Pay");
    }

    #[tokio::test]
    async fn missing_sdk_directory() {
        let tmp = TempDir::new().unwrap();
        sdk(tmp.path(), "Pay", Some(r#"depends = ["Ghost"]"#));

        let err = SdkArena::resolve(tmp.path(), &["Pay"]).await.unwrap_err();
        assert!(matches!(err, Error::MissingSdk { ref sdk, .. } if sdk == "Ghost"));
    }

    #[tokio::test]
    async fn dependency_cycle_is_reported() {
        let tmp = TempDir::new().unwrap();
        sdk(tmp.path(), "A", Some(r#"depends = ["B"]"#));
        sdk(tmp.path(), "B", Some(r#"depends = ["A"]"#));

        let arena = SdkArena::resolve(tmp.path(), &["A"]).await.unwrap();
        assert!(matches!(
            arena.ordered().unwrap_err(),
            Error::SdkDependencyCycle { .. }
        ));
    }

    #[tokio::test]
    async fn no_sdks() {
        let tmp = TempDir::new().unwrap();
        let arena = SdkArena::resolve(tmp.path(), &[]).await.unwrap();
        assert!(arena.is_empty());
        assert!(arena.ordered().unwrap().is_empty());
    }
}
