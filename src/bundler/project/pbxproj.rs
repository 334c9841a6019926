//! Text-level editing of Xcode `project.pbxproj` files.
//!
//! Objects are located by their 24 hex digit identifiers and edited in place,
//! so everything the edits don't touch keeps Xcode's own formatting. Only the
//! edits the fan-out needs are supported: build settings per configuration
//! and localized `InfoPlist.strings` registration.

use crate::bundler::error::{Error, ErrorExt, Result};
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Project file inside an `.xcodeproj` bundle.
pub const PBXPROJ: &str = "project.pbxproj";

static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9A-F]{24}\b").expect("invalid object id pattern"));

static OBJECT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([0-9A-F]{24})(?: /\*[^*]*\*/)? = \{")
        .expect("invalid object header pattern")
});

static PRODUCT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"PRODUCT_NAME = ([^;]+);").expect("invalid product name pattern")
});

static CUSTOM_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([0-9A-F]{24}) /\* CustomTemplate \*/ = \{")
        .expect("invalid group pattern")
});

const VARIANT_GROUP_END: &str = "/* End PBXVariantGroup section */\n";
const BUILD_CONFIGURATION_BEGIN: &str = "/* Begin XCBuildConfiguration section */\n";
const BUILD_FILE_BEGIN: &str = "/* Begin PBXBuildFile section */\n";
const FILE_REFERENCE_BEGIN: &str = "/* Begin PBXFileReference section */\n";

/// A build configuration of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationRef {
    /// XCBuildConfiguration object id
    pub id: String,
    /// Configuration name, e.g. `Release`
    pub name: String,
}

/// A loaded `project.pbxproj`.
#[derive(Debug, Clone)]
pub struct PbxProject {
    path: PathBuf,
    content: String,
}

impl PbxProject {
    /// Loads from an `.xcodeproj` directory or a `project.pbxproj` path.
    pub async fn load(xcode_project: &Path) -> Result<Self> {
        let path = if xcode_project.is_dir() {
            xcode_project.join(PBXPROJ)
        } else {
            xcode_project.to_path_buf()
        };
        let content = tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading Xcode project", &path)?;
        Ok(Self { path, content })
    }

    /// Wraps already loaded text.
    pub fn from_string(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Path the project is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current project text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Writes the project back to its path.
    pub async fn save(&self) -> Result<()> {
        tokio::fs::write(&self.path, &self.content)
            .await
            .fs_context("writing Xcode project", &self.path)
    }

    fn structure_error(&self, reason: impl Into<String>) -> Error {
        Error::XcodeProject {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Byte range of the `{ ... }` body of object `id`.
    fn object(&self, id: &str) -> Option<Range<usize>> {
        let caps = OBJECT_HEADER
            .captures_iter(&self.content)
            .find(|caps| &caps[1] == id)?;
        let open = caps.get(0)?.end() - 1;
        let end = scan(&self.content, open, Until::Close)?;
        Some(open..end)
    }

    fn objects_with_isa(&self, isa: &str) -> Vec<(String, Range<usize>)> {
        OBJECT_HEADER
            .captures_iter(&self.content)
            .filter_map(|caps| {
                let id = caps[1].to_string();
                let body = self.object(&id)?;
                (self.field(body.clone(), "isa").as_deref() == Some(isa)).then_some((id, body))
            })
            .collect()
    }

    /// First `name = value;` in `body`, value unquoted.
    fn field(&self, body: Range<usize>, name: &str) -> Option<String> {
        let re = Regex::new(&format!(r"\b{} = ([^;]+);", regex::escape(name))).ok()?;
        let caps = re.captures(&self.content[body])?;
        Some(unquote(caps[1].trim()))
    }

    /// Index just past the opening line of list `name = (` in `body`.
    fn list_start(&self, body: Range<usize>, name: &str) -> Option<usize> {
        let marker = format!("{name} = (");
        let at = self.content[body.clone()].find(&marker)? + body.start + marker.len();
        if self.content[at..].starts_with('\n') {
            Some(at + 1)
        } else {
            Some(at)
        }
    }

    /// Build configurations of the native target named `target`.
    pub fn target_configurations(&self, target: &str) -> Result<Vec<ConfigurationRef>> {
        let (_, body) = self
            .objects_with_isa("PBXNativeTarget")
            .into_iter()
            .find(|(_, body)| self.field(body.clone(), "name").as_deref() == Some(target))
            .ok_or_else(|| self.structure_error(format!("no native target named {target}")))?;

        let list_id = self
            .field(body, "buildConfigurationList")
            .and_then(|v| OBJECT_ID.find(&v).map(|m| m.as_str().to_string()))
            .ok_or_else(|| self.structure_error(format!("{target} has no configuration list")))?;
        let list = self
            .object(&list_id)
            .ok_or_else(|| self.structure_error(format!("missing configuration list {list_id}")))?;

        let start = self
            .list_start(list.clone(), "buildConfigurations")
            .ok_or_else(|| self.structure_error("configuration list without buildConfigurations"))?;
        let end = self.content[start..list.end]
            .find(')')
            .map_or(list.end, |p| start + p);

        OBJECT_ID
            .find_iter(&self.content[start..end])
            .map(|m| {
                let id = m.as_str().to_string();
                let name = self
                    .object(&id)
                    .and_then(|body| self.field(body, "name"))
                    .ok_or_else(|| self.structure_error(format!("unnamed configuration {id}")))?;
                Ok(ConfigurationRef { id, name })
            })
            .collect()
    }

    /// Id of configuration `name` of `target`.
    pub fn configuration_id(&self, target: &str, name: &str) -> Result<String> {
        self.target_configurations(target)?
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| self.structure_error(format!("{target} has no {name} configuration")))
    }

    fn settings_body(&self, config_id: &str) -> Result<Range<usize>> {
        let body = self
            .object(config_id)
            .ok_or_else(|| self.structure_error(format!("missing configuration {config_id}")))?;
        let marker = "buildSettings = {";
        let open = self.content[body.clone()]
            .find(marker)
            .map(|p| body.start + p + marker.len() - 1)
            .ok_or_else(|| self.structure_error(format!("{config_id} has no buildSettings")))?;
        let end = scan(&self.content, open, Until::Close)
            .ok_or_else(|| self.structure_error(format!("unterminated buildSettings in {config_id}")))?;
        Ok(open..end)
    }

    /// Statement range (from line start through `;`), indent and value range.
    fn find_setting(
        &self,
        settings: Range<usize>,
        key: &str,
    ) -> Option<(Range<usize>, String, Range<usize>)> {
        let escaped = regex::escape(key);
        let re = Regex::new(&format!(r#"(?m)^([ \t]*)(?:"{escaped}"|{escaped}) = "#)).ok()?;
        let caps = re.captures(&self.content[settings.clone()])?;
        let whole = caps.get(0)?;
        let start = settings.start + whole.start();
        let value_start = settings.start + whole.end();
        let end = scan(&self.content, value_start, Until::Semicolon)?;
        Some((start..end, caps[1].to_string(), value_start..end - 1))
    }

    /// Raw value of `key` in configuration `config_id`.
    pub fn build_setting(&self, config_id: &str, key: &str) -> Result<Option<String>> {
        let settings = self.settings_body(config_id)?;
        Ok(self
            .find_setting(settings, key)
            .map(|(_, _, value)| self.content[value].trim().to_string()))
    }

    fn write_setting(&mut self, config_id: &str, key: &str, rendered: &str) -> Result<()> {
        let settings = self.settings_body(config_id)?;
        let line = format!("{} = {};", quote(key), rendered);
        match self.find_setting(settings.clone(), key) {
            Some((statement, indent, _)) => {
                self.content.replace_range(statement, &format!("{indent}{line}"));
            }
            None => {
                self.content
                    .insert_str(settings.start + 1, &format!("\n\t\t\t\t{line}"));
            }
        }
        Ok(())
    }

    /// Sets a string build setting, replacing any previous value.
    pub fn set_build_setting(&mut self, config_id: &str, key: &str, value: &str) -> Result<()> {
        log::debug!("Set {key} = {value} in {config_id}");
        self.write_setting(config_id, key, &quote(value))
    }

    /// Adds `value` to list setting `key`.
    ///
    /// Items starting with `replace_prefix` are removed first. A missing
    /// setting starts as `$(inherited)`.
    pub fn add_build_setting_value(
        &mut self,
        config_id: &str,
        key: &str,
        value: &str,
        replace_prefix: Option<&str>,
    ) -> Result<()> {
        let mut items = match self.build_setting(config_id, key)? {
            Some(raw) => parse_list(&raw),
            None => vec!["$(inherited)".to_string()],
        };
        if let Some(prefix) = replace_prefix {
            items.retain(|item| !item.starts_with(prefix));
        }
        if !items.iter().any(|item| item == value) {
            items.push(value.to_string());
        }
        log::debug!("Add {value} to {key} in {config_id}");
        self.write_setting(config_id, key, &format_list(&items))
    }

    /// Applies [`Self::add_build_setting_value`] to every configuration of `target`.
    pub fn add_target_setting_value(
        &mut self,
        target: &str,
        key: &str,
        value: &str,
        replace_prefix: Option<&str>,
    ) -> Result<()> {
        for config in self.target_configurations(target)? {
            self.add_build_setting_value(&config.id, key, value, replace_prefix)?;
        }
        Ok(())
    }

    /// Product name of `target`'s Release build, expanding `$(TARGET_NAME)`.
    pub fn product_name(&self, target: &str) -> Result<String> {
        let from_config = self
            .configuration_id(target, "Release")
            .ok()
            .and_then(|id| self.build_setting(&id, "PRODUCT_NAME").ok().flatten());
        let raw = from_config
            .or_else(|| PRODUCT_NAME.captures(&self.content).map(|c| c[1].to_string()))
            .ok_or_else(|| self.structure_error("no PRODUCT_NAME setting"))?;
        Ok(unquote(raw.trim())
            .replace("$(TARGET_NAME)", target)
            .replace("${TARGET_NAME}", target))
    }

    /// Generates `count` object ids not present in the project or each other.
    fn new_object_ids(&self, count: usize) -> Vec<String> {
        let mut taken: HashSet<String> = OBJECT_ID
            .find_iter(&self.content)
            .map(|m| m.as_str().to_string())
            .collect();
        let mut ids = Vec::with_capacity(count);
        while ids.len() < count {
            let id = uuid::Uuid::new_v4().simple().to_string()[..24].to_uppercase();
            if taken.insert(id.clone()) {
                ids.push(id);
            }
        }
        ids
    }

    fn insert_after(&mut self, anchor: &str, text: &str) -> Result<()> {
        let at = self
            .content
            .find(anchor)
            .ok_or_else(|| self.structure_error(format!("missing {}", anchor.trim())))?;
        self.content.insert_str(at + anchor.len(), text);
        Ok(())
    }

    /// Registers localized `InfoPlist.strings` for `langs`.
    ///
    /// Adds a file reference per language, a variant group holding them, a
    /// build file in the resources phase, the group under `CustomTemplate`
    /// (or the main group) and every language but `en` to `knownRegions`.
    pub fn add_localization(&mut self, langs: &[String]) -> Result<()> {
        if langs.is_empty() {
            return Ok(());
        }

        let ids = self.new_object_ids(langs.len() + 2);
        let (file_ids, rest) = ids.split_at(langs.len());
        let (build_id, group_id) = (&rest[0], &rest[1]);

        self.insert_after(
            BUILD_FILE_BEGIN,
            &format!(
                "\t\t{build_id} /* InfoPlist.strings in Resources */ = {{isa = PBXBuildFile; fileRef = {group_id} /* InfoPlist.strings */; }};\n"
            ),
        )?;

        let references: String = langs
            .iter()
            .zip(file_ids)
            .map(|(lang, id)| {
                format!(
                    "\t\t{id} /* {lang} */ = {{isa = PBXFileReference; lastKnownFileType = text.plist.strings; name = {}; path = {}; sourceTree = \"<group>\"; }};\n",
                    quote(lang),
                    quote(&format!("{lang}.lproj/InfoPlist.strings"))
                )
            })
            .collect();
        self.insert_after(FILE_REFERENCE_BEGIN, &references)?;

        let children: String = langs
            .iter()
            .zip(file_ids)
            .map(|(lang, id)| format!("\t\t\t\t{id} /* {lang} */,\n"))
            .collect();
        let group = format!(
            "\t\t{group_id} /* InfoPlist.strings */ = {{\n\t\t\tisa = PBXVariantGroup;\n\t\t\tchildren = (\n{children}\t\t\t);\n\t\t\tname = InfoPlist.strings;\n\t\t\tsourceTree = \"<group>\";\n\t\t}};\n"
        );
        match self.content.find(VARIANT_GROUP_END) {
            Some(at) => self.content.insert_str(at, &group),
            None => {
                let section = format!(
                    "/* Begin PBXVariantGroup section */\n{group}{VARIANT_GROUP_END}\n"
                );
                let at = self
                    .content
                    .find(BUILD_CONFIGURATION_BEGIN)
                    .ok_or_else(|| self.structure_error("missing XCBuildConfiguration section"))?;
                self.content.insert_str(at, &section);
            }
        }

        let phase = self
            .objects_with_isa("PBXResourcesBuildPhase")
            .into_iter()
            .next()
            .and_then(|(_, body)| self.list_start(body, "files"))
            .ok_or_else(|| self.structure_error("no resources build phase"))?;
        self.content.insert_str(
            phase,
            &format!("\t\t\t\t{build_id} /* InfoPlist.strings in Resources */,\n"),
        );

        self.add_to_resource_group(group_id);
        self.add_known_regions(langs);
        log::info!("Registered localizations: {}", langs.join(", "));
        Ok(())
    }

    fn add_to_resource_group(&mut self, group_id: &str) {
        let group = CUSTOM_TEMPLATE
            .captures(&self.content)
            .map(|caps| caps[1].to_string())
            .or_else(|| {
                let (_, project) = self.objects_with_isa("PBXProject").into_iter().next()?;
                let main = self.field(project, "mainGroup")?;
                OBJECT_ID.find(&main).map(|m| m.as_str().to_string())
            });
        let at = group
            .and_then(|id| self.object(&id))
            .and_then(|body| self.list_start(body, "children"));
        match at {
            Some(at) => self
                .content
                .insert_str(at, &format!("\t\t\t\t{group_id} /* InfoPlist.strings */,\n")),
            None => log::warn!("No group to hold InfoPlist.strings in {}", self.path.display()),
        }
    }

    fn add_known_regions(&mut self, langs: &[String]) {
        let Some(project) = self
            .objects_with_isa("PBXProject")
            .into_iter()
            .next()
            .map(|(_, body)| body)
        else {
            log::warn!("No project object in {}", self.path.display());
            return;
        };
        let Some(start) = self.list_start(project.clone(), "knownRegions") else {
            log::warn!("No knownRegions in {}", self.path.display());
            return;
        };
        let Some(close) = self.content[start..project.end].find(')').map(|p| start + p) else {
            return;
        };

        let existing = parse_list(&format!("({})", &self.content[start..close]));
        let added: String = langs
            .iter()
            .filter(|lang| lang.as_str() != "en" && !existing.contains(lang))
            .map(|lang| format!("\t\t\t\t{},\n", quote(lang)))
            .collect();
        let line_start = self.content[..close].rfind('\n').map_or(close, |p| p + 1);
        self.content.insert_str(line_start.max(start), &added);
    }
}

enum Until {
    Close,
    Semicolon,
}

/// Scans from `start` to the end of a bracketed block or a statement,
/// skipping quoted strings and comments. Returns the index just past the
/// closing bracket or the `;`.
fn scan(text: &str, start: usize, until: Until) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2 + text[i + 2..].find("*/")? + 1;
            }
            b'{' | b'(' => depth += 1,
            b'}' | b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 && matches!(until, Until::Close) {
                    return Some(i + 1);
                }
            }
            b';' if depth == 0 && matches!(until, Until::Semicolon) => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Quotes a value unless it is a plain pbxproj token.
fn quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/'));
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// Splits a setting value into items: a `( a, "b", )` list or one value.
fn parse_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let Some(inner) = raw
        .strip_prefix('(')
        .and_then(|r| r.rfind(')').map(|end| &r[..end]))
    else {
        let value = unquote(raw);
        return if value.is_empty() { Vec::new() } else { vec![value] };
    };

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if in_quote => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quote = !in_quote;
            }
            ',' if !in_quote => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .iter()
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

fn format_list(items: &[String]) -> String {
    let mut out = String::from("(\n");
    for item in items {
        out.push_str(&format!("\t\t\t\t\t{},\n", quote(item)));
    }
    out.push_str("\t\t\t\t)");
    out
}
