
use std::path::Path;

use anyhow::{bail, Result};
use log::{debug, info};
use roxmltree::Node;

use crate::utils::text::read_text;

pub const GAME_NAME_MACRO: &str = "$(GameName)";

/// A key to add (or overwrite) in a section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValueToAdd {
    pub section_name: String,
    pub key_name: String,
    /// May contain `$(GameName)`.
    pub value_string: String,
}

impl KeyValueToAdd {
    pub fn new(section_name: &str, key_name: &str, value_string: &str) -> Self {
        KeyValueToAdd {
            section_name: section_name.to_owned(),
            key_name: key_name.to_owned(),
            value_string: value_string.to_owned(),
        }
    }

    pub fn resolve_value(&self, game_name: &str) -> String {
        self.value_string.replace(GAME_NAME_MACRO, game_name)
    }

    /// `+Key`/`-Key` are array directives: they are always added, never merged.
    pub fn is_array_directive(&self) -> bool {
        self.key_name.starts_with('+') || self.key_name.starts_with('-')
    }
}

/// The INI rewriting rules of a project template (its `ConfigInfo.xml`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigOptions {
    pub sections_to_exclude: Vec<String>,
    pub keys_to_exclude: Vec<String>,
    pub values_to_exclude: Vec<String>,
    pub key_values_to_add: Vec<KeyValueToAdd>,
}

impl ConfigOptions {
    pub fn read(path: &Path) -> Result<ConfigOptions> {
        let content = match read_text(path) {
            Ok(content) => content,
            Err(error) => bail!("Could not read template config options {:?}\n -> {:?}", path, error),
        };
        match ConfigOptions::parse(&content) {
            Ok(options) => {
                info!("template config options {:?}: {} section(s), {} key(s), {} value(s) excluded, {} key(s) added",
                    path, options.sections_to_exclude.len(), options.keys_to_exclude.len(),
                    options.values_to_exclude.len(), options.key_values_to_add.len());
                Ok(options)
            }
            Err(error) => bail!("Invalid template config options {:?}\n -> {:?}", path, error),
        }
    }

    pub fn parse(xml: &str) -> Result<ConfigOptions> {
        let document = match roxmltree::Document::parse(xml) {
            Ok(document) => document,
            Err(error) => bail!("XML error: {}", error),
        };
        let mut options = ConfigOptions::default();
        for child in document.root_element().children().filter(Node::is_element) {
            match child.tag_name().name() {
                "ConfigSectionsToExclude" => options.sections_to_exclude = string_array(child),
                // the historical schema has the typo, accept both
                "ConfigKeysToExculde" | "ConfigKeysToExclude" => options.keys_to_exclude = string_array(child),
                "ConfigValuesToExclude" => options.values_to_exclude = string_array(child),
                "ConfigKeyValuesToAdd" => {
                    options.key_values_to_add = child.children()
                        .filter(Node::is_element)
                        .map(key_value_to_add)
                        .collect();
                }
                other => debug!("config options: ignore element <{}>", other),
            }
        }
        Ok(options)
    }

    pub fn section_excluded(&self, section_name: &str) -> bool {
        self.sections_to_exclude.iter().any(|item| section_name.contains(item.as_str()))
    }

    pub fn key_excluded(&self, key: &str) -> bool {
        self.keys_to_exclude.iter().any(|item| key.contains(item.as_str()))
    }

    pub fn value_excluded(&self, value: &str) -> bool {
        self.values_to_exclude.iter().any(|item| value.contains(item.as_str()))
    }
}

fn string_array(node: Node) -> Vec<String> {
    node.children()
        .filter(Node::is_element)
        .map(|item| item.text().unwrap_or("").to_owned())
        .collect()
}

/// Fields may be given as attributes or as child elements.
fn key_value_to_add(node: Node) -> KeyValueToAdd {
    let field = |name: &str| -> String {
        match node.attribute(name) {
            Some(value) => value.to_owned(),
            None => node.children()
                .find(|child| child.has_tag_name(name))
                .and_then(|child| child.text())
                .unwrap_or("")
                .to_owned(),
        }
    };
    KeyValueToAdd {
        section_name: field("SectionName"),
        key_name: field("KeyName"),
        value_string: field("ValueString"),
    }
}
