//! Config tree types and path-based section lookup.
//!
//! A [`ConfigTree`] mirrors the bracket nesting of a config file: every
//! `[section]` becomes a nested tree, every `key = value` a leaf. Keys keep
//! the order in which they were first seen so that newly rendered items
//! follow the patch file's order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered mapping from key to value. Keys are unique within one tree.
pub type ConfigTree = IndexMap<String, ConfigValue>;

/// A node of a [`ConfigTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Opaque string value from a `key = value` line.
    Leaf(String),
    /// Nested section.
    Section(ConfigTree),
}

impl ConfigValue {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ConfigValue::Leaf(value) => Some(value),
            ConfigValue::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&ConfigTree> {
        match self {
            ConfigValue::Section(tree) => Some(tree),
            ConfigValue::Leaf(_) => None,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, ConfigValue::Section(_))
    }

    /// True when both values are leaves or both are sections.
    pub fn same_kind(&self, other: &ConfigValue) -> bool {
        self.is_section() == other.is_section()
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Leaf(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Leaf(value)
    }
}

impl From<ConfigTree> for ConfigValue {
    fn from(tree: ConfigTree) -> Self {
        ConfigValue::Section(tree)
    }
}

/// Names of the sections from the root down to one node.
///
/// The empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SectionPath(Vec<String>);

impl SectionPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    /// Keep only the first `len` names.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// True when `prefix` names this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &SectionPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// A new path with `name` appended.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(name);
        path
    }
}

impl<S: Into<String>> FromIterator<S> for SectionPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

/// Result of a section lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'a> {
    Section(&'a ConfigTree),
    Leaf(&'a str),
}

impl<'a> Node<'a> {
    pub fn as_section(self) -> Option<&'a ConfigTree> {
        match self {
            Node::Section(tree) => Some(tree),
            Node::Leaf(_) => None,
        }
    }
}

/// Walk `path` down from `tree`.
///
/// Returns `None` as soon as a name is missing or an intermediate node is a
/// leaf. The empty path returns the tree itself.
pub fn get_section<'a>(tree: &'a ConfigTree, path: &SectionPath) -> Option<Node<'a>> {
    let mut node = Node::Section(tree);
    for name in path.names() {
        let section = node.as_section()?;
        node = match section.get(name)? {
            ConfigValue::Section(child) => Node::Section(child),
            ConfigValue::Leaf(value) => Node::Leaf(value),
        };
    }
    Some(node)
}

/// Like [`get_section`], but only succeeds when the node is a section.
pub fn get_tree<'a>(tree: &'a ConfigTree, path: &SectionPath) -> Option<&'a ConfigTree> {
    get_section(tree, path).and_then(Node::as_section)
}
