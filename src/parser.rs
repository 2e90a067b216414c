//! Parser for bracket-nested config text.
//!
//! The file format:
//!
//! ```text
//! # comment
//! top = value
//! [section]
//!     key = value
//!     [[child]]
//!         key = value
//! ```
//!
//! The number of brackets around a header is its nesting level. Comments and
//! blank lines carry no structure and are not retained in the tree.

use crate::error::{PatchError, Result};
use crate::tree::{ConfigTree, ConfigValue, SectionPath};
use std::path::Path;
use tracing::{debug, warn};

/// Syntactic role of one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLine<'a> {
    /// `[name]`, `[[name]]`, ... with `level` brackets on each side.
    Header { level: usize, name: &'a str },
    /// `key = value`, with the leading whitespace of the raw line.
    Assignment {
        indent: &'a str,
        key: &'a str,
        value: &'a str,
    },
    /// Comments, blank lines and anything unrecognised.
    Other,
}

/// Classify a raw line (terminator included or not).
///
/// Headers need matching `[` and `]` counts; an unbalanced header is
/// `Other`. Assignments split on the first `=` and trim both sides.
pub fn classify_line(line: &str) -> SourceLine<'_> {
    let trimmed = line.trim();

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let opening = trimmed.matches('[').count();
        if opening == trimmed.matches(']').count() {
            let name = trimmed.trim_matches(|c: char| c == '[' || c == ']').trim();
            return SourceLine::Header {
                level: opening,
                name,
            };
        }
        return SourceLine::Other;
    }

    if !trimmed.starts_with('#') {
        if let Some((key, value)) = trimmed.split_once('=') {
            let indent_len = line.len() - line.trim_start().len();
            return SourceLine::Assignment {
                indent: &line[..indent_len],
                key: key.trim(),
                value: value.trim(),
            };
        }
    }

    SourceLine::Other
}

/// Parse config text into a tree.
pub fn parse(text: &str) -> ConfigTree {
    let mut tree = ConfigTree::new();
    let mut path = SectionPath::root();

    for (number, line) in text.lines().enumerate() {
        match classify_line(line) {
            SourceLine::Header { level, name } => {
                path.truncate(level.saturating_sub(1));
                path.push(name);
                if !open_section(&mut tree, &path) {
                    warn!(line = number + 1, section = %path, "Section header collides with a value, skipping its keys");
                }
            }
            SourceLine::Assignment { key, value, .. } => match section_mut(&mut tree, &path) {
                Some(section) => {
                    section.insert(key.to_string(), ConfigValue::Leaf(value.to_string()));
                }
                None => {
                    debug!(line = number + 1, key, section = %path, "Skipping assignment outside a valid section");
                }
            },
            SourceLine::Other => {}
        }
    }

    tree
}

/// Read and parse a config file. A missing file yields an empty tree.
pub fn parse_file(path: &Path) -> Result<ConfigTree> {
    Ok(parse(&read_config_text(path)?))
}

/// Read a config file's text, treating a missing file as empty.
pub fn read_config_text(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file not found, using empty config");
            Ok(String::new())
        }
        Err(source) => Err(PatchError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Create the sections along `path`. Returns false when a leaf is in the way.
fn open_section(tree: &mut ConfigTree, path: &SectionPath) -> bool {
    let mut current = tree;
    for name in path.names() {
        let entry = current
            .entry(name.clone())
            .or_insert_with(|| ConfigValue::Section(ConfigTree::new()));
        match entry {
            ConfigValue::Section(child) => current = child,
            ConfigValue::Leaf(_) => return false,
        }
    }
    true
}

fn section_mut<'a>(tree: &'a mut ConfigTree, path: &SectionPath) -> Option<&'a mut ConfigTree> {
    let mut current = tree;
    for name in path.names() {
        match current.get_mut(name)? {
            ConfigValue::Section(child) => current = child,
            ConfigValue::Leaf(_) => return None,
        }
    }
    Some(current)
}
