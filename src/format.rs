//! Rendering of newly introduced keys and sections.
//!
//! Only items that do not exist in the source are rendered from scratch;
//! everything else is copied from the original text by the rewriter.

use crate::config::PatchOptions;
use crate::tree::{ConfigTree, ConfigValue};

/// Render `items` as lines nested at `level`.
///
/// Leaves come first as `<indent>key = value`. Each non-empty section follows
/// as a blank line, a header with `level + 1` brackets, and its own items one
/// level deeper. Empty sections are not rendered. Lines carry no terminator.
pub fn format_new_items(items: &ConfigTree, level: usize, options: &PatchOptions) -> Vec<String> {
    format_new_items_indented(items, level, &options.indent_for(level), options)
}

/// Like [`format_new_items`], with an explicit indent for the outermost
/// lines. Deeper lines add one indent unit per level on top of it.
pub fn format_new_items_indented(
    items: &ConfigTree,
    level: usize,
    indent: &str,
    options: &PatchOptions,
) -> Vec<String> {
    let mut lines = Vec::new();

    for (key, value) in items {
        if let ConfigValue::Leaf(value) = value {
            lines.push(format!("{indent}{key} = {value}"));
        }
    }

    let nested_indent = format!("{indent}{}", options.indent);
    for (key, value) in items {
        if let ConfigValue::Section(section) = value {
            if section.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(format_header(key, level + 1, indent));
            lines.extend(format_new_items_indented(
                section,
                level + 1,
                &nested_indent,
                options,
            ));
        }
    }

    lines
}

fn format_header(name: &str, level: usize, indent: &str) -> String {
    format!("{indent}{}{name}{}", "[".repeat(level), "]".repeat(level))
}
