//! Comment-preserving rewrite of the source text.
//!
//! The rewriter walks the original lines once and decides for each one
//! whether to copy it, re-render it with a new value, or drop it. Keys and
//! sections that only exist in the patch are rendered with
//! the formatter at section boundaries:
//!
//! - new leaves of a section go after its last own key, i.e. right before
//!   its first child header or, without children, where the section closes
//! - new sub-sections go where the section closes (next header of the same
//!   or a lower level, or end of input)
//!
//! Comments and blank lines are held back until the next key or header so
//! that comments in front of a dropped section disappear with it.

use crate::config::PatchOptions;
use crate::format::format_new_items_indented;
use crate::parser::{SourceLine, classify_line, parse};
use crate::report::{AddedKind, Addition, PatchReport, ValueChange};
use crate::tree::{ConfigTree, ConfigValue, Node, SectionPath, get_section, get_tree};
use std::collections::HashSet;
use tracing::debug;

/// Rewritten text plus the changes it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub text: String,
    pub report: PatchReport,
}

/// Rewrite `source_text` so that it holds `merged`, appending what `patch`
/// introduces.
///
/// Parses `source_text` to learn which keys are new; use [`Rewriter`]
/// directly when the source tree is already at hand.
pub fn rewrite(
    merged: &ConfigTree,
    patch: &ConfigTree,
    source_text: &str,
    options: &PatchOptions,
) -> RewriteOutcome {
    let source = parse(source_text);
    Rewriter::new(&source, merged, patch, options).rewrite(source_text)
}

/// Inputs of one rewrite.
///
/// `source` must be the parse of the text handed to [`Rewriter::rewrite`].
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    source: &'a ConfigTree,
    merged: &'a ConfigTree,
    patch: &'a ConfigTree,
    options: &'a PatchOptions,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        source: &'a ConfigTree,
        merged: &'a ConfigTree,
        patch: &'a ConfigTree,
        options: &'a PatchOptions,
    ) -> Self {
        Self {
            source,
            merged,
            patch,
            options,
        }
    }

    pub fn rewrite(&self, source_text: &str) -> RewriteOutcome {
        let mut pass = Pass::new(*self, newline_of(source_text));

        for raw in source_text.split_inclusive('\n') {
            match classify_line(raw) {
                SourceLine::Header { level, name } => pass.header(raw, level, name),
                _ if pass.deleted.is_some() => {}
                SourceLine::Assignment { indent, key, value } => {
                    pass.assignment(raw, indent, key, value)
                }
                SourceLine::Other => pass.comments.push(raw),
            }
        }

        pass.finish()
    }

    /// Patch items at `path` that the source lacks, or holds with the other
    /// kind (leaf vs section).
    fn new_items(&self, path: &SectionPath) -> ConfigTree {
        let Some(patch_section) = get_tree(self.patch, path) else {
            return ConfigTree::new();
        };
        let source_section = get_tree(self.source, path);

        patch_section
            .iter()
            .filter(|(key, value)| {
                source_section
                    .and_then(|section| section.get(key.as_str()))
                    .is_none_or(|existing| !existing.same_kind(value))
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// A source section that is gone from the merged tree or became a leaf.
    /// Headers colliding with a source leaf are not sections and stay.
    fn is_removed(&self, path: &SectionPath) -> bool {
        matches!(get_section(self.source, path), Some(Node::Section(_)))
            && !matches!(get_section(self.merged, path), Some(Node::Section(_)))
    }
}

/// An open section. The root has the empty path.
#[derive(Debug, Clone)]
struct Frame {
    path: SectionPath,
    /// Indentation of the section's last key line, reused for new items.
    key_indent: Option<String>,
}

impl Frame {
    fn new(path: SectionPath) -> Self {
        Self {
            path,
            key_indent: None,
        }
    }
}

/// Mutable state of one pass over the source lines.
struct Pass<'a, 't> {
    rewriter: Rewriter<'a>,
    newline: &'static str,
    out: String,
    stack: Vec<Frame>,
    /// Path of the last header, resolved like the parser does.
    path: SectionPath,
    /// Section being dropped, if any.
    deleted: Option<SectionPath>,
    comments: Vec<&'t str>,
    leaves_done: HashSet<SectionPath>,
    sections_done: HashSet<SectionPath>,
    report: PatchReport,
}

impl<'a, 't> Pass<'a, 't> {
    fn new(rewriter: Rewriter<'a>, newline: &'static str) -> Self {
        Self {
            rewriter,
            newline,
            out: String::new(),
            stack: vec![Frame::new(SectionPath::root())],
            path: SectionPath::root(),
            deleted: None,
            comments: Vec::new(),
            leaves_done: HashSet::new(),
            sections_done: HashSet::new(),
            report: PatchReport::default(),
        }
    }

    // The root frame is only popped by `finish`.
    fn top(&self) -> &Frame {
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn header(&mut self, raw: &'t str, level: usize, name: &str) {
        self.path.truncate(level.saturating_sub(1));
        self.path.push(name);
        let path = self.path.clone();

        if let Some(deleted) = &self.deleted {
            if path.starts_with(deleted) && path != *deleted {
                return;
            }
            self.deleted = None;
        }

        // Open frames are ancestors of `path`; close everything below its parent.
        while self.stack.len() > 1 && self.top().path.depth() >= path.depth() {
            if let Some(frame) = self.stack.pop() {
                self.close(&frame);
            }
        }

        let parent = self.top().clone();
        let removed = self.rewriter.is_removed(&path);
        // New root leaves go below a leading comment block, not above it.
        if !removed
            && parent.path.is_root()
            && parent.key_indent.is_none()
            && self.has_new_leaves(&parent.path)
        {
            self.flush_comments();
        }
        self.emit_leaves(&parent);

        if removed {
            if !self.comments.is_empty() {
                debug!(section = %path, lines = self.comments.len(), "Dropping comments before removed section");
                self.comments.clear();
            }
            debug!(section = %path, level, "Removing section");
            if !self.report.removed.contains(&path) {
                self.report.removed.push(path.clone());
            }
            self.deleted = Some(path);
            return;
        }

        self.flush_comments();
        self.out.push_str(raw);
        self.stack.push(Frame::new(path));
    }

    fn assignment(&mut self, raw: &'t str, indent: &str, key: &str, value: &str) {
        self.flush_comments();
        self.top_mut().key_indent = Some(indent.to_string());

        let section = &self.stack[self.stack.len() - 1].path;
        let merged = get_tree(self.rewriter.merged, section).and_then(|tree| tree.get(key));

        match merged {
            Some(ConfigValue::Leaf(new_value)) if new_value == value => self.out.push_str(raw),
            Some(ConfigValue::Leaf(new_value)) => {
                debug!(section = %section, key, old = value, new = %new_value, "Rewriting value");
                let change = ValueChange {
                    section: section.clone(),
                    key: key.to_string(),
                    old_value: value.to_string(),
                    new_value: new_value.clone(),
                };
                let line = format!("{indent}{key} = {new_value}{}", line_ending(raw));
                self.out.push_str(&line);
                self.report.changed.push(change);
            }
            Some(ConfigValue::Section(_)) => {
                debug!(section = %section, key, "Dropping value replaced by a section");
            }
            None => self.out.push_str(raw),
        }
    }

    fn finish(mut self) -> RewriteOutcome {
        while let Some(frame) = self.stack.pop() {
            self.close(&frame);
        }
        self.flush_comments();

        RewriteOutcome {
            text: self.out,
            report: self.report,
        }
    }

    fn close(&mut self, frame: &Frame) {
        self.emit_leaves(frame);
        self.emit_sections(frame);
    }

    fn has_new_leaves(&self, path: &SectionPath) -> bool {
        !self.leaves_done.contains(path)
            && self
                .rewriter
                .new_items(path)
                .values()
                .any(|value| !value.is_section())
    }

    fn emit_leaves(&mut self, frame: &Frame) {
        if !self.leaves_done.insert(frame.path.clone()) {
            return;
        }
        let mut items = self.rewriter.new_items(&frame.path);
        items.retain(|_, value| !value.is_section());
        self.emit(frame, &items);
    }

    fn emit_sections(&mut self, frame: &Frame) {
        if !self.sections_done.insert(frame.path.clone()) {
            return;
        }
        let mut items = self.rewriter.new_items(&frame.path);
        items.retain(|_, value| value.is_section());
        self.emit(frame, &items);
    }

    fn emit(&mut self, frame: &Frame, items: &ConfigTree) {
        let options = self.rewriter.options;
        let level = frame.path.depth();
        let indent = frame
            .key_indent
            .clone()
            .unwrap_or_else(|| options.indent_for(level));
        let lines = format_new_items_indented(items, level, &indent, options);
        if lines.is_empty() {
            return;
        }
        let path = &frame.path;

        for (key, value) in items {
            let kind = if value.is_section() {
                AddedKind::Section
            } else {
                AddedKind::Key
            };
            if kind == AddedKind::Section && value.as_section().is_some_and(|s| s.is_empty()) {
                continue;
            }
            debug!(section = %path, key = %key, ?kind, "Adding new item");
            self.report.added.push(Addition {
                section: path.clone(),
                key: key.clone(),
                kind,
            });
        }

        // No separator line at the very top of the output.
        let skip = usize::from(self.out.is_empty() && lines[0].is_empty());
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push_str(self.newline);
        }
        for line in lines.into_iter().skip(skip) {
            self.out.push_str(&line);
            self.out.push_str(self.newline);
        }
    }

    fn flush_comments(&mut self) {
        for line in self.comments.drain(..) {
            self.out.push_str(line);
        }
    }
}

/// Terminator of a raw line, empty on an unterminated last line.
fn line_ending(raw: &str) -> &str {
    if raw.ends_with("\r\n") {
        "\r\n"
    } else if raw.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Terminator for synthesized lines, following the source's first line.
fn newline_of(text: &str) -> &'static str {
    match text.find('\n') {
        Some(pos) if text[..pos].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;

    fn apply(source: &str, patch: &str) -> RewriteOutcome {
        let patch = parse(patch);
        let merged = merge(&parse(source), &patch);
        rewrite(&merged, &patch, source, &PatchOptions::default())
    }

    fn path(names: &[&str]) -> SectionPath {
        names.iter().copied().collect()
    }

    #[test]
    fn test_value_override_and_addition() {
        let outcome = apply("[a]\nx = 1\n# note\ny = 2\n", "[a]\ny = 9\nz = 3\n");
        assert_eq!(outcome.text, "[a]\nx = 1\n# note\ny = 9\nz = 3\n");
        assert_eq!(outcome.report.changed.len(), 1);
        assert_eq!(outcome.report.added.len(), 1);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let source = "# top\nname=demo\n\n[a]\n  x   =  1\n\n  [[b]]\n    # inner\n    y = 2\n# trailing\n";
        let outcome = apply(source, "");
        assert_eq!(outcome.text, source);
        assert!(outcome.report.is_empty());
    }

    #[test]
    fn test_unterminated_last_line_is_kept() {
        assert_eq!(apply("[a]\nx = 1", "").text, "[a]\nx = 1");
        assert_eq!(apply("[a]\nx = 1", "[a]\nx = 2\n").text, "[a]\nx = 2");
        assert_eq!(apply("[a]\nx = 1", "[a]\ny = 2\n").text, "[a]\nx = 1\ny = 2\n");
    }

    #[test]
    fn test_changed_value_keeps_indent() {
        let outcome = apply("[a]\n\t  key=old\n", "[a]\nkey = new\n");
        assert_eq!(outcome.text, "[a]\n\t  key = new\n");
    }

    #[test]
    fn test_new_leaves_go_before_child_sections() {
        let source = "[a]\n    x = 1\n    [[b]]\n        y = 2\n[c]\n";
        let outcome = apply(source, "[a]\nz = 3\n");
        assert_eq!(
            outcome.text,
            "[a]\n    x = 1\n    z = 3\n    [[b]]\n        y = 2\n[c]\n"
        );
    }

    #[test]
    fn test_new_subsection_appended_at_section_close() {
        let source = "[a]\n    x = 1\n[c]\n    k = v\n";
        let outcome = apply(source, "[a]\n[[new]]\nn = 1\n");
        assert_eq!(
            outcome.text,
            "[a]\n    x = 1\n\n    [[new]]\n        n = 1\n[c]\n    k = v\n"
        );
        assert_eq!(outcome.report.added[0].kind, AddedKind::Section);
    }

    #[test]
    fn test_new_root_items() {
        let source = "top = 1\n\n# section a\n[a]\nx = 1\n";
        let outcome = apply(source, "extra = 2\n[b]\ny = 3\n");
        assert_eq!(
            outcome.text,
            "top = 1\nextra = 2\n\n# section a\n[a]\nx = 1\n\n[b]\n    y = 3\n"
        );
    }

    #[test]
    fn test_new_root_leaf_without_headers() {
        let outcome = apply("a = 1\n", "b = 2\n");
        assert_eq!(outcome.text, "a = 1\nb = 2\n");
    }

    #[test]
    fn test_deleted_section_and_its_comments_are_dropped() {
        let source = "\
[keep]
k = 1
# about drop
[drop]
d = 1
# inside
[[child]]
c = 1
[after]
a = 1
";
        let source_tree = parse(source);
        let mut merged = source_tree.clone();
        merged.shift_remove("drop");
        let patch = ConfigTree::new();
        let outcome = Rewriter::new(&source_tree, &merged, &patch, &PatchOptions::default())
            .rewrite(source);

        assert_eq!(outcome.text, "[keep]\nk = 1\n[after]\na = 1\n");
        assert_eq!(outcome.report.removed, vec![path(&["drop"])]);
    }

    #[test]
    fn test_nested_deletion_resumes_at_sibling() {
        let source = "[a]\n[[gone]]\nx = 1\n[[[deeper]]]\ny = 2\n[[stay]]\nz = 3\n";
        let source_tree = parse(source);
        let mut merged = source_tree.clone();
        if let Some(ConfigValue::Section(a)) = merged.get_mut("a") {
            a.shift_remove("gone");
        }
        let patch = ConfigTree::new();
        let outcome = Rewriter::new(&source_tree, &merged, &patch, &PatchOptions::default())
            .rewrite(source);
        assert_eq!(outcome.text, "[a]\n[[stay]]\nz = 3\n");
    }

    #[test]
    fn test_key_missing_from_merged_is_kept() {
        let source = "[a]\nx = 1\n";
        let source_tree = parse(source);
        let mut merged = source_tree.clone();
        if let Some(ConfigValue::Section(a)) = merged.get_mut("a") {
            a.shift_remove("x");
        }
        let patch = ConfigTree::new();
        let outcome = Rewriter::new(&source_tree, &merged, &patch, &PatchOptions::default())
            .rewrite(source);
        assert_eq!(outcome.text, source);
    }

    #[test]
    fn test_leaf_replaced_by_section() {
        let outcome = apply("[a]\nx = 1\ny = 2\n", "[a]\n[[x]]\ninner = 1\n");
        assert_eq!(outcome.text, "[a]\ny = 2\n\n[[x]]\n    inner = 1\n");
    }

    #[test]
    fn test_repeated_header_gets_additions_once() {
        let outcome = apply("[a]\nx = 1\n[b]\n[a]\ny = 2\n", "[a]\nz = 3\n");
        assert_eq!(outcome.text, "[a]\nx = 1\nz = 3\n[b]\n[a]\ny = 2\n");
    }

    #[test]
    fn test_level_skipping_headers_round_trip() {
        let source = "[[x]]\n[[[y]]]\nk = 1\n[[z]]\nw = 2\n";
        let outcome = apply(source, "");
        assert_eq!(outcome.text, source);
        assert!(outcome.report.is_empty());
    }

    #[test]
    fn test_level_skipping_headers_follow_parser_paths() {
        // `[[z]]` after `[[[y]]]` parses as a child of `x`.
        let source = "[[x]]\n[[[y]]]\nk = 1\n[[z]]\nw = 2\n";
        let outcome = apply(source, "[[x]]\n[[z]]\nv = 3\n");
        assert_eq!(outcome.text, "[[x]]\n[[[y]]]\nk = 1\n[[z]]\nw = 2\nv = 3\n");
        assert_eq!(outcome.report.added[0].section, path(&["x", "z"]));
    }

    #[test]
    fn test_header_colliding_with_leaf_is_kept() {
        let source = "a = 1\n[a]\nx = 2\n[[c]]\nz = 4\n[b]\ny = 3\n";
        let outcome = apply(source, "");
        assert_eq!(outcome.text, source);
        assert!(outcome.report.removed.is_empty());
    }

    #[test]
    fn test_section_replaced_by_leaf() {
        let source = "top = 1\n[a]\nx = 1\n[b]\ny = 2\n";
        let outcome = apply(source, "a = 9\n");
        assert_eq!(outcome.text, "top = 1\na = 9\n[b]\ny = 2\n");
        assert_eq!(outcome.report.removed, vec![path(&["a"])]);
    }

    #[test]
    fn test_new_root_leaf_goes_below_leading_comment() {
        let outcome = apply("# file header\n[a]\nx = 1\n", "k = v\n");
        assert_eq!(outcome.text, "# file header\nk = v\n[a]\nx = 1\n");
    }

    #[test]
    fn test_crlf_source() {
        let outcome = apply("[a]\r\nx = 1\r\n", "[a]\nx = 2\ny = 3\n");
        assert_eq!(outcome.text, "[a]\r\nx = 2\r\ny = 3\r\n");
    }

    #[test]
    fn test_patch_into_empty_source() {
        let outcome = apply("", "k = v\n[s]\na = 1\n");
        assert_eq!(outcome.text, "k = v\n\n[s]\n    a = 1\n");
    }
}
