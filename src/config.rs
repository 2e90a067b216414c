//! Options controlling how patched output is rendered.

/// Number of spaces per nesting level for newly rendered lines.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Rendering options shared by the formatter and the rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    /// Indent unit repeated once per nesting level.
    pub indent: String,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self::with_indent_width(DEFAULT_INDENT_WIDTH)
    }
}

impl PatchOptions {
    pub fn with_indent_width(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
        }
    }

    /// Indentation for a line at `level`.
    pub fn indent_for(&self, level: usize) -> String {
        self.indent.repeat(level)
    }
}
