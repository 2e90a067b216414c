//! Summary of what a patch run changed.
//!
//! The rewriter records every value it rewrites, every key or section it
//! appends and every section it drops, in output order.

use crate::error::Result;
use crate::tree::SectionPath;
use serde::Serialize;
use std::fmt;

/// A value rewritten in place.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValueChange {
    pub section: SectionPath,
    pub key: String,
    pub old_value: String,
    pub new_value: String,
}

/// What kind of item was appended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AddedKind {
    Key,
    Section,
}

/// A key or section that did not exist in the source.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Addition {
    pub section: SectionPath,
    pub key: String,
    pub kind: AddedKind,
}

/// All changes applied while rewriting one file.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PatchReport {
    pub changed: Vec<ValueChange>,
    pub added: Vec<Addition>,
    /// Sections omitted from the output, outermost only.
    pub removed: Vec<SectionPath>,
}

impl PatchReport {
    /// Check if the output differs structurally from the source.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.changed.len() + self.added.len() + self.removed.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "No changes.")?;
            return Ok(());
        }

        if !self.changed.is_empty() {
            writeln!(f, "Changed ({}):", self.changed.len())?;
            for change in &self.changed {
                writeln!(
                    f,
                    "    ~ {} {}: {} -> {}",
                    change.section, change.key, change.old_value, change.new_value
                )?;
            }
        }

        if !self.added.is_empty() {
            writeln!(f, "Added ({}):", self.added.len())?;
            for added in &self.added {
                let marker = match added.kind {
                    AddedKind::Key => "",
                    AddedKind::Section => " [section]",
                };
                writeln!(f, "    + {} {}{}", added.section, added.key, marker)?;
            }
        }

        if !self.removed.is_empty() {
            writeln!(f, "Removed ({}):", self.removed.len())?;
            for section in &self.removed {
                writeln!(f, "    - {}", section)?;
            }
        }

        writeln!(f, "Summary: {} total changes", self.total_changes())?;
        Ok(())
    }
}
