//! End-to-end patching of text and files.

use crate::config::PatchOptions;
use crate::error::{PatchError, Result};
use crate::merge::merge;
use crate::parser::{parse, read_config_text};
use crate::rewrite::{RewriteOutcome, Rewriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Patch `source_text` with `patch_text`.
///
/// The source is parsed once and shared by the merge and the rewrite.
pub fn patch_text(source_text: &str, patch_text: &str, options: &PatchOptions) -> RewriteOutcome {
    let source = parse(source_text);
    let patch = parse(patch_text);
    let merged = merge(&source, &patch);
    debug!(
        source_keys = source.len(),
        patch_keys = patch.len(),
        merged_keys = merged.len(),
        "Merged config trees"
    );
    Rewriter::new(&source, &merged, &patch, options).rewrite(source_text)
}

/// One source/patch/output triple.
#[derive(Debug, Clone)]
pub struct PatchJob {
    pub source: PathBuf,
    pub patch: PathBuf,
    /// Output file; the source is overwritten when unset.
    pub output: Option<PathBuf>,
    /// Compute the result without writing it.
    pub dry_run: bool,
    pub options: PatchOptions,
}

impl PatchJob {
    pub fn new(source: impl Into<PathBuf>, patch: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            patch: patch.into(),
            output: None,
            dry_run: false,
            options: PatchOptions::default(),
        }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_options(mut self, options: PatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.source)
    }

    /// Read both inputs, patch, and write the output once.
    ///
    /// Missing inputs read as empty configs. The output is not written
    /// atomically.
    pub fn run(&self) -> Result<RewriteOutcome> {
        let source_text = read_config_text(&self.source)?;
        let patch_input = read_config_text(&self.patch)?;

        debug!(
            source = %self.source.display(),
            patch = %self.patch.display(),
            source_bytes = source_text.len(),
            patch_bytes = patch_input.len(),
            "Patching config"
        );
        let outcome = patch_text(&source_text, &patch_input, &self.options);

        if self.dry_run {
            debug!(output = %self.output_path().display(), "Dry run, not writing output");
            return Ok(outcome);
        }

        let output = self.output_path();
        std::fs::write(output, &outcome.text).map_err(|source| PatchError::Write {
            path: output.to_path_buf(),
            source,
        })?;
        info!(
            output = %output.display(),
            changed = outcome.report.changed.len(),
            added = outcome.report.added.len(),
            removed = outcome.report.removed.len(),
            "Wrote patched config"
        );

        Ok(outcome)
    }
}
