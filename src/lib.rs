//! Config Patcher Library
//!
//! Patches bracket-nested config files (`[section]`, `[[sub]]`, `key = value`,
//! `# comment`) with a second file of the same format. The result keeps the
//! source's comments, blank lines and ordering; changed values are rewritten
//! in place and new keys or sections are appended inside their section.
//!
//! ```
//! use config_patcher::{PatchOptions, patch_text};
//!
//! let outcome = patch_text(
//!     "[a]\nx = 1\n# note\ny = 2\n",
//!     "[a]\ny = 9\nz = 3\n",
//!     &PatchOptions::default(),
//! );
//! assert_eq!(outcome.text, "[a]\nx = 1\n# note\ny = 9\nz = 3\n");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod merge;
pub mod parser;
pub mod patcher;
pub mod report;
pub mod rewrite;
pub mod tree;

pub use config::PatchOptions;
pub use error::PatchError;
pub use patcher::{PatchJob, patch_text};
pub use report::PatchReport;
pub use rewrite::{RewriteOutcome, Rewriter, rewrite};
pub use tree::{ConfigTree, ConfigValue, SectionPath, get_section};
