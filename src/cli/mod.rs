//! CLI definitions for config-patcher
//!
//! This module defines the CLI structure using clap's derive macros.

use crate::config::{DEFAULT_INDENT_WIDTH, PatchOptions};
use crate::logging::LogTarget;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Format of the change report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Patch a config file and format the output.
#[derive(Parser, Debug)]
#[command(
    name = "config-patcher",
    version,
    about,
    long_about = None,
    disable_version_flag = true,
    override_usage = "config-patcher [-h] source patch [-o OUTFILE]",
    after_help = "Examples:\n  config-patcher source.conf source.patch\n  config-patcher source.conf source.patch -o patched.conf"
)]
pub struct Cli {
    /// The source config file
    pub source: PathBuf,

    /// The patch config file
    pub patch: PathBuf,

    /// The output file (default: overwrite the source)
    #[arg(short, long, value_name = "OUTFILE")]
    pub outfile: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Spaces per nesting level for newly added lines
    #[arg(long, value_name = "N", default_value_t = DEFAULT_INDENT_WIDTH)]
    pub indent: usize,

    /// Print the patched config to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Print a summary of the applied changes to stderr
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub report: Option<ReportFormat>,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: LogTarget,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions::with_indent_width(self.indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_and_outfile() {
        let cli = Cli::try_parse_from(["config-patcher", "a.conf", "a.patch", "-o", "out.conf"])
            .unwrap();
        assert_eq!(cli.source, PathBuf::from("a.conf"));
        assert_eq!(cli.patch, PathBuf::from("a.patch"));
        assert_eq!(cli.outfile, Some(PathBuf::from("out.conf")));
        assert_eq!(cli.log, LogTarget::Stderr);
        assert_eq!(cli.patch_options(), PatchOptions::default());
        assert!(!cli.dry_run);
        assert!(cli.report.is_none());
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "config-patcher",
            "a.conf",
            "a.patch",
            "--outfile",
            "b.conf",
            "--indent",
            "2",
            "--dry-run",
            "--report",
            "json",
            "--log",
            "off",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.outfile, Some(PathBuf::from("b.conf")));
        assert_eq!(cli.patch_options().indent, "  ");
        assert!(cli.dry_run);
        assert_eq!(cli.report, Some(ReportFormat::Json));
        assert_eq!(cli.log, LogTarget::Off);
        assert!(cli.verbose);
    }

    #[test]
    fn test_missing_positional_is_an_error() {
        let err = Cli::try_parse_from(["config-patcher", "a.conf"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        let err = Cli::try_parse_from(["config-patcher", "a", "b", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_version_flags() {
        for flag in ["-v", "--version"] {
            let err = Cli::try_parse_from(["config-patcher", flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        }
    }
}
