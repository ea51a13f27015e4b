//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use proptypes::ConflictPolicy;

/// Generate React propTypes from TypeScript component props.
#[derive(Debug, Parser)]
#[command(name = "ts-proptypes")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Source files to process (defaults to every TypeScript file in the workspace)
    pub files: Vec<Utf8PathBuf>,

    /// Project root
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Path to tsconfig.json (defaults to <workspace>/tsconfig.json when present)
    #[arg(long)]
    pub tsconfig: Option<Utf8PathBuf>,

    /// What to produce
    #[arg(long, value_enum, default_value = "generate")]
    pub mode: Mode,

    /// Directory holding the transpiled JavaScript, mirroring the source tree
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Write results to disk instead of stdout
    #[arg(long)]
    pub write: bool,

    /// Sort props alphabetically
    #[arg(long = "sort-props")]
    pub sort_props: bool,

    /// Annotate each validator with the declared TypeScript type
    #[arg(long = "include-comments")]
    pub include_comments: bool,

    /// Do not copy JSDoc comments onto validators
    #[arg(long = "no-jsdoc")]
    pub no_jsdoc: bool,

    /// What to do when a component already declares propTypes
    #[arg(long, value_enum)]
    pub conflict: Option<ConflictArg>,

    /// Keep props the component never reads (inject mode)
    #[arg(long = "include-unused-props", num_args = 0..=1, default_missing_value = "true")]
    pub include_unused_props: Option<bool>,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// JSON file with `generator` and `injector` option objects
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

/// Processing mode.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum Mode {
    /// Print or write standalone propTypes declarations
    #[default]
    Generate,
    /// Insert propTypes into the transpiled JavaScript
    Inject,
    /// Print the extracted component document as JSON
    Ast,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ConflictArg {
    Fail,
    Replace,
    Merge,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Fail => ConflictPolicy::Fail,
            ConflictArg::Replace => ConflictPolicy::Replace,
            ConflictArg::Merge => ConflictPolicy::Merge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["ts-proptypes"]);
        assert_eq!(args.workspace.as_str(), ".");
        assert_eq!(args.mode, Mode::Generate);
        assert_eq!(args.output, OutputFormat::Human);
        assert!(args.files.is_empty());
        assert!(args.conflict.is_none());
        assert!(!args.write);
    }

    #[test]
    fn test_inject_flags() {
        let args = Args::parse_from([
            "ts-proptypes",
            "--mode",
            "inject",
            "--out-dir",
            "dist",
            "--conflict",
            "merge",
            "--include-unused-props",
            "false",
            "--write",
            "src/Button.tsx",
        ]);
        assert_eq!(args.mode, Mode::Inject);
        assert_eq!(args.out_dir.as_deref().map(|p| p.as_str()), Some("dist"));
        assert_eq!(args.conflict.map(ConflictPolicy::from), Some(ConflictPolicy::Merge));
        assert_eq!(args.include_unused_props, Some(false));
        assert!(args.write);
        assert_eq!(args.files, [Utf8PathBuf::from("src/Button.tsx")]);
    }

    #[test]
    fn test_output_and_ignore() {
        let args = Args::parse_from([
            "ts-proptypes",
            "--output",
            "json",
            "--ignore",
            "**/*.stories.tsx",
            "--ignore",
            "legacy/**",
        ]);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.ignore, ["**/*.stories.tsx", "legacy/**"]);
    }
}
