//! Configuration loading.

use crate::cli::Args;
use crate::orchestrator::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use proptypes::{GeneratorOptions, InjectOptions};
use serde::Deserialize;
use std::fs;
use ts_program::{load_config, CompilerOptions};

/// Options read from `--config`, before command-line overrides.
///
/// ```json
/// {
///   "generator": { "sortProps": true, "quoteStyle": "double" },
///   "injector": { "conflict": "replace", "ensureImport": false }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub generator: GeneratorOptions,
    pub injector: InjectorConfig,
}

/// Injection options without the generator part, which lives at the top level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InjectorConfig {
    pub conflict: proptypes::ConflictPolicy,
    pub include_unused_props: bool,
    pub ensure_import: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        let defaults = InjectOptions::default();
        Self {
            conflict: defaults.conflict,
            include_unused_props: defaults.include_unused_props,
            ensure_import: defaults.ensure_import,
        }
    }
}

impl ToolConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Utf8Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|err| CliError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Loads `--config` if given and applies the command-line flags on top.
    pub fn resolve(args: &Args, workspace: &Utf8Path) -> Result<Self, CliError> {
        let mut config = match &args.config {
            Some(path) => Self::load(&absolute(workspace, path))?,
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    /// Flags only override when given.
    pub fn apply_args(&mut self, args: &Args) {
        if args.sort_props {
            self.generator.sort_props = true;
        }
        if args.include_comments {
            self.generator.include_comments = true;
        }
        if args.no_jsdoc {
            self.generator.include_jsdoc = false;
        }
        if let Some(conflict) = args.conflict {
            self.injector.conflict = conflict.into();
        }
        if let Some(include) = args.include_unused_props {
            self.injector.include_unused_props = include;
        }
    }

    pub fn generator_options(&self) -> &GeneratorOptions {
        &self.generator
    }

    /// Injection options for transpiled JavaScript.
    pub fn inject_options(&self) -> InjectOptions {
        InjectOptions {
            typescript: false,
            conflict: self.injector.conflict,
            include_unused_props: self.injector.include_unused_props,
            ensure_import: self.injector.ensure_import,
            generator: self.generator.clone(),
        }
    }
}

/// Compiler options from `--tsconfig`, or `<workspace>/tsconfig.json` when it exists.
pub fn compiler_options(
    args: &Args,
    workspace: &Utf8Path,
) -> Result<(CompilerOptions, Option<Utf8PathBuf>), CliError> {
    let path = match &args.tsconfig {
        Some(path) => Some(absolute(workspace, path)),
        None => Some(workspace.join("tsconfig.json")).filter(|path| path.is_file()),
    };
    match path {
        Some(path) => {
            let options = load_config(&path).map_err(CliError::Program)?;
            Ok((options, Some(path)))
        }
        None => Ok((CompilerOptions::default(), None)),
    }
}

pub fn absolute(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use proptypes::{ConflictPolicy, QuoteStyle};

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("proptypes.json")).unwrap();
        fs::write(
            &path,
            r#"{
                "generator": { "sortProps": true, "quoteStyle": "double" },
                "injector": { "conflict": "replace", "ensureImport": false }
            }"#,
        )
        .unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert!(config.generator.sort_props);
        assert_eq!(config.generator.quote_style, QuoteStyle::Double);
        assert!(config.generator.include_jsdoc);
        assert_eq!(config.injector.conflict, ConflictPolicy::Replace);
        assert!(!config.injector.ensure_import);
        assert!(config.injector.include_unused_props);
    }

    #[test]
    fn test_unknown_sections_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("bad.json")).unwrap();
        fs::write(&path, r#"{ "generatr": {} }"#).unwrap();
        assert!(matches!(
            ToolConfig::load(&path),
            Err(CliError::Config { .. })
        ));
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = ToolConfig::default();
        config.injector.conflict = ConflictPolicy::Merge;
        let args = Args::parse_from([
            "ts-proptypes",
            "--sort-props",
            "--no-jsdoc",
            "--conflict",
            "fail",
        ]);
        config.apply_args(&args);
        assert!(config.generator.sort_props);
        assert!(!config.generator.include_jsdoc);
        assert_eq!(config.injector.conflict, ConflictPolicy::Fail);

        let options = config.inject_options();
        assert!(!options.typescript);
        assert!(options.generator.sort_props);
    }

    #[test]
    fn test_workspace_tsconfig_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "compilerOptions": { "strict": true } }"#,
        )
        .unwrap();

        let args = Args::parse_from(["ts-proptypes"]);
        let (options, path) = compiler_options(&args, &root).unwrap();
        assert!(options.strict_null_checks());
        assert_eq!(path, Some(root.join("tsconfig.json")));

        let empty = tempfile::tempdir().unwrap();
        let empty = Utf8PathBuf::from_path_buf(empty.path().to_path_buf()).unwrap();
        let (options, path) = compiler_options(&args, &empty).unwrap();
        assert_eq!(options, CompilerOptions::default());
        assert!(path.is_none());
    }
}
