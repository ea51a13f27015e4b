//! Main orchestration logic.

use crate::cli::{Args, Mode};
use crate::config::{self, ToolConfig};
use crate::output::{FileReport, FileStatus, Formatter, RunSummary};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::Diagnostic;
use proptypes::{
    assemble_with, generate, inject, ComponentNode, ExtractError, ProgramDocument, ResolverOptions,
};
use rayon::prelude::*;
use std::fs;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_program::{create_program, ProgramError, SourceKind};
use walkdir::WalkDir;

/// Errors that stop a run before any file is processed.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("invalid glob pattern: {0}")]
    #[diagnostic(code(ts_proptypes::glob))]
    InvalidGlob(String),

    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(ts_proptypes::io))]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    #[diagnostic(code(ts_proptypes::config))]
    Config { path: Utf8PathBuf, message: String },

    #[error("path is not valid UTF-8: {0}")]
    #[diagnostic(code(ts_proptypes::path))]
    NonUtf8Path(String),

    #[error(transparent)]
    #[diagnostic(code(ts_proptypes::program))]
    Program(#[from] ProgramError),

    #[error(transparent)]
    #[diagnostic(code(ts_proptypes::extract))]
    Extract(#[from] ExtractError),
}

/// Extensions tried, in order, when looking for a file's transpiled output.
const OUTPUT_EXTENSIONS: [&str; 4] = ["js", "jsx", "mjs", "cjs"];

/// Runs one pass over the workspace and prints the results.
pub fn run(args: &Args) -> Result<RunSummary, CliError> {
    let workspace = workspace_root(&args.workspace)?;
    let config = ToolConfig::resolve(args, &workspace)?;
    let (compiler_options, tsconfig) = config::compiler_options(args, &workspace)?;
    if let Some(path) = &tsconfig {
        debug!(%path, "loaded tsconfig");
    }
    let out_dir = args
        .out_dir
        .as_deref()
        .map(|dir| config::absolute(&workspace, dir));

    let files = if args.files.is_empty() {
        let ignore = ignore_set(&args.ignore, out_dir.as_deref(), &workspace)?;
        discover(&workspace, &ignore)
    } else {
        args.files
            .iter()
            .map(|file| config::absolute(&workspace, file))
            .collect()
    };
    info!(files = files.len(), "building program");

    let program = create_program(&files, compiler_options)?;
    // Program paths are normalized; use them so origin paths compare equal.
    let mut roots: Vec<Utf8PathBuf> = Vec::with_capacity(files.len());
    for file in &files {
        if let Some(source) = program.file(file) {
            if !roots.iter().any(|root| root == source.path()) {
                roots.push(source.path().to_path_buf());
            }
        }
    }

    let document = assemble_with(&program, &roots, &ResolverOptions::default())?;
    info!(components = document.len(), "extracted components");

    let formatter = Formatter::new(args.output, &workspace);
    if args.mode == Mode::Ast {
        println!("{}", formatter.document(&document));
        return Ok(RunSummary {
            file_count: roots.len(),
            component_count: document.len(),
            failed_count: 0,
        });
    }

    let source_root = common_root(&roots).unwrap_or_else(|| workspace.clone());
    let job = Job {
        args,
        config: &config,
        source_root: &source_root,
        out_dir: out_dir.as_deref(),
        document: &document,
    };
    let reports: Vec<FileReport> = roots
        .par_iter()
        .filter_map(|path| match args.mode {
            Mode::Inject => job.inject_file(path),
            _ => job.generate_file(path),
        })
        .collect();

    let summary = RunSummary {
        file_count: reports.len(),
        component_count: reports.iter().map(|report| report.components.len()).sum(),
        failed_count: reports
            .iter()
            .filter(|report| report.status == FileStatus::Failed)
            .count(),
    };
    print!("{}", formatter.reports(&reports, &summary));
    if args.output == crate::cli::OutputFormat::Human {
        eprintln!("{}", summary.format());
    }
    Ok(summary)
}

/// Per-file work shared across rayon workers.
struct Job<'a> {
    args: &'a Args,
    config: &'a ToolConfig,
    /// Deepest directory containing every source, mirrored under `--out-dir`.
    source_root: &'a Utf8Path,
    out_dir: Option<&'a Utf8Path>,
    document: &'a ProgramDocument,
}

impl Job<'_> {
    fn components(&self, path: &Utf8Path) -> Option<ProgramDocument> {
        let components: Vec<ComponentNode> = self.document.components_for(path).cloned().collect();
        (!components.is_empty()).then(|| ProgramDocument::new(components))
    }

    fn report(&self, path: &Utf8Path, document: &ProgramDocument) -> FileReport {
        FileReport {
            source: path.to_path_buf(),
            target: None,
            components: document.iter().map(|c| c.name.clone()).collect(),
            status: FileStatus::Generated,
            output: None,
            message: None,
        }
    }

    fn generate_file(&self, path: &Utf8Path) -> Option<FileReport> {
        let document = self.components(path)?;
        let mut report = self.report(path, &document);
        let text = generate(&document, self.config.generator_options());

        if !self.args.write {
            report.output = Some(text);
            return Some(report);
        }

        let target = self
            .target_dir(path)
            .join(format!("{}.propTypes.js", source_stem(path)));
        match write_file(&target, &text) {
            Ok(()) => report.status = FileStatus::Written,
            Err(err) => report.fail(err),
        }
        report.target = Some(target);
        Some(report)
    }

    fn inject_file(&self, path: &Utf8Path) -> Option<FileReport> {
        let document = self.components(path)?;
        let mut report = self.report(path, &document);

        let Some(target) = self.transpiled_output(path) else {
            warn!(file = %path, "no transpiled output found");
            report.status = FileStatus::Skipped;
            report.message = Some(format!(
                "no transpiled output found in {}",
                self.target_dir(path)
            ));
            return Some(report);
        };

        let source = match fs::read_to_string(&target) {
            Ok(source) => source,
            Err(err) => {
                report.target = Some(target.clone());
                report.fail(format!("failed to read {target}: {err}"));
                return Some(report);
            }
        };

        match inject(&document, &source, &self.config.inject_options()) {
            Ok(text) if self.args.write => match write_file(&target, &text) {
                Ok(()) => report.status = FileStatus::Written,
                Err(err) => report.fail(err),
            },
            Ok(text) => {
                report.status = FileStatus::Injected;
                report.output = Some(text);
            }
            Err(err) => {
                debug!(file = %target, error = %err, "injection failed");
                report.fail(err.to_string());
            }
        }
        report.target = Some(target);
        Some(report)
    }

    /// Directory holding the outputs for `path`: the matching directory under
    /// `--out-dir`, or the source's own directory.
    fn target_dir(&self, path: &Utf8Path) -> Utf8PathBuf {
        let parent = path.parent().unwrap_or(self.source_root);
        match self.out_dir {
            Some(out_dir) => match parent.strip_prefix(self.source_root) {
                Ok(relative) => out_dir.join(relative),
                Err(_) => out_dir.to_path_buf(),
            },
            None => parent.to_path_buf(),
        }
    }

    fn transpiled_output(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        let dir = self.target_dir(path);
        let stem = source_stem(path);
        OUTPUT_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|candidate| candidate.is_file())
    }
}

/// The deepest directory that contains every path, like `tsc`'s inferred `rootDir`.
fn common_root(paths: &[Utf8PathBuf]) -> Option<Utf8PathBuf> {
    let mut root = paths.first()?.parent()?.to_path_buf();
    for path in &paths[1..] {
        while !path.starts_with(&root) {
            root = root.parent()?.to_path_buf();
        }
    }
    Some(root)
}

fn write_file(path: &Utf8Path, text: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| format!("failed to create {parent}: {err}"))?;
    }
    fs::write(path, text).map_err(|err| format!("failed to write {path}: {err}"))
}

/// File name without its TypeScript extension (`Button.d.ts` -> `Button`).
fn source_stem(path: &Utf8Path) -> &str {
    let name = path.file_name().unwrap_or_default();
    [".d.ts", ".d.mts", ".d.cts", ".tsx", ".ts", ".mts", ".cts"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
}

fn workspace_root(workspace: &Utf8Path) -> Result<Utf8PathBuf, CliError> {
    if workspace.is_absolute() {
        return Ok(workspace.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| CliError::Io {
        path: Utf8PathBuf::from("."),
        source,
    })?;
    let cwd = Utf8PathBuf::try_from(cwd)
        .map_err(|err| CliError::NonUtf8Path(err.into_path_buf().display().to_string()))?;
    Ok(cwd.join(workspace))
}

fn ignore_set(
    patterns: &[String],
    out_dir: Option<&Utf8Path>,
    workspace: &Utf8Path,
) -> Result<GlobSet, CliError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| CliError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }

    for pattern in ["**/node_modules/**", "**/dist/**", "**/.git/**"] {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    if let Some(relative) = out_dir.and_then(|dir| dir.strip_prefix(workspace).ok()) {
        if !relative.as_str().is_empty() {
            let glob = Glob::new(&format!("{relative}/**"))
                .map_err(|e| CliError::InvalidGlob(e.to_string()))?;
            builder.add(glob);
        }
    }

    builder
        .build()
        .map_err(|e| CliError::InvalidGlob(e.to_string()))
}

/// Every TypeScript file under `workspace` not matched by `ignore`, sorted.
fn discover(workspace: &Utf8Path, ignore: &GlobSet) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| SourceKind::from_path(p).is_some())
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p);
            !ignore.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_stem() {
        assert_eq!(source_stem(Utf8Path::new("/src/Button.tsx")), "Button");
        assert_eq!(source_stem(Utf8Path::new("/src/types.d.ts")), "types");
        assert_eq!(source_stem(Utf8Path::new("/src/util.ts")), "util");
        assert_eq!(source_stem(Utf8Path::new("/src/README")), "README");
    }

    #[test]
    fn test_common_root() {
        let paths = [
            Utf8PathBuf::from("/app/src/components/Button.tsx"),
            Utf8PathBuf::from("/app/src/index.ts"),
        ];
        assert_eq!(common_root(&paths), Some(Utf8PathBuf::from("/app/src")));
        assert_eq!(
            common_root(&paths[..1]),
            Some(Utf8PathBuf::from("/app/src/components"))
        );
        assert_eq!(common_root(&[]), None);
    }

    #[test]
    fn test_relative_workspace() {
        let root = workspace_root(Utf8Path::new("project")).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("project"));
    }

    #[test]
    fn test_discover_respects_ignores() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        for file in [
            "src/Button.tsx",
            "src/types.d.ts",
            "src/Button.stories.tsx",
            "src/Button.js",
            "node_modules/react/index.d.ts",
            "build/Button.d.ts",
        ] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }

        let ignore = ignore_set(
            &["**/*.stories.tsx".to_string()],
            Some(root.join("build").as_path()),
            &root,
        )
        .unwrap();
        let files: Vec<String> = discover(&root, &ignore)
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_string())
            .collect();
        assert_eq!(files, ["src/Button.tsx", "src/types.d.ts"]);
    }

    #[test]
    fn test_invalid_glob() {
        let result = ignore_set(&["[".to_string()], None, Utf8Path::new("/"));
        assert!(matches!(result, Err(CliError::InvalidGlob(_))));
    }
}
