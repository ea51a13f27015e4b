//! Concatenation of per-file extraction results.

use crate::error::ExtractError;
use crate::extractor::extract_with;
use crate::resolver::ResolverOptions;
use crate::types::{ComponentNode, ProgramDocument};
use camino::Utf8Path;
use rayon::prelude::*;
use tracing::debug;
use ts_program::Program;

/// Extracts every file in `file_paths`, keeping the given order.
pub fn assemble<P: AsRef<Utf8Path> + Sync>(
    program: &Program,
    file_paths: &[P],
) -> Result<ProgramDocument, ExtractError> {
    assemble_with(program, file_paths, &ResolverOptions::default())
}

/// Files are extracted in parallel; the first failing path, in input order, is reported.
pub fn assemble_with<P: AsRef<Utf8Path> + Sync>(
    program: &Program,
    file_paths: &[P],
    options: &ResolverOptions,
) -> Result<ProgramDocument, ExtractError> {
    let extracted: Vec<Result<Vec<ComponentNode>, ExtractError>> = file_paths
        .par_iter()
        .map(|path| extract_with(program, path.as_ref(), options))
        .collect();
    let mut body = Vec::new();
    for components in extracted {
        body.extend(components?);
    }
    debug!(files = file_paths.len(), components = body.len(), "assembled program document");
    Ok(ProgramDocument::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use ts_program::CompilerOptions;

    fn program() -> Program {
        Program::from_sources(
            [
                (
                    Utf8PathBuf::from("/src/a.tsx"),
                    "export function A(props: { x: string }) { return <div />; }\n\
                     export function B(props: { y: number }) { return <div />; }\n"
                        .to_string(),
                ),
                (
                    Utf8PathBuf::from("/src/c.tsx"),
                    "export const C = (props: { z: boolean }) => <span />;\n".to_string(),
                ),
            ],
            CompilerOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_order_follows_paths() {
        let program = program();
        let doc = assemble(&program, &["/src/c.tsx", "/src/a.tsx"]).unwrap();
        let names: Vec<_> = doc.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn test_unknown_path_fails() {
        let program = program();
        let err = assemble(&program, &["/src/a.tsx", "/src/missing.tsx"]).unwrap_err();
        assert_eq!(
            err,
            ExtractError::FileNotInProgram(Utf8PathBuf::from("/src/missing.tsx"))
        );
    }
}
