//! The read-only program handle shared by every extraction call.

use crate::binder::{bind_module, Declaration, ExportTarget, FileSymbols, ImportBinding};
use crate::parse::{parse_source, SourceKind};
use crate::{CompilerOptions, ProgramError};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use std::collections::VecDeque;
use std::fs;
use swc_common::{BytePos, Span as SwcSpan};
use swc_ecma_ast::Module;
use text_edit::Span;

/// Index of a file inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// All declarations bound under one name in one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub file: FileId,
    pub name: SmolStr,
}

/// What a name resolves to from the point of view of some file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Declarations inside the program.
    Local(DeclRef),
    /// `import * as ns` of a program file.
    Namespace(FileId),
    /// A binding from a module that is not part of the program (e.g. `react`).
    External { module: SmolStr, name: SmolStr },
    /// `import * as ns` of a module outside the program.
    ExternalNamespace(SmolStr),
}

/// One parsed and bound source file.
#[derive(Debug)]
pub struct SourceFile {
    id: FileId,
    path: Utf8PathBuf,
    kind: SourceKind,
    text: String,
    module: Module,
    file_start: BytePos,
    jsdoc: FxHashMap<u32, String>,
    symbols: FileSymbols,
    is_root: bool,
}

impl SourceFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Absolute, normalized path of the file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn symbols(&self) -> &FileSymbols {
        &self.symbols
    }

    /// Whether the file was named by the caller rather than reached through an import.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_declaration_file(&self) -> bool {
        self.kind == SourceKind::Declaration
    }

    /// File-relative byte offset of an swc position.
    pub fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.file_start.0) as usize
    }

    /// Converts an swc span to a file-relative [`Span`].
    pub fn span(&self, span: SwcSpan) -> Span {
        Span::from_usize(self.offset(span.lo), self.offset(span.hi))
    }

    /// Source text covered by an swc span.
    pub fn text_of(&self, span: SwcSpan) -> &str {
        self.span(span).slice(&self.text).unwrap_or("")
    }

    /// JSDoc comment attached to the node starting at `pos`.
    pub fn jsdoc_at(&self, pos: BytePos) -> Option<&str> {
        self.jsdoc
            .get(&(self.offset(pos) as u32))
            .map(String::as_str)
    }
}

/// A set of parsed, bound TypeScript files with cross-file name resolution.
///
/// The program is immutable once built: extraction calls only read from it,
/// so one instance can serve any number of them.
#[derive(Debug)]
pub struct Program {
    options: CompilerOptions,
    files: Vec<SourceFile>,
    by_path: IndexMap<Utf8PathBuf, FileId>,
    /// Declarations of files without imports/exports, visible everywhere.
    globals: FxHashMap<SmolStr, DeclRef>,
}

/// Builds a program from files on disk.
///
/// Every path must be absolute. With `follow_imports`, files reached through
/// relative or `paths`-mapped imports are loaded too.
pub fn create_program<P: AsRef<Utf8Path>>(
    paths: &[P],
    options: CompilerOptions,
) -> Result<Program, ProgramError> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let text = read_source(path)?;
        sources.push((path.to_path_buf(), text));
    }
    Program::from_sources(sources, options)
}

fn read_source(path: &Utf8Path) -> Result<String, ProgramError> {
    fs::read_to_string(path).map_err(|source| ProgramError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Program {
    /// Builds a program from in-memory sources, still following imports on disk.
    pub fn from_sources<I>(sources: I, options: CompilerOptions) -> Result<Program, ProgramError>
    where
        I: IntoIterator<Item = (Utf8PathBuf, String)>,
    {
        let mut pending: IndexMap<Utf8PathBuf, String> = IndexMap::new();
        for (path, text) in sources {
            if !path.is_absolute() {
                return Err(ProgramError::NotAbsolute(path));
            }
            pending.insert(normalize_path(&path), text);
        }
        let roots: FxHashSet<Utf8PathBuf> = pending.keys().cloned().collect();

        let mut program = Program {
            options,
            files: Vec::new(),
            by_path: IndexMap::new(),
            globals: FxHashMap::default(),
        };

        let mut queue: VecDeque<Utf8PathBuf> = pending.keys().cloned().collect();
        while let Some(path) = queue.pop_front() {
            if program.by_path.contains_key(&path) {
                continue;
            }
            let Some(kind) = SourceKind::from_path(&path) else {
                tracing::debug!("skipping non-TypeScript file {path}");
                continue;
            };
            let text = match pending.swap_remove(&path) {
                Some(text) => text,
                None => read_source(&path)?,
            };

            let parsed = parse_source(&path, &text, kind)?;
            let symbols = bind_module(&parsed.module);
            let id = FileId(program.files.len() as u32);

            if program.options.follow_imports {
                for request in symbols.module_requests() {
                    let target = program.resolve_module_path(&path, &request, |candidate| {
                        pending.contains_key(candidate) || candidate.is_file()
                    });
                    if let Some(target) = target {
                        if !program.by_path.contains_key(&target) && !queue.contains(&target) {
                            queue.push_back(target);
                        }
                    }
                }
            }

            if !symbols.is_module {
                for name in symbols.locals.keys() {
                    program.globals.entry(name.clone()).or_insert(DeclRef {
                        file: id,
                        name: name.clone(),
                    });
                }
            }

            tracing::debug!("loaded {path} as {id:?}");
            program.by_path.insert(path.clone(), id);
            program.files.push(SourceFile {
                id,
                is_root: roots.contains(&path),
                path,
                kind,
                text,
                module: parsed.module,
                file_start: parsed.file_start,
                jsdoc: parsed.jsdoc,
                symbols,
            });
        }

        Ok(program)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// All files in load order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    /// Files named by the caller, in the order given.
    pub fn root_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.is_root)
    }

    pub fn source(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn file_id(&self, path: &Utf8Path) -> Option<FileId> {
        self.by_path.get(&normalize_path(path)).copied()
    }

    pub fn file(&self, path: &Utf8Path) -> Option<&SourceFile> {
        self.file_id(path).map(|id| self.source(id))
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.file_id(path).is_some()
    }

    /// Declarations behind a [`DeclRef`]; several for merged interfaces.
    pub fn declarations(&self, decl: &DeclRef) -> &[Declaration] {
        self.source(decl.file)
            .symbols
            .locals
            .get(&decl.name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolves `name` as seen from the top level of `file`.
    pub fn resolve_name(&self, file: FileId, name: &str) -> Option<Resolution> {
        self.resolve_name_inner(file, name, &mut FxHashSet::default())
    }

    /// Resolves an exported name of `file`, following re-exports.
    pub fn resolve_export(&self, file: FileId, name: &str) -> Option<Resolution> {
        self.resolve_export_inner(file, name, &mut FxHashSet::default())
    }

    /// First type-level declaration visible as `name` from `file`.
    pub fn lookup_type(&self, file: FileId, name: &str) -> Option<DeclRef> {
        match self.resolve_name(file, name)? {
            Resolution::Local(decl) => self
                .declarations(&decl)
                .iter()
                .any(Declaration::is_type)
                .then_some(decl),
            _ => None,
        }
    }

    /// Resolves a module specifier used in `from` to a program file.
    pub fn resolve_module(&self, from: FileId, specifier: &str) -> Option<FileId> {
        let from_path = &self.source(from).path;
        let target = self.resolve_module_path(from_path, specifier, |candidate| {
            self.by_path.contains_key(candidate)
        })?;
        self.by_path.get(&target).copied()
    }

    fn resolve_name_inner(
        &self,
        file: FileId,
        name: &str,
        visited: &mut FxHashSet<(FileId, SmolStr)>,
    ) -> Option<Resolution> {
        if !visited.insert((file, SmolStr::new(name))) {
            return None;
        }
        let symbols = &self.source(file).symbols;
        if symbols.locals.contains_key(name) {
            return Some(Resolution::Local(DeclRef {
                file,
                name: SmolStr::new(name),
            }));
        }
        if let Some(binding) = symbols.imports.get(name) {
            let module = binding.module();
            return match (binding, self.resolve_module(file, module)) {
                (ImportBinding::Named { name, .. }, Some(target)) => {
                    self.resolve_export_inner(target, name, visited)
                }
                (ImportBinding::Named { module, name }, None) => Some(Resolution::External {
                    module: module.clone(),
                    name: name.clone(),
                }),
                (ImportBinding::Namespace { .. }, Some(target)) => {
                    Some(Resolution::Namespace(target))
                }
                (ImportBinding::Namespace { module }, None) => {
                    Some(Resolution::ExternalNamespace(module.clone()))
                }
            };
        }
        self.globals.get(name).cloned().map(Resolution::Local)
    }

    fn resolve_export_inner(
        &self,
        file: FileId,
        name: &str,
        visited: &mut FxHashSet<(FileId, SmolStr)>,
    ) -> Option<Resolution> {
        let symbols = &self.source(file).symbols;
        match symbols.exports.get(name) {
            Some(ExportTarget::Local(local)) => {
                return self.resolve_name_inner(file, local, visited);
            }
            Some(ExportTarget::ReExport { module, name }) => {
                return match self.resolve_module(file, module) {
                    Some(target) => {
                        if !visited.insert((target, SmolStr::new(format!("export:{name}")))) {
                            return None;
                        }
                        self.resolve_export_inner(target, name, visited)
                    }
                    None => Some(Resolution::External {
                        module: module.clone(),
                        name: name.clone(),
                    }),
                };
            }
            Some(ExportTarget::ReExportNamespace(module)) => {
                return match self.resolve_module(file, module) {
                    Some(target) => Some(Resolution::Namespace(target)),
                    None => Some(Resolution::ExternalNamespace(module.clone())),
                };
            }
            None => {}
        }

        if name == "default" {
            return None;
        }
        for module in &symbols.star_exports {
            let Some(target) = self.resolve_module(file, module) else {
                continue;
            };
            if !visited.insert((target, SmolStr::new(format!("export:{name}")))) {
                continue;
            }
            if let Some(found) = self.resolve_export_inner(target, name, visited) {
                return Some(found);
            }
        }
        None
    }

    /// Maps a specifier to a candidate file path, testing candidates with `exists`.
    fn resolve_module_path(
        &self,
        from: &Utf8Path,
        specifier: &str,
        exists: impl Fn(&Utf8Path) -> bool,
    ) -> Option<Utf8PathBuf> {
        let mut bases: Vec<Utf8PathBuf> = Vec::new();
        if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." {
            let dir = from.parent().unwrap_or(Utf8Path::new("/"));
            bases.push(normalize_path(&dir.join(specifier)));
        } else if specifier.starts_with('/') {
            bases.push(normalize_path(Utf8Path::new(specifier)));
        } else {
            bases.extend(self.mapped_paths(specifier));
            if let Some(base_url) = &self.options.base_url {
                bases.push(normalize_path(&base_url.join(specifier)));
            }
        }

        bases
            .iter()
            .flat_map(|base| module_candidates(base))
            .find(|candidate| exists(candidate))
    }

    /// Applies `compilerOptions.paths` patterns to a bare specifier.
    fn mapped_paths(&self, specifier: &str) -> Vec<Utf8PathBuf> {
        let Some(root) = self
            .options
            .base_url
            .as_ref()
            .or(self.options.paths_base.as_ref())
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (pattern, targets) in &self.options.paths {
            let captured = match pattern.split_once('*') {
                Some((prefix, suffix)) => specifier
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(suffix)),
                None => (pattern == specifier).then_some(""),
            };
            let Some(captured) = captured else {
                continue;
            };
            for target in targets {
                let target = target.replacen('*', captured, 1);
                out.push(normalize_path(&root.join(target)));
            }
        }
        out
    }
}

fn module_candidates(base: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut candidates = Vec::new();
    if SourceKind::from_path(base).is_some() {
        candidates.push(base.to_path_buf());
    }
    let as_str = base.as_str();
    for (js, ts) in [(".js", ".ts"), (".jsx", ".tsx"), (".mjs", ".mts"), (".cjs", ".cts")] {
        if let Some(stem) = as_str.strip_suffix(js) {
            candidates.push(Utf8PathBuf::from(format!("{stem}{ts}")));
            if js == ".js" {
                candidates.push(Utf8PathBuf::from(format!("{stem}.tsx")));
                candidates.push(Utf8PathBuf::from(format!("{stem}.d.ts")));
            }
        }
    }
    for ext in [".ts", ".tsx", ".d.ts"] {
        candidates.push(Utf8PathBuf::from(format!("{as_str}{ext}")));
    }
    for index in ["index.ts", "index.tsx", "index.d.ts"] {
        candidates.push(base.join(index));
    }
    candidates
}

/// Lexically normalizes `.` and `..` components without touching the file system.
pub(crate) fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn program(files: &[(&str, &str)]) -> Program {
        let sources = files
            .iter()
            .map(|(path, text)| (Utf8PathBuf::from(*path), text.to_string()));
        Program::from_sources(sources, CompilerOptions::default()).unwrap()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Utf8Path::new("/a/b/./c/../d.ts")),
            Utf8PathBuf::from("/a/b/d.ts")
        );
    }

    #[test]
    fn test_rejects_relative_paths() {
        let result = Program::from_sources(
            [(Utf8PathBuf::from("src/a.ts"), String::new())],
            CompilerOptions::default(),
        );
        assert!(matches!(result, Err(ProgramError::NotAbsolute(_))));
    }

    #[test]
    fn test_resolves_imports_across_files() {
        let program = program(&[
            ("/src/Button.tsx", "import { Props } from './types';\n"),
            ("/src/types.ts", "export interface Props { a: string }\n"),
        ]);
        let button = program.file_id(Utf8Path::new("/src/Button.tsx")).unwrap();
        let types = program.file_id(Utf8Path::new("/src/types.ts")).unwrap();
        assert_eq!(
            program.resolve_name(button, "Props"),
            Some(Resolution::Local(DeclRef {
                file: types,
                name: "Props".into()
            }))
        );
        assert_eq!(program.lookup_type(button, "Props").map(|d| d.file), Some(types));
    }

    #[test]
    fn test_follows_reexport_chains() {
        let program = program(&[
            ("/src/index.ts", "import { Props } from './barrel';\n"),
            ("/src/barrel.ts", "export * from './inner';\nexport { Alias as Renamed } from './inner';\n"),
            ("/src/inner.ts", "export interface Props { a: string }\ninterface Alias {}\nexport { Alias };\n"),
        ]);
        let index = program.file_id(Utf8Path::new("/src/index.ts")).unwrap();
        let barrel = program.file_id(Utf8Path::new("/src/barrel.ts")).unwrap();
        let inner = program.file_id(Utf8Path::new("/src/inner.ts")).unwrap();
        assert_eq!(
            program.resolve_name(index, "Props"),
            Some(Resolution::Local(DeclRef {
                file: inner,
                name: "Props".into()
            }))
        );
        assert_eq!(
            program.resolve_export(barrel, "Renamed"),
            Some(Resolution::Local(DeclRef {
                file: inner,
                name: "Alias".into()
            }))
        );
    }

    #[test]
    fn test_external_modules_stay_external() {
        let program = program(&[(
            "/src/a.tsx",
            "import React, { ReactNode } from 'react';\nimport * as PT from 'prop-types';\n",
        )]);
        let a = program.file_id(Utf8Path::new("/src/a.tsx")).unwrap();
        assert_eq!(
            program.resolve_name(a, "ReactNode"),
            Some(Resolution::External {
                module: "react".into(),
                name: "ReactNode".into()
            })
        );
        assert_eq!(
            program.resolve_name(a, "PT"),
            Some(Resolution::ExternalNamespace("prop-types".into()))
        );
        assert_eq!(program.resolve_name(a, "Missing"), None);
    }

    #[test]
    fn test_circular_reexports_terminate() {
        let program = program(&[
            ("/src/a.ts", "export * from './b';\n"),
            ("/src/b.ts", "export * from './a';\n"),
        ]);
        let a = program.file_id(Utf8Path::new("/src/a.ts")).unwrap();
        assert_eq!(program.resolve_export(a, "Nothing"), None);
    }

    #[test]
    fn test_script_declarations_are_global() {
        let program = program(&[
            ("/src/global.d.ts", "interface Theme { color: string }\n"),
            ("/src/a.ts", "export const x = 1;\n"),
        ]);
        let a = program.file_id(Utf8Path::new("/src/a.ts")).unwrap();
        assert!(program.lookup_type(a, "Theme").is_some());
    }

    #[test]
    fn test_paths_mapping() {
        let mut options = CompilerOptions::default();
        options.paths.insert("@/*".to_string(), vec!["src/*".to_string()]);
        options.paths_base = Some(Utf8PathBuf::from("/project"));
        let program = Program::from_sources(
            [
                (
                    Utf8PathBuf::from("/project/src/a.ts"),
                    "import { T } from '@/types';\n".to_string(),
                ),
                (
                    Utf8PathBuf::from("/project/src/types.ts"),
                    "export type T = string;\n".to_string(),
                ),
            ],
            options,
        )
        .unwrap();
        let a = program.file_id(Utf8Path::new("/project/src/a.ts")).unwrap();
        assert!(program.lookup_type(a, "T").is_some());
    }
}
