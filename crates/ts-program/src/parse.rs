//! swc parsing of program sources.

use crate::ProgramError;
use camino::Utf8Path;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use swc_common::comments::{CommentKind, SingleThreadedComments};
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use text_edit::LineIndex;

/// What kind of TypeScript file a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// `.ts`
    TypeScript,
    /// `.tsx`
    Tsx,
    /// `.d.ts` (also `.d.mts`/`.d.cts`)
    Declaration,
}

impl SourceKind {
    /// Classifies a path by extension. Returns `None` for non-TypeScript files.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        let name = path.file_name()?;
        if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
            Some(SourceKind::Declaration)
        } else if name.ends_with(".tsx") {
            Some(SourceKind::Tsx)
        } else if name.ends_with(".ts") || name.ends_with(".mts") || name.ends_with(".cts") {
            Some(SourceKind::TypeScript)
        } else {
            None
        }
    }

    fn syntax(self) -> Syntax {
        Syntax::Typescript(TsSyntax {
            tsx: self == SourceKind::Tsx,
            dts: self == SourceKind::Declaration,
            decorators: true,
            ..Default::default()
        })
    }
}

/// A parsed module plus the data needed to map swc positions back to text.
pub(crate) struct ParsedSource {
    pub module: Module,
    pub file_start: BytePos,
    /// JSDoc text keyed by the file-relative offset of the node it precedes.
    pub jsdoc: FxHashMap<u32, String>,
}

pub(crate) fn parse_source(
    path: &Utf8Path,
    text: &str,
    kind: SourceKind,
) -> Result<ParsedSource, ProgramError> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom(path.to_string()).into(),
        text.to_string(),
    );
    let file_start = fm.start_pos;
    let comments = SingleThreadedComments::default();

    let mut parser = Parser::new(kind.syntax(), StringInput::from(&*fm), Some(&comments));
    let module = parser.parse_module().map_err(|err| {
        let offset = err.span().lo.0.saturating_sub(file_start.0);
        let (line, column) = LineIndex::new(text).one_based(offset.into());
        ProgramError::Parse {
            path: path.to_path_buf(),
            line,
            column,
            message: err.kind().msg().into_owned(),
        }
    })?;

    if let Some(err) = parser.take_errors().into_iter().next() {
        let offset = err.span().lo.0.saturating_sub(file_start.0);
        let (line, column) = LineIndex::new(text).one_based(offset.into());
        return Err(ProgramError::Parse {
            path: path.to_path_buf(),
            line,
            column,
            message: err.kind().msg().into_owned(),
        });
    }

    drop(parser);

    let (leading, _trailing) = comments.borrow_all();
    let mut jsdoc = FxHashMap::default();
    for (pos, list) in leading.iter() {
        let doc = list
            .iter()
            .rev()
            .filter(|c| c.kind == CommentKind::Block)
            .find_map(|c| clean_jsdoc(&c.text));
        if let Some(doc) = doc {
            jsdoc.insert(pos.0.saturating_sub(file_start.0), doc);
        }
    }

    Ok(ParsedSource {
        module,
        file_start,
        jsdoc,
    })
}

/// Strips the `*` gutter from a `/** ... */` comment body.
///
/// swc hands over the text between `/*` and `*/`, so JSDoc bodies start with `*`.
fn clean_jsdoc(raw: &str) -> Option<String> {
    let body = raw.strip_prefix('*')?;
    if body.starts_with('*') {
        return None;
    }
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();

    let text = lines.join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_kind() {
        assert_eq!(
            SourceKind::from_path(Utf8Path::new("/a/Button.tsx")),
            Some(SourceKind::Tsx)
        );
        assert_eq!(
            SourceKind::from_path(Utf8Path::new("/a/index.d.ts")),
            Some(SourceKind::Declaration)
        );
        assert_eq!(
            SourceKind::from_path(Utf8Path::new("/a/util.ts")),
            Some(SourceKind::TypeScript)
        );
        assert_eq!(SourceKind::from_path(Utf8Path::new("/a/util.js")), None);
    }

    #[test]
    fn test_clean_jsdoc() {
        assert_eq!(
            clean_jsdoc("*\n   * The label.\n   * Second line.\n   ").as_deref(),
            Some("The label.\nSecond line.")
        );
        assert_eq!(clean_jsdoc("* one liner ").as_deref(), Some("one liner"));
        assert_eq!(clean_jsdoc(" plain block "), None);
        assert_eq!(clean_jsdoc("*****"), None);
    }

    #[test]
    fn test_parse_collects_jsdoc() {
        let text = "interface Props {\n  /** The label. */\n  label: string;\n}\n";
        let parsed = parse_source(Utf8Path::new("/a.ts"), text, SourceKind::TypeScript).unwrap();
        let offset = text.find("label:").unwrap() as u32;
        assert_eq!(
            parsed.jsdoc.get(&offset).map(String::as_str),
            Some("The label.")
        );
    }

    #[test]
    fn test_parse_error_position() {
        let text = "const a = 1;\nconst b = ;\n";
        let err = parse_source(Utf8Path::new("/broken.ts"), text, SourceKind::TypeScript)
            .err()
            .unwrap();
        match err {
            ProgramError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
