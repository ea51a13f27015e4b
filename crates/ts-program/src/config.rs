//! Compiler options and `tsconfig.json` loading.

use crate::ProgramError;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;

/// The subset of TypeScript compiler options that affects prop extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// `strict` flag; implies `strictNullChecks` unless that is set explicitly.
    pub strict: bool,
    /// Explicit `strictNullChecks`.
    pub strict_null_checks: Option<bool>,
    /// Absolute `baseUrl` for non-relative module resolution.
    pub base_url: Option<Utf8PathBuf>,
    /// `paths` mappings, resolved against `base_url` (or the config directory).
    pub paths: IndexMap<String, Vec<String>>,
    /// Directory `paths` entries are relative to when `base_url` is unset.
    pub paths_base: Option<Utf8PathBuf>,
    /// Whether imports of root files are loaded into the program as well.
    pub follow_imports: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            strict: false,
            strict_null_checks: None,
            base_url: None,
            paths: IndexMap::new(),
            paths_base: None,
            follow_imports: true,
        }
    }
}

impl CompilerOptions {
    /// Options with `strict` enabled.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Whether `null` and `undefined` are distinct types.
    pub fn strict_null_checks(&self) -> bool {
        self.strict_null_checks.unwrap_or(self.strict)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfigFile {
    extends: Option<String>,
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    strict: Option<bool>,
    strict_null_checks: Option<bool>,
    base_url: Option<String>,
    paths: Option<IndexMap<String, Vec<String>>>,
}

/// Loads compiler options from a `tsconfig.json`, following relative `extends`.
///
/// Comments and trailing commas are accepted, as `tsc` does.
pub fn load_config(path: impl AsRef<Utf8Path>) -> Result<CompilerOptions, ProgramError> {
    let mut options = CompilerOptions::default();
    let mut chain = Vec::new();
    let mut next = Some(crate::program::normalize_path(path.as_ref()));

    while let Some(current) = next.take() {
        if chain.iter().any(|(p, _)| p == &current) {
            return Err(ProgramError::Config {
                path: current,
                message: "circular `extends`".to_string(),
            });
        }
        let config = read_config_file(&current)?;
        if let Some(parent) = config.extends.as_deref() {
            if parent.starts_with('.') {
                let dir = current.parent().unwrap_or(Utf8Path::new("/"));
                let mut parent_path = crate::program::normalize_path(&dir.join(parent));
                if !parent_path.as_str().ends_with(".json") {
                    parent_path = format!("{parent_path}.json").into();
                }
                next = Some(parent_path);
            } else {
                tracing::debug!("ignoring package `extends` {parent} in {current}");
            }
        }
        chain.push((current, config));
    }

    // Apply from the root of the chain so children override parents.
    for (config_path, config) in chain.into_iter().rev() {
        let dir = config_path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        let raw = config.compiler_options;
        if let Some(strict) = raw.strict {
            options.strict = strict;
        }
        if let Some(checks) = raw.strict_null_checks {
            options.strict_null_checks = Some(checks);
        }
        if let Some(base_url) = raw.base_url {
            options.base_url = Some(crate::program::normalize_path(&dir.join(base_url)));
        }
        if let Some(paths) = raw.paths {
            options.paths = paths;
            options.paths_base = Some(dir);
        }
    }

    Ok(options)
}

fn read_config_file(path: &Utf8Path) -> Result<TsConfigFile, ProgramError> {
    let content = fs::read_to_string(path).map_err(|source| ProgramError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_text(&content).map_err(|e| ProgramError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_config_text(content: &str) -> Result<TsConfigFile, serde_json::Error> {
    let cleaned = remove_trailing_commas(&remove_json_comments(content));
    serde_json::from_str(&cleaned)
}

/// Removes `//` and `/* */` comments outside of strings.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' && chars.peek() == Some(&'/') {
            while let Some(&next) = chars.peek() {
                if next == '\n' {
                    break;
                }
                chars.next();
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(next) = chars.next() {
                if next == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Drops commas directly followed (modulo whitespace) by `}` or `]`.
fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            result.push(c);
            if c == '\\' && i + 1 < chars.len() {
                result.push(chars[i + 1]);
                i += 1;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            result.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                result.push(c);
            }
        } else {
            result.push(c);
        }
        i += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_comments() {
        let json = r#"{
            // line comment
            "key": "value /* not a comment */" /* inline comment */
        }"#;

        let cleaned = remove_json_comments(json);
        assert!(!cleaned.contains("line comment"));
        assert!(!cleaned.contains("inline comment"));
        assert!(cleaned.contains("value /* not a comment */"));
    }

    #[test]
    fn test_trailing_commas() {
        let cleaned = remove_trailing_commas(r#"{ "a": [1, 2,], "b": ",}", }"#);
        assert_eq!(cleaned, r#"{ "a": [1, 2], "b": ",}" }"#);
    }

    #[test]
    fn test_parse_compiler_options() {
        let config = parse_config_text(
            r#"{
                // strict project
                "compilerOptions": {
                    "strict": true,
                    "paths": { "@/*": ["src/*"], },
                },
            }"#,
        )
        .unwrap();
        assert_eq!(config.compiler_options.strict, Some(true));
        assert_eq!(
            config.compiler_options.paths.unwrap()["@/*"],
            vec!["src/*".to_string()]
        );
    }

    #[test]
    fn test_strict_null_checks_follows_strict() {
        assert!(!CompilerOptions::default().strict_null_checks());
        assert!(CompilerOptions::strict().strict_null_checks());
        let options = CompilerOptions {
            strict: true,
            strict_null_checks: Some(false),
            ..Default::default()
        };
        assert!(!options.strict_null_checks());
    }

    #[test]
    fn test_load_config_with_extends() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        fs::write(
            root.join("tsconfig.base.json"),
            r#"{ "compilerOptions": { "strict": true, "baseUrl": "./src" } }"#,
        )
        .unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "extends": "./tsconfig.base", "compilerOptions": { "strictNullChecks": false } }"#,
        )
        .unwrap();

        let options = load_config(root.join("tsconfig.json")).unwrap();
        assert!(options.strict);
        assert!(!options.strict_null_checks());
        assert_eq!(options.base_url, Some(root.join("src")));
    }

    #[test]
    fn test_circular_extends_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("a.json"), r#"{ "extends": "./b" }"#).unwrap();
        let back = format!(
            r#"{{ "extends": "../{}/a.json" }}"#,
            root.file_name().unwrap()
        );
        fs::write(root.join("b.json"), back).unwrap();

        let result = load_config(root.join("a.json"));
        assert!(matches!(result, Err(ProgramError::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/definitely/not/here/tsconfig.json");
        assert!(matches!(result, Err(ProgramError::Io { .. })));
    }
}
