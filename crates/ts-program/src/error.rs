//! Program construction errors.

use camino::Utf8PathBuf;
use thiserror::Error;

/// An error raised while loading configuration or building a [`Program`](crate::Program).
#[derive(Debug, Error)]
pub enum ProgramError {
    /// A source or config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Program roots must be absolute so origin paths are stable.
    #[error("source path must be absolute: {0}")]
    NotAbsolute(Utf8PathBuf),

    /// A source file is not valid TypeScript.
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: Utf8PathBuf,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
        message: String,
    },

    /// A tsconfig file is malformed.
    #[error("invalid config {path}: {message}")]
    Config { path: Utf8PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ProgramError::Parse {
            path: Utf8PathBuf::from("/src/Button.tsx"),
            line: 3,
            column: 14,
            message: "Expected '}', got '<eof>'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "/src/Button.tsx:3:14: Expected '}', got '<eof>'"
        );
    }
}
