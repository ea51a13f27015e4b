//! Error types for extraction and injection.

use camino::Utf8PathBuf;
use thiserror::Error;

/// The props symbol handed to the resolver does not name a type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cannot find type `{name}` in {file}")]
    UnknownSymbol { name: String, file: Utf8PathBuf },

    #[error("`{name}` in {file} is not a type")]
    NotAType { name: String, file: Utf8PathBuf },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("file is not part of the program: {0}")]
    FileNotInProgram(Utf8PathBuf),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Why validators could not be injected. The input text is never modified on error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectError {
    #[error("failed to parse source at {line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("no declaration found for component `{component}`")]
    ComponentNotFound { component: String },

    #[error("component `{component}` matches {count} declarations")]
    Ambiguous { component: String, count: usize },

    #[error("component `{component}` already declares propTypes at {line}:{column}")]
    ExistingValidator {
        component: String,
        line: u32,
        column: u32,
    },

    #[error("internal edit conflict while injecting `{component}`: {message}")]
    Edit { component: String, message: String },
}

impl InjectError {
    /// The component the error is about, if any.
    pub fn component(&self) -> Option<&str> {
        match self {
            InjectError::Parse { .. } => None,
            InjectError::ComponentNotFound { component }
            | InjectError::Ambiguous { component, .. }
            | InjectError::ExistingValidator { component, .. }
            | InjectError::Edit { component, .. } => Some(component),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_error_display() {
        let error = InjectError::ExistingValidator {
            component: "Button".to_string(),
            line: 7,
            column: 1,
        };
        assert_eq!(
            error.to_string(),
            "component `Button` already declares propTypes at 7:1"
        );
        assert_eq!(error.component(), Some("Button"));
    }
}
