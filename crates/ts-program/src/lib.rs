//! TypeScript program handle for ts-proptypes.
//!
//! This crate turns a list of absolute file paths plus compiler options into a
//! read-only [`Program`]:
//! - every file is parsed with swc (TSX for `.tsx`, ambient mode for `.d.ts`)
//! - top-level declarations, imports and exports are bound per file
//! - names resolve across files, through re-exports and `export *`
//! - JSDoc comments stay attached to the nodes they document
//!
//! # Example
//!
//! ```
//! use camino::{Utf8Path, Utf8PathBuf};
//! use ts_program::{CompilerOptions, Program};
//!
//! let program = Program::from_sources(
//!     [(
//!         Utf8PathBuf::from("/src/Button.tsx"),
//!         "export interface Props { label: string }".to_string(),
//!     )],
//!     CompilerOptions::default(),
//! )
//! .unwrap();
//!
//! let file = program.file_id(Utf8Path::new("/src/Button.tsx")).unwrap();
//! assert!(program.lookup_type(file, "Props").is_some());
//! ```

mod binder;
mod config;
mod error;
mod parse;
mod program;

pub use binder::{Declaration, ExportTarget, FileSymbols, ImportBinding};
pub use config::{load_config, CompilerOptions};
pub use error::ProgramError;
pub use parse::SourceKind;
pub use program::{create_program, DeclRef, FileId, Program, Resolution, SourceFile};
