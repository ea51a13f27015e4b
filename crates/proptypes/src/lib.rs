//! React `propTypes` from TypeScript prop types.
//!
//! The pipeline has three stages:
//! - [`extract`] recognizes components in one file of a [`ts_program::Program`]
//!   and resolves their props into a [`ComponentNode`] tree
//! - [`generate`] renders `Component.propTypes = { ... }` declarations
//! - [`inject`] splices those declarations into the transpiled JavaScript of
//!   the same file
//!
//! # Example
//!
//! ```
//! use camino::{Utf8Path, Utf8PathBuf};
//! use proptypes::{assemble, generate, GeneratorOptions};
//! use ts_program::{CompilerOptions, Program};
//!
//! let source = r#"
//! interface Props {
//!     name: string;
//!     onClick?: () => void;
//! }
//!
//! export function Button(props: Props) {
//!     return <button onClick={props.onClick}>{props.name}</button>;
//! }
//! "#;
//!
//! let program = Program::from_sources(
//!     [(Utf8PathBuf::from("/src/Button.tsx"), source.to_string())],
//!     CompilerOptions::default(),
//! )
//! .unwrap();
//!
//! let document = assemble(&program, &[Utf8Path::new("/src/Button.tsx")]).unwrap();
//! assert_eq!(
//!     generate(&document, &GeneratorOptions::default()),
//!     "Button.propTypes = {\n  name: PropTypes.string.isRequired,\n  onClick: PropTypes.func,\n};\n"
//! );
//! ```

mod assembler;
mod error;
mod extractor;
mod generator;
mod injector;
mod resolver;
mod types;
mod well_known;

pub use assembler::{assemble, assemble_with};
pub use error::{ExtractError, InjectError, ResolveError};
pub use extractor::{extract, extract_with, DeclarationShape};
pub use generator::{generate, generate_component, GeneratorOptions, QuoteStyle};
pub use injector::{inject, ConflictPolicy, InjectOptions};
pub use resolver::{resolve, resolve_with, PropsSymbol, Resolver, ResolverOptions};
pub use types::{
    ComponentKind, ComponentNode, ElementKind, Literal, PrimitiveKind, ProgramDocument,
    PropDescriptor, TypeShape,
};
