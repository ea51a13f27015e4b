//! The component/prop intermediate representation.
//!
//! A [`ProgramDocument`] is produced once per extraction pass and only read
//! afterwards: the generator and the injector take it by shared reference.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Every component extracted from a program, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramDocument {
    pub body: Vec<ComponentNode>,
}

impl ProgramDocument {
    pub fn new(body: Vec<ComponentNode>) -> Self {
        Self { body }
    }

    /// Components extracted from the file at `path`.
    pub fn components_for<'a>(
        &'a self,
        path: &'a Utf8Path,
    ) -> impl Iterator<Item = &'a ComponentNode> + 'a {
        self.body
            .iter()
            .filter(move |component| component.origin_file_path == path)
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComponentNode> {
        self.body.iter()
    }
}

impl<'a> IntoIterator for &'a ProgramDocument {
    type Item = &'a ComponentNode;
    type IntoIter = std::slice::Iter<'a, ComponentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.body.iter()
    }
}

/// Which declaration shape a component was recognized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    /// Function declaration or function-valued `const`.
    Function,
    /// Class extending `Component`/`PureComponent`.
    Class,
    /// `forwardRef(...)` or `memo(...)`.
    Wrapped,
}

/// One recognized component and its props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub name: String,
    /// Absolute path of the file the component was extracted from.
    pub origin_file_path: Utf8PathBuf,
    pub kind: ComponentKind,
    pub props: Vec<PropDescriptor>,
    /// Expansions of named types that were cut short as [`TypeShape::Reference`].
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, TypeShape>,
}

impl ComponentNode {
    pub fn prop(&self, name: &str) -> Option<&PropDescriptor> {
        self.props.iter().find(|prop| prop.name == name)
    }
}

/// A single prop of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDescriptor {
    pub name: String,
    pub required: bool,
    pub shape: TypeShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Literal>,
    /// JSDoc text written above the prop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// The declared type as written in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
}

impl PropDescriptor {
    /// A required prop with no default, doc or type text.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            required: true,
            shape,
            default_value: None,
            doc: None,
            type_text: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A literal value, either a literal type or a default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Literal {
    /// Whether both literals are of the same primitive kind.
    pub fn same_kind(&self, other: &Literal) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    Object,
    Array,
    /// Anything; also the marker for types that could not be resolved.
    Any,
}

/// React renderable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Anything React can render (`ReactNode`).
    Node,
    /// A React element (`ReactElement`, `JSX.Element`).
    Element,
    /// A component or intrinsic tag name (`ComponentType`, `ElementType`).
    ElementType,
}

/// The resolved shape of a prop's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    Literal(Literal),
    /// Two or more literals of the same primitive kind.
    EnumOfLiterals(Vec<Literal>),
    ArrayOf(Box<TypeShape>),
    ObjectOf(Vec<PropDescriptor>),
    UnionOf(Vec<TypeShape>),
    FunctionSignature,
    /// A named type whose expansion lives in [`ComponentNode::definitions`].
    Reference(String),
    Element(ElementKind),
    /// An instance of a class such as `Date`.
    InstanceOf(String),
}

impl TypeShape {
    pub fn any() -> Self {
        TypeShape::Primitive(PrimitiveKind::Any)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeShape::Primitive(PrimitiveKind::Any))
    }
}
