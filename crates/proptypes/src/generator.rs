//! Rendering of `Component.propTypes = { ... }` declarations.
//!
//! Generation is pure: the same document and options always produce the same
//! text.

use crate::types::{
    ComponentNode, ElementKind, Literal, PrimitiveKind, ProgramDocument, PropDescriptor, TypeShape,
};
use serde::Deserialize;

/// String literal quoting in generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteStyle {
    #[default]
    Single,
    Double,
}

impl QuoteStyle {
    fn quote(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorOptions {
    /// Emit props alphabetically instead of in declaration order.
    pub sort_props: bool,
    /// Annotate each prop with its declared TypeScript type.
    pub include_comments: bool,
    /// Emit each prop's JSDoc above it.
    pub include_jsdoc: bool,
    pub quote_style: QuoteStyle,
    /// Local name the validators are referenced through.
    pub imported_name: String,
    /// Line comment placed before every generated block.
    pub comment: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            sort_props: false,
            include_comments: false,
            include_jsdoc: true,
            quote_style: QuoteStyle::Single,
            imported_name: "PropTypes".to_string(),
            comment: None,
        }
    }
}

/// Renders every component of `document`, separated by a blank line.
pub fn generate(document: &ProgramDocument, options: &GeneratorOptions) -> String {
    document
        .iter()
        .map(|component| generate_component(component, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the `propTypes` assignment of one component, ending in a newline.
pub fn generate_component(component: &ComponentNode, options: &GeneratorOptions) -> String {
    let entries = prop_entries(component, options)
        .into_iter()
        .map(|(_, entry)| entry)
        .collect();
    render_block(&component.name, entries, options)
}

/// Wraps already rendered entries into `Name.propTypes = { ... };\n`.
pub(crate) fn render_block(name: &str, entries: Vec<String>, options: &GeneratorOptions) -> String {
    let mut out = String::new();
    if let Some(comment) = &options.comment {
        for line in comment.lines() {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(name);
    if entries.is_empty() {
        out.push_str(".propTypes = {};\n");
        return out;
    }
    out.push_str(".propTypes = {\n");
    for entry in entries {
        out.push_str(&entry);
    }
    out.push_str("};\n");
    out
}

/// One rendered `  key: validator,\n` entry per prop, keyed by prop name.
pub(crate) fn prop_entries(
    component: &ComponentNode,
    options: &GeneratorOptions,
) -> Vec<(String, String)> {
    let mut props: Vec<&PropDescriptor> = component.props.iter().collect();
    if options.sort_props {
        props.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let mut renderer = Renderer {
        component,
        options,
        expanding: Vec::new(),
    };

    props
        .into_iter()
        .map(|prop| {
            let mut entry = String::new();
            if options.include_jsdoc {
                if let Some(doc) = &prop.doc {
                    entry.push_str("  /**\n");
                    for line in doc.lines() {
                        if line.is_empty() {
                            entry.push_str("   *\n");
                        } else {
                            entry.push_str("   * ");
                            entry.push_str(line);
                            entry.push('\n');
                        }
                    }
                    entry.push_str("   */\n");
                }
            }
            if options.include_comments {
                if let Some(text) = &prop.type_text {
                    entry.push_str("  // ");
                    entry.push_str(&text.split_whitespace().collect::<Vec<_>>().join(" "));
                    entry.push('\n');
                }
            }
            entry.push_str("  ");
            entry.push_str(&property_key(&prop.name, options.quote_style));
            entry.push_str(": ");
            entry.push_str(&renderer.validator(prop));
            entry.push_str(",\n");
            (prop.name.clone(), entry)
        })
        .collect()
}

struct Renderer<'a> {
    component: &'a ComponentNode,
    options: &'a GeneratorOptions,
    /// Definitions currently being expanded.
    expanding: Vec<&'a str>,
}

impl<'a> Renderer<'a> {
    fn validator(&mut self, prop: &'a PropDescriptor) -> String {
        let mut out = self.shape(&prop.shape);
        if prop.required {
            out.push_str(".isRequired");
        }
        out
    }

    fn pt(&self, name: &str) -> String {
        format!("{}.{}", self.options.imported_name, name)
    }

    fn shape(&mut self, shape: &'a TypeShape) -> String {
        match shape {
            TypeShape::Primitive(kind) => self.pt(primitive_name(*kind)),
            TypeShape::Literal(literal) => {
                format!("{}([{}])", self.pt("oneOf"), self.literal(literal))
            }
            TypeShape::EnumOfLiterals(literals) => self.one_of(literals.iter()),
            TypeShape::ArrayOf(element) if element.is_any() => self.pt("array"),
            TypeShape::ArrayOf(element) => {
                let element = self.shape(element);
                format!("{}({})", self.pt("arrayOf"), element)
            }
            TypeShape::ObjectOf(props) if props.is_empty() => self.pt("object"),
            TypeShape::ObjectOf(props) => {
                let fields: Vec<String> = props
                    .iter()
                    .map(|prop| {
                        format!(
                            "{}: {}",
                            property_key(&prop.name, self.options.quote_style),
                            self.validator(prop)
                        )
                    })
                    .collect();
                format!("{}({{ {} }})", self.pt("shape"), fields.join(", "))
            }
            TypeShape::UnionOf(members) => self.one_of_type(members),
            TypeShape::FunctionSignature => self.pt("func"),
            TypeShape::Reference(name) => self.reference(name),
            TypeShape::Element(kind) => self.pt(match kind {
                ElementKind::Node => "node",
                ElementKind::Element => "element",
                ElementKind::ElementType => "elementType",
            }),
            TypeShape::InstanceOf(class) => format!("{}({})", self.pt("instanceOf"), class),
        }
    }

    fn one_of<'l>(&self, literals: impl Iterator<Item = &'l Literal>) -> String {
        let values: Vec<String> = literals.map(|l| self.literal(l)).collect();
        format!("{}([{}])", self.pt("oneOf"), values.join(", "))
    }

    /// `oneOfType`, with every literal member grouped into a single `oneOf`.
    fn one_of_type(&mut self, members: &'a [TypeShape]) -> String {
        let literals: Vec<&Literal> = members
            .iter()
            .filter_map(|member| match member {
                TypeShape::Literal(literal) => Some(literal),
                _ => None,
            })
            .collect();

        let mut rendered = Vec::new();
        let mut literals_done = false;
        for member in members {
            match member {
                TypeShape::Literal(_) if literals_done => {}
                TypeShape::Literal(_) => {
                    rendered.push(self.one_of(literals.iter().copied()));
                    literals_done = true;
                }
                other => {
                    let validator = self.shape(other);
                    if !rendered.contains(&validator) {
                        rendered.push(validator);
                    }
                }
            }
        }

        if rendered.len() == 1 {
            return rendered.remove(0);
        }
        format!("{}([{}])", self.pt("oneOfType"), rendered.join(", "))
    }

    /// Expands a definition once; re-entering it degrades to `object`.
    fn reference(&mut self, name: &'a str) -> String {
        if self.expanding.contains(&name) {
            return self.pt("object");
        }
        let Some(definition) = self.component.definitions.get(name) else {
            return self.pt("object");
        };
        self.expanding.push(name);
        let rendered = self.shape(definition);
        self.expanding.pop();
        rendered
    }

    fn literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::String(value) => quote_string(value, self.options.quote_style),
            Literal::Number(value) => crate::resolver::format_number(*value),
            Literal::Boolean(value) => value.to_string(),
            Literal::Null => "null".to_string(),
        }
    }
}

fn primitive_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "string",
        PrimitiveKind::Number | PrimitiveKind::BigInt => "number",
        PrimitiveKind::Boolean => "bool",
        PrimitiveKind::Symbol => "symbol",
        PrimitiveKind::Object => "object",
        PrimitiveKind::Array => "array",
        PrimitiveKind::Any => "any",
    }
}

pub(crate) fn quote_string(value: &str, style: QuoteStyle) -> String {
    let quote = style.quote();
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn property_key(name: &str, style: QuoteStyle) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote_string(name, style)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentKind;
    use camino::Utf8PathBuf;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn component(name: &str, props: Vec<PropDescriptor>) -> ComponentNode {
        ComponentNode {
            name: name.to_string(),
            origin_file_path: Utf8PathBuf::from("/src/components.tsx"),
            kind: ComponentKind::Function,
            props,
            definitions: IndexMap::new(),
        }
    }

    fn button() -> ComponentNode {
        component(
            "Button",
            vec![
                PropDescriptor::new("name", TypeShape::Primitive(PrimitiveKind::String)),
                PropDescriptor::new("onClick", TypeShape::FunctionSignature).optional(),
            ],
        )
    }

    #[test]
    fn test_button() {
        let output = generate_component(&button(), &GeneratorOptions::default());
        assert_eq!(
            output,
            "Button.propTypes = {\n  name: PropTypes.string.isRequired,\n  onClick: PropTypes.func,\n};\n"
        );
    }

    #[test]
    fn test_document_is_separated_by_blank_lines_and_idempotent() {
        let doc = ProgramDocument::new(vec![
            button(),
            component(
                "Empty",
                vec![],
            ),
        ]);
        let options = GeneratorOptions::default();
        let first = generate(&doc, &options);
        assert_eq!(first, generate(&doc, &options));
        insta::assert_snapshot!(first, @r"
        Button.propTypes = {
          name: PropTypes.string.isRequired,
          onClick: PropTypes.func,
        };

        Empty.propTypes = {};
        ");
    }

    #[test]
    fn test_shape_mapping() {
        let props = vec![
            PropDescriptor::new(
                "size",
                TypeShape::EnumOfLiterals(vec![
                    Literal::String("small".into()),
                    Literal::String("it's".into()),
                ]),
            ),
            PropDescriptor::new(
                "value",
                TypeShape::UnionOf(vec![
                    TypeShape::Literal(Literal::String("auto".into())),
                    TypeShape::Primitive(PrimitiveKind::Number),
                    TypeShape::Literal(Literal::Number(-1.5)),
                ]),
            )
            .optional(),
            PropDescriptor::new(
                "items",
                TypeShape::ArrayOf(Box::new(TypeShape::ObjectOf(vec![
                    PropDescriptor::new("id", TypeShape::Primitive(PrimitiveKind::Number)),
                    PropDescriptor::new("aria-label", TypeShape::Primitive(PrimitiveKind::String))
                        .optional(),
                ]))),
            ),
            PropDescriptor::new("list", TypeShape::ArrayOf(Box::new(TypeShape::any()))).optional(),
            PropDescriptor::new("children", TypeShape::Element(ElementKind::Node)).optional(),
            PropDescriptor::new("as", TypeShape::Element(ElementKind::ElementType)).optional(),
            PropDescriptor::new("when", TypeShape::InstanceOf("Date".into())).optional(),
            PropDescriptor::new("flag", TypeShape::Literal(Literal::Boolean(true))).optional(),
            PropDescriptor::new("big", TypeShape::Primitive(PrimitiveKind::BigInt)).optional(),
        ];
        let output = generate_component(&component("Widget", props), &GeneratorOptions::default());
        insta::assert_snapshot!(output, @r"
        Widget.propTypes = {
          size: PropTypes.oneOf(['small', 'it\'s']).isRequired,
          value: PropTypes.oneOfType([PropTypes.oneOf(['auto', -1.5]), PropTypes.number]),
          items: PropTypes.arrayOf(PropTypes.shape({ id: PropTypes.number.isRequired, 'aria-label': PropTypes.string })).isRequired,
          list: PropTypes.array,
          children: PropTypes.node,
          as: PropTypes.elementType,
          when: PropTypes.instanceOf(Date),
          flag: PropTypes.oneOf([true]),
          big: PropTypes.number,
        };
        ");
    }

    #[test]
    fn test_options() {
        let mut doc_prop = PropDescriptor::new("zeta", TypeShape::Primitive(PrimitiveKind::String));
        doc_prop.doc = Some("Last letter.\n\nReally.".to_string());
        doc_prop.type_text = Some("string".to_string());
        let props = vec![
            doc_prop,
            PropDescriptor::new(
                "alpha",
                TypeShape::EnumOfLiterals(vec![
                    Literal::String("a".into()),
                    Literal::String("b".into()),
                ]),
            )
            .optional(),
        ];
        let options = GeneratorOptions {
            sort_props: true,
            include_comments: true,
            quote_style: QuoteStyle::Double,
            imported_name: "PT".to_string(),
            comment: Some("Generated".to_string()),
            ..GeneratorOptions::default()
        };
        let output = generate_component(&component("Sorted", props), &options);
        insta::assert_snapshot!(output, @r#"
        // Generated
        Sorted.propTypes = {
          alpha: PT.oneOf(["a", "b"]),
          /**
           * Last letter.
           *
           * Really.
           */
          // string
          zeta: PT.string.isRequired,
        };
        "#);

        let without_docs = GeneratorOptions {
            include_jsdoc: false,
            ..GeneratorOptions::default()
        };
        let output = generate_component(&component("Plain", vec![]), &without_docs);
        assert_eq!(output, "Plain.propTypes = {};\n");
    }

    #[test]
    fn test_references_expand_once() {
        let mut tree = component(
            "Tree",
            vec![PropDescriptor::new(
                "node",
                TypeShape::Reference("Node".into()),
            )],
        );
        tree.definitions.insert(
            "Node".to_string(),
            TypeShape::ObjectOf(vec![
                PropDescriptor::new("label", TypeShape::Primitive(PrimitiveKind::String)),
                PropDescriptor::new(
                    "children",
                    TypeShape::ArrayOf(Box::new(TypeShape::Reference("Node".into()))),
                )
                .optional(),
            ]),
        );
        let output = generate_component(&tree, &GeneratorOptions::default());
        assert_eq!(
            output,
            "Tree.propTypes = {\n  node: PropTypes.shape({ label: PropTypes.string.isRequired, children: PropTypes.arrayOf(PropTypes.object) }).isRequired,\n};\n"
        );
    }

    #[test]
    fn test_options_deserialize_from_camel_case() {
        let options: GeneratorOptions =
            serde_json::from_str(r#"{ "sortProps": true, "quoteStyle": "double" }"#).unwrap();
        assert!(options.sort_props);
        assert_eq!(options.quote_style, QuoteStyle::Double);
        assert!(options.include_jsdoc);
        assert_eq!(options.imported_name, "PropTypes");
    }
}
