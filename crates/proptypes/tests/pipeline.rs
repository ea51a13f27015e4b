//! End-to-end tests: program -> document -> generated/injected text.

use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use proptypes::{
    assemble, extract, generate, inject, ConflictPolicy, GeneratorOptions, InjectError,
    InjectOptions, PrimitiveKind, ProgramDocument, TypeShape,
};
use serde_json::json;
use ts_program::{create_program, CompilerOptions, Program};

const BUTTON_TSX: &str = r#"interface Props {
  name: string;
  onClick?: () => void;
}

export function Button(props: Props) {
  return <button onClick={props.onClick}>{props.name}</button>;
}
"#;

const BUTTON_JS: &str = r#"export function Button(props) {
  return React.createElement("button", { onClick: props.onClick }, props.name);
}
"#;

const BUTTON_BLOCK: &str = "Button.propTypes = {\n  name: PropTypes.string.isRequired,\n  onClick: PropTypes.func,\n};\n";

fn program(files: &[(&str, &str)]) -> Program {
    Program::from_sources(
        files
            .iter()
            .map(|(path, text)| (Utf8PathBuf::from(*path), text.to_string())),
        CompilerOptions::default(),
    )
    .unwrap()
}

fn button_document() -> ProgramDocument {
    let program = program(&[("/src/Button.tsx", BUTTON_TSX)]);
    assemble(&program, &["/src/Button.tsx"]).unwrap()
}

#[test]
fn button_is_extracted_generated_and_injected() {
    let doc = button_document();
    assert_eq!(doc.len(), 1);
    let button = &doc.body[0];
    assert_eq!(button.name, "Button");
    assert_eq!(button.origin_file_path, Utf8Path::new("/src/Button.tsx"));

    let props: Vec<_> = button
        .props
        .iter()
        .map(|p| (p.name.as_str(), p.required, p.shape.clone()))
        .collect();
    assert_eq!(
        props,
        [
            ("name", true, TypeShape::Primitive(PrimitiveKind::String)),
            ("onClick", false, TypeShape::FunctionSignature),
        ]
    );

    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(
        json["body"][0]["props"][0]["shape"],
        json!({ "kind": "primitive", "value": "string" })
    );
    assert_eq!(
        json["body"][0]["props"][1]["shape"],
        json!({ "kind": "functionSignature" })
    );

    assert_eq!(generate(&doc, &GeneratorOptions::default()), BUTTON_BLOCK);

    let injected = inject(&doc, BUTTON_JS, &InjectOptions::default()).unwrap();
    assert_eq!(
        injected,
        format!("import PropTypes from 'prop-types';\n{BUTTON_JS}\n{BUTTON_BLOCK}")
    );
}

#[test]
fn existing_validator_is_rejected_and_input_kept() {
    let doc = button_document();
    let once = inject(&doc, BUTTON_JS, &InjectOptions::default()).unwrap();
    let before = once.clone();

    let err = inject(&doc, &once, &InjectOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        InjectError::ExistingValidator { ref component, line: 6, column: 1 } if component == "Button"
    ));
    assert_eq!(once, before);

    let replace = InjectOptions {
        conflict: ConflictPolicy::Replace,
        ..InjectOptions::default()
    };
    assert_eq!(inject(&doc, &once, &replace).unwrap(), once);
}

#[test]
fn generation_is_idempotent() {
    let doc = button_document();
    let options = GeneratorOptions::default();
    assert_eq!(generate(&doc, &options), generate(&doc, &options));
    assert_eq!(generate(&button_document(), &options), generate(&doc, &options));
}

#[test]
fn duplicate_component_names_are_ambiguous() {
    let program = program(&[
        (
            "/src/a.tsx",
            "export const Card = (props: { title: string }) => <h1>{props.title}</h1>;\n",
        ),
        (
            "/src/b.tsx",
            "export const Card = (props: { body: string }) => <p>{props.body}</p>;\n",
        ),
    ]);
    let doc = assemble(&program, &["/src/a.tsx", "/src/b.tsx"]).unwrap();
    let source = "export const Card = (props) => null;\n";
    let err = inject(&doc, source, &InjectOptions::default()).unwrap_err();
    assert_eq!(
        err,
        InjectError::Ambiguous {
            component: "Card".to_string(),
            count: 2
        }
    );
}

#[test]
fn self_referential_props_generate_bounded_output() {
    let program = program(&[(
        "/src/Tree.tsx",
        r#"interface TreeNode {
  label: string;
  children?: TreeNode[];
}

export function Tree(props: { root: TreeNode }) {
  return <ul>{props.root.label}</ul>;
}
"#,
    )]);
    let doc = assemble(&program, &["/src/Tree.tsx"]).unwrap();
    let tree = &doc.body[0];
    assert!(tree.definitions.contains_key("TreeNode"));

    let output = generate(&doc, &GeneratorOptions::default());
    insta::assert_snapshot!(output, @r"
    Tree.propTypes = {
      root: PropTypes.shape({ label: PropTypes.string.isRequired, children: PropTypes.arrayOf(PropTypes.shape({ label: PropTypes.string.isRequired, children: PropTypes.arrayOf(PropTypes.object) })) }).isRequired,
    };
    ");
}

#[test]
fn components_keep_file_then_declaration_order() {
    let program = program(&[
        (
            "/src/first.tsx",
            "export function Zeta(props: { z: string }) { return <i />; }\n\
             export function Alpha(props: { a: string }) { return <i />; }\n",
        ),
        (
            "/src/second.tsx",
            "export const Mid = (props: { m: number }) => <b />;\n",
        ),
    ]);
    let doc = assemble(&program, &["/src/second.tsx", "/src/first.tsx"]).unwrap();
    let names: Vec<_> = doc.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Mid", "Zeta", "Alpha"]);

    let generated = generate(&doc, &GeneratorOptions::default());
    let mid = generated.find("Mid.propTypes").unwrap();
    let zeta = generated.find("Zeta.propTypes").unwrap();
    let alpha = generated.find("Alpha.propTypes").unwrap();
    assert!(mid < zeta && zeta < alpha);
}

#[test]
fn injected_typescript_extracts_the_same_props() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let path = root.join("Button.tsx");
    std::fs::write(&path, BUTTON_TSX).unwrap();

    let program = create_program(&[&path], CompilerOptions::default()).unwrap();
    let original = extract(&program, &path).unwrap();
    let doc = ProgramDocument::new(original.clone());

    let options = InjectOptions {
        typescript: true,
        ..InjectOptions::default()
    };
    let injected = inject(&doc, BUTTON_TSX, &options).unwrap();
    assert!(injected.contains(BUTTON_BLOCK.trim_end()));
    std::fs::write(&path, &injected).unwrap();

    let reparsed = create_program(&[&path], CompilerOptions::default()).unwrap();
    let again = extract(&reparsed, &path).unwrap();
    assert_eq!(again.len(), 1);
    let shapes = |components: &[proptypes::ComponentNode]| -> Vec<(String, bool, TypeShape)> {
        components[0]
            .props
            .iter()
            .map(|p| (p.name.clone(), p.required, p.shape.clone()))
            .collect()
    };
    assert_eq!(shapes(&again), shapes(&original));
}

#[test]
fn unused_props_can_be_left_out() {
    let program = program(&[(
        "/src/Badge.tsx",
        "export function Badge({ label }: { label: string; tone?: 'info' | 'warn' }) {\n  return <span>{label}</span>;\n}\n",
    )]);
    let doc = assemble(&program, &["/src/Badge.tsx"]).unwrap();
    assert_eq!(doc.body[0].props.len(), 2);

    let source = "export function Badge({ label }) {\n  return label;\n}\n";
    let options = InjectOptions {
        include_unused_props: false,
        ensure_import: false,
        ..InjectOptions::default()
    };
    let output = inject(&doc, source, &options).unwrap();
    assert_eq!(
        output,
        format!("{source}\nBadge.propTypes = {{\n  label: PropTypes.string.isRequired,\n}};\n")
    );

    let everything = InjectOptions {
        ensure_import: false,
        ..InjectOptions::default()
    };
    let output = inject(&doc, source, &everything).unwrap();
    assert!(output.contains("  tone: PropTypes.oneOf(['info', 'warn']),\n"));
}

#[test]
fn imported_props_type_with_the_same_name_is_expanded() {
    let program = program(&[
        (
            "/src/List.tsx",
            "import { Props as ItemProps } from './Item';\n\
             interface Props { item: ItemProps; label: string }\n\
             export function List(props: Props) { return <ul />; }\n",
        ),
        ("/src/Item.tsx", "export interface Props { value: string }\n"),
    ]);
    let doc = assemble(&program, &["/src/List.tsx"]).unwrap();
    assert_eq!(
        generate(&doc, &GeneratorOptions::default()),
        "List.propTypes = {\n  item: PropTypes.shape({ value: PropTypes.string.isRequired }).isRequired,\n  label: PropTypes.string.isRequired,\n};\n"
    );
}
