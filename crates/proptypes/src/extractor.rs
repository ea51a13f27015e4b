//! Component recognition over the top-level declarations of one file.
//!
//! Supported declaration shapes:
//! - `function Button(props: Props) { ... }` and `const Button = (props: Props) => ...`
//! - `const Button: FC<Props> = ...` (also `declare const` in `.d.ts` files)
//! - `class Button extends Component<Props> { ... }`
//! - `const Button = forwardRef<Ref, Props>(...)` and `memo(...)`
//!
//! Default values are read from destructuring defaults, `static defaultProps`
//! and `Button.defaultProps = { ... }` statements.

use crate::error::ExtractError;
use crate::resolver::{literal_expr, PropsSymbol, Resolver, ResolverOptions};
use crate::types::{ComponentKind, ComponentNode, Literal};
use camino::Utf8Path;
use indexmap::IndexMap;
use swc_ecma_ast::{
    ArrowExpr, AssignTarget, BlockStmtOrExpr, CallExpr, Callee, Class, ClassMember, Decl,
    DefaultDecl, Expr, Function, ModuleDecl, ModuleItem, ObjectLit, ObjectPatProp, Pat, Prop,
    PropName, PropOrSpread, SimpleAssignTarget, Stmt, TsEntityName, TsType, TsTypeAnn,
};
use swc_ecma_visit::{Visit, VisitWith};
use ts_program::{Program, SourceFile};

/// The closed set of structural predicates a component declaration can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationShape {
    /// Function declaration or function-valued binding returning JSX.
    FunctionComponent,
    /// Binding annotated as `FC<P>`, `FunctionComponent<P>`, `ComponentType<P>`...
    TypedFunctionComponent,
    /// Class extending `Component<P>` or `PureComponent<P>`.
    ClassComponent,
    /// `forwardRef(...)` / `memo(...)` call.
    WrappedComponent,
}

impl DeclarationShape {
    pub fn kind(self) -> ComponentKind {
        match self {
            DeclarationShape::FunctionComponent | DeclarationShape::TypedFunctionComponent => {
                ComponentKind::Function
            }
            DeclarationShape::ClassComponent => ComponentKind::Class,
            DeclarationShape::WrappedComponent => ComponentKind::Wrapped,
        }
    }
}

/// A declaration that matched one of the [`DeclarationShape`]s.
struct Candidate<'p> {
    name: String,
    shape: DeclarationShape,
    props: Option<&'p TsType>,
    defaults: IndexMap<String, Literal>,
}

/// Extracts every component declared at the top level of `file_path`.
pub fn extract(program: &Program, file_path: &Utf8Path) -> Result<Vec<ComponentNode>, ExtractError> {
    extract_with(program, file_path, &ResolverOptions::default())
}

pub fn extract_with(
    program: &Program,
    file_path: &Utf8Path,
    options: &ResolverOptions,
) -> Result<Vec<ComponentNode>, ExtractError> {
    let file = program
        .file(file_path)
        .ok_or_else(|| ExtractError::FileNotInProgram(file_path.to_path_buf()))?;

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    let mut assigned_defaults: IndexMap<String, IndexMap<String, Literal>> = IndexMap::new();

    for item in &file.module().body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => match_decl(decl, &mut candidates),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                match_decl(&export.decl, &mut candidates)
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => match &export.decl {
                DefaultDecl::Fn(fn_expr) => match &fn_expr.ident {
                    Some(ident) => {
                        candidates.extend(match_function(&ident.sym, &fn_expr.function))
                    }
                    None => tracing::debug!("skipping anonymous default-exported function"),
                },
                DefaultDecl::Class(class_expr) => match &class_expr.ident {
                    Some(ident) => candidates.extend(match_class(&ident.sym, &class_expr.class)),
                    None => tracing::debug!("skipping anonymous default-exported class"),
                },
                _ => {}
            },
            ModuleItem::Stmt(Stmt::Expr(stmt)) => {
                if let Some((component, defaults)) = default_props_assignment(&stmt.expr) {
                    assigned_defaults
                        .entry(component)
                        .or_default()
                        .extend(defaults);
                }
            }
            _ => {}
        }
    }

    let mut components: Vec<ComponentNode> = Vec::with_capacity(candidates.len());
    for mut candidate in candidates {
        if components.iter().any(|c| c.name == candidate.name) {
            tracing::debug!("skipping repeated declaration of `{}`", candidate.name);
            continue;
        }
        if let Some(defaults) = assigned_defaults.get(&candidate.name) {
            candidate
                .defaults
                .extend(defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        components.push(build_component(program, file, candidate, options)?);
    }

    tracing::debug!(
        "extracted {} component(s) from {}",
        components.len(),
        file.path()
    );
    Ok(components)
}

fn build_component(
    program: &Program,
    file: &SourceFile,
    candidate: Candidate<'_>,
    options: &ResolverOptions,
) -> Result<ComponentNode, ExtractError> {
    let mut resolver = Resolver::new(program, *options);
    let mut props = match candidate.props {
        Some(ty) => resolver.resolve_props(&PropsSymbol::Inline {
            file: file.id(),
            ty,
        })?,
        None => Vec::new(),
    };

    for prop in &mut props {
        if let Some(value) = candidate.defaults.get(&prop.name) {
            prop.default_value = Some(value.clone());
            prop.required = false;
        }
    }

    Ok(ComponentNode {
        name: candidate.name,
        origin_file_path: file.path().to_path_buf(),
        kind: candidate.shape.kind(),
        props,
        definitions: resolver.take_definitions(),
    })
}

fn match_decl<'p>(decl: &'p Decl, candidates: &mut Vec<Candidate<'p>>) {
    match decl {
        Decl::Fn(fn_decl) => candidates.extend(match_function(&fn_decl.ident.sym, &fn_decl.function)),
        Decl::Class(class_decl) => {
            candidates.extend(match_class(&class_decl.ident.sym, &class_decl.class))
        }
        Decl::Var(var) => {
            for declarator in &var.decls {
                let Pat::Ident(binding) = &declarator.name else {
                    continue;
                };
                let name = &*binding.id.sym;
                let candidate = match_variable(name, binding.type_ann.as_deref(), declarator.init.as_deref());
                candidates.extend(candidate);
            }
        }
        _ => {}
    }
}

fn match_variable<'p>(
    name: &str,
    annotation: Option<&'p TsTypeAnn>,
    init: Option<&'p Expr>,
) -> Option<Candidate<'p>> {
    if let Some(props) = annotation.and_then(|ann| function_component_type(&ann.type_ann)) {
        let defaults = init
            .and_then(|init| function_params(unwrap_parens(init)))
            .and_then(|params| params.first().copied())
            .map(destructuring_defaults)
            .unwrap_or_default();
        return Some(Candidate {
            name: name.to_string(),
            shape: DeclarationShape::TypedFunctionComponent,
            props,
            defaults,
        });
    }

    match unwrap_parens(init?) {
        Expr::Arrow(arrow) => match_function_like(
            name,
            arrow.params.iter().collect(),
            arrow.return_type.as_deref(),
            returns_jsx_arrow(arrow),
        ),
        Expr::Fn(fn_expr) => match_function(name, &fn_expr.function),
        Expr::Class(class_expr) => match_class(name, &class_expr.class),
        Expr::Call(call) => match_wrapped(name, call),
        _ => None,
    }
}

fn match_function<'p>(name: &str, function: &'p Function) -> Option<Candidate<'p>> {
    let params: Vec<&Pat> = function.params.iter().map(|p| &p.pat).collect();
    let returns_jsx = function.body.as_ref().is_some_and(|body| contains_jsx(body));
    match_function_like(name, params, function.return_type.as_deref(), returns_jsx)
}

fn match_function_like<'p>(
    name: &str,
    params: Vec<&'p Pat>,
    return_type: Option<&TsTypeAnn>,
    returns_jsx: bool,
) -> Option<Candidate<'p>> {
    if params.is_empty() || params.len() > 2 {
        return None;
    }
    let first = params[0];
    let props = param_annotation(first)?;
    let returns_element = return_type.is_some_and(|ann| is_element_type(&ann.type_ann));
    if !(returns_jsx || returns_element || is_pascal_case(name)) {
        return None;
    }
    Some(Candidate {
        name: name.to_string(),
        shape: DeclarationShape::FunctionComponent,
        props: Some(props),
        defaults: destructuring_defaults(first),
    })
}

fn match_class<'p>(name: &str, class: &'p Class) -> Option<Candidate<'p>> {
    let super_class = class.super_class.as_deref()?;
    let base = match super_class {
        Expr::Ident(ident) => &*ident.sym,
        Expr::Member(member) => &*member.prop.as_ident()?.sym,
        _ => return None,
    };
    if base != "Component" && base != "PureComponent" {
        return None;
    }

    let props = class
        .super_type_params
        .as_deref()
        .and_then(|args| args.params.first())
        .map(|ty| &**ty);
    if props.is_none() {
        tracing::debug!("class `{name}` extends {base} without a props type");
    }

    let mut defaults = IndexMap::new();
    for member in &class.body {
        if let ClassMember::ClassProp(prop) = member {
            if prop.is_static && prop_name(&prop.key).as_deref() == Some("defaultProps") {
                if let Some(Expr::Object(object)) = prop.value.as_deref() {
                    defaults.extend(object_defaults(object));
                }
            }
        }
    }

    Some(Candidate {
        name: name.to_string(),
        shape: DeclarationShape::ClassComponent,
        props,
        defaults,
    })
}

fn match_wrapped<'p>(name: &str, call: &'p CallExpr) -> Option<Candidate<'p>> {
    let wrapper = wrapper_name(call)?;
    let (props, first_param) = wrapped_props(call, wrapper)?;
    Some(Candidate {
        name: name.to_string(),
        shape: DeclarationShape::WrappedComponent,
        props,
        defaults: first_param.map(destructuring_defaults).unwrap_or_default(),
    })
}

/// `forwardRef` or `memo`, bare or namespace-qualified.
fn wrapper_name(call: &CallExpr) -> Option<&str> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let name = match &**callee {
        Expr::Ident(ident) => &*ident.sym,
        Expr::Member(member) => &*member.prop.as_ident()?.sym,
        _ => return None,
    };
    matches!(name, "forwardRef" | "memo").then_some(name)
}

/// Props type and props parameter of a wrapped component.
fn wrapped_props<'p>(
    call: &'p CallExpr,
    wrapper: &str,
) -> Option<(Option<&'p TsType>, Option<&'p Pat>)> {
    let explicit = call.type_args.as_deref().and_then(|args| {
        let index = if wrapper == "forwardRef" { 1 } else { 0 };
        args.params.get(index).map(|ty| &**ty)
    });

    let inner = call.args.first().map(|arg| unwrap_parens(&arg.expr));
    let (inner_props, first_param) = match inner {
        Some(Expr::Call(inner_call)) => match wrapper_name(inner_call) {
            Some(inner_wrapper) => wrapped_props(inner_call, inner_wrapper)?,
            None => (None, None),
        },
        Some(expr) => {
            let first = function_params(expr).and_then(|params| params.first().copied());
            (first.and_then(param_annotation), first)
        }
        None => (None, None),
    };

    let props = explicit.or(inner_props);
    if props.is_none() && first_param.is_none() {
        return None;
    }
    Some((props, first_param))
}

/// Props type argument of `FC<P>`-like annotations.
fn function_component_type(ty: &TsType) -> Option<Option<&TsType>> {
    let TsType::TsTypeRef(type_ref) = ty else {
        return None;
    };
    let name = last_segment(&type_ref.type_name);
    let is_component_type = matches!(
        name,
        "FC" | "FunctionComponent" | "VFC" | "VoidFunctionComponent" | "ComponentType"
    );
    if !is_component_type {
        return None;
    }
    Some(
        type_ref
            .type_params
            .as_deref()
            .and_then(|args| args.params.first())
            .map(|ty| &**ty),
    )
}

fn is_element_type(ty: &TsType) -> bool {
    match ty {
        TsType::TsTypeRef(type_ref) => matches!(
            last_segment(&type_ref.type_name),
            "ReactElement" | "ReactNode" | "Element" | "ReactPortal"
        ),
        _ => false,
    }
}

fn last_segment(name: &TsEntityName) -> &str {
    match name {
        TsEntityName::Ident(ident) => &ident.sym,
        TsEntityName::TsQualifiedName(qualified) => &qualified.right.sym,
    }
}

fn is_pascal_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

pub(crate) fn unwrap_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_parens(&paren.expr),
        Expr::TsAs(as_expr) => unwrap_parens(&as_expr.expr),
        Expr::TsSatisfies(satisfies) => unwrap_parens(&satisfies.expr),
        _ => expr,
    }
}

fn function_params(expr: &Expr) -> Option<Vec<&Pat>> {
    match unwrap_parens(expr) {
        Expr::Arrow(arrow) => Some(arrow.params.iter().collect()),
        Expr::Fn(fn_expr) => Some(fn_expr.function.params.iter().map(|p| &p.pat).collect()),
        _ => None,
    }
}

fn param_annotation(pat: &Pat) -> Option<&TsType> {
    let ann = match pat {
        Pat::Ident(binding) => binding.type_ann.as_deref(),
        Pat::Object(object) => object.type_ann.as_deref(),
        Pat::Assign(assign) => return param_annotation(&assign.left),
        _ => None,
    }?;
    Some(&ann.type_ann)
}

/// Literal defaults of a destructured props parameter.
fn destructuring_defaults(pat: &Pat) -> IndexMap<String, Literal> {
    let mut defaults = IndexMap::new();
    let pat = match pat {
        Pat::Assign(assign) => &*assign.left,
        other => other,
    };
    let Pat::Object(object) = pat else {
        return defaults;
    };

    for prop in &object.props {
        match prop {
            ObjectPatProp::Assign(assign) => {
                if let Some(value) = assign.value.as_deref().and_then(literal_expr) {
                    defaults.insert(assign.key.id.sym.to_string(), value);
                }
            }
            ObjectPatProp::KeyValue(kv) => {
                let Pat::Assign(assign) = &*kv.value else {
                    continue;
                };
                if let (Some(key), Some(value)) = (prop_name(&kv.key), literal_expr(&assign.right))
                {
                    defaults.insert(key, value);
                }
            }
            ObjectPatProp::Rest(_) => {}
        }
    }
    defaults
}

/// `Component.defaultProps = { ... }`
fn default_props_assignment(expr: &Expr) -> Option<(String, IndexMap<String, Literal>)> {
    let Expr::Assign(assign) = expr else {
        return None;
    };
    let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left else {
        return None;
    };
    let Expr::Ident(component) = &*member.obj else {
        return None;
    };
    if &*member.prop.as_ident()?.sym != "defaultProps" {
        return None;
    }
    let Expr::Object(object) = unwrap_parens(&assign.right) else {
        return None;
    };
    Some((component.sym.to_string(), object_defaults(object)))
}

fn object_defaults(object: &ObjectLit) -> IndexMap<String, Literal> {
    object
        .props
        .iter()
        .filter_map(|prop| match prop {
            PropOrSpread::Prop(prop) => match &**prop {
                Prop::KeyValue(kv) => Some((prop_name(&kv.key)?, literal_expr(&kv.value)?)),
                _ => None,
            },
            PropOrSpread::Spread(_) => None,
        })
        .collect()
}

pub(crate) fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string_lossy().into_owned()),
        PropName::Num(n) => Some(crate::resolver::format_number(n.value)),
        _ => None,
    }
}

fn returns_jsx_arrow(arrow: &ArrowExpr) -> bool {
    match &*arrow.body {
        BlockStmtOrExpr::BlockStmt(block) => contains_jsx(block),
        BlockStmtOrExpr::Expr(expr) => contains_jsx(&**expr),
    }
}

fn contains_jsx<N: VisitWith<JsxFinder>>(node: &N) -> bool {
    let mut finder = JsxFinder::default();
    node.visit_with(&mut finder);
    finder.found
}

#[derive(Default)]
struct JsxFinder {
    found: bool,
}

impl Visit for JsxFinder {
    fn visit_jsx_element(&mut self, _: &swc_ecma_ast::JSXElement) {
        self.found = true;
    }

    fn visit_jsx_fragment(&mut self, _: &swc_ecma_ast::JSXFragment) {
        self.found = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeShape};
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use ts_program::CompilerOptions;

    fn extract_source(path: &str, source: &str) -> Vec<ComponentNode> {
        let program = Program::from_sources(
            [(Utf8PathBuf::from(path), source.to_string())],
            CompilerOptions::strict(),
        )
        .unwrap();
        extract(&program, Utf8Path::new(path)).unwrap()
    }

    fn summary(components: &[ComponentNode]) -> Vec<(&str, ComponentKind, Vec<&str>)> {
        components
            .iter()
            .map(|c| {
                (
                    c.name.as_str(),
                    c.kind,
                    c.props.iter().map(|p| p.name.as_str()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_function_components() {
        let components = extract_source(
            "/src/Button.tsx",
            r#"
interface Props { label: string; size?: number }
export function Button(props: Props) { return <button>{props.label}</button>; }
export const Arrow = ({ label }: Props) => <span>{label}</span>;
export default function Named(props: { title: string }) { return null; }
function helper(value: string) { return value.length; }
const lower = (props: Props) => null;
"#,
        );
        assert_eq!(
            summary(&components),
            vec![
                ("Button", ComponentKind::Function, vec!["label", "size"]),
                ("Arrow", ComponentKind::Function, vec!["label", "size"]),
                ("Named", ComponentKind::Function, vec!["title"]),
            ]
        );
        assert_eq!(
            components[0].origin_file_path,
            Utf8PathBuf::from("/src/Button.tsx")
        );
    }

    #[test]
    fn test_typed_and_wrapped_components() {
        let components = extract_source(
            "/src/widgets.tsx",
            r#"
import * as React from 'react';
import { forwardRef, memo, FC } from 'react';
type Props = { label: string };
export const Typed: FC<Props> = ({ label }) => <b>{label}</b>;
export const Qualified: React.FunctionComponent<{ id: number }> = () => null;
export const Ref = forwardRef<HTMLButtonElement, Props>((props, ref) => <button ref={ref} />);
export const Memo = React.memo((props: { count: number }) => <i>{props.count}</i>);
export const Both = memo(forwardRef((props: Props, ref) => null));
"#,
        );
        assert_eq!(
            summary(&components),
            vec![
                ("Typed", ComponentKind::Function, vec!["label"]),
                ("Qualified", ComponentKind::Function, vec!["id"]),
                ("Ref", ComponentKind::Wrapped, vec!["label"]),
                ("Memo", ComponentKind::Wrapped, vec!["count"]),
                ("Both", ComponentKind::Wrapped, vec!["label"]),
            ]
        );
    }

    #[test]
    fn test_class_components_and_defaults() {
        let components = extract_source(
            "/src/Panel.tsx",
            r#"
import React from 'react';
interface Props { title: string; open: boolean; level: number; tone: string }
export class Panel extends React.Component<Props> {
  static defaultProps = { open: false };
  render() { return <div />; }
}
Panel.defaultProps = { level: -1, tone: `calm` };
class NotAComponent extends Map<string, string> {}
"#,
        );
        assert_eq!(
            summary(&components),
            vec![(
                "Panel",
                ComponentKind::Class,
                vec!["title", "open", "level", "tone"]
            )]
        );
        let props = &components[0].props;
        assert!(props[0].required);
        assert_eq!(props[1].default_value, Some(Literal::Boolean(false)));
        assert!(!props[1].required);
        assert_eq!(props[2].default_value, Some(Literal::Number(-1.0)));
        assert_eq!(props[3].default_value, Some(Literal::String("calm".into())));
    }

    #[test]
    fn test_destructuring_defaults() {
        let components = extract_source(
            "/src/Badge.tsx",
            r#"
type Props = { color: 'red' | 'blue'; count: number; onClick?: () => void };
export function Badge({ color = 'red', count: total = 0, onClick }: Props) {
  return <span onClick={onClick}>{total}</span>;
}
"#,
        );
        let props = &components[0].props;
        assert_eq!(props[0].default_value, Some(Literal::String("red".into())));
        assert!(!props[0].required);
        assert_eq!(props[1].default_value, Some(Literal::Number(0.0)));
        assert_eq!(props[1].shape, TypeShape::Primitive(PrimitiveKind::Number));
        assert_eq!(props[2].default_value, None);
        assert!(!props[2].required);
    }

    #[test]
    fn test_declaration_files() {
        let components = extract_source(
            "/types/index.d.ts",
            r#"
import * as React from 'react';
export interface ButtonProps { label: string }
export declare const Button: React.FC<ButtonProps>;
export declare function Icon(props: { name: string }): JSX.Element;
export declare class Dialog extends React.PureComponent<{ open: boolean }> {}
"#,
        );
        assert_eq!(
            summary(&components),
            vec![
                ("Button", ComponentKind::Function, vec!["label"]),
                ("Icon", ComponentKind::Function, vec!["name"]),
                ("Dialog", ComponentKind::Class, vec!["open"]),
            ]
        );
    }

    #[test]
    fn test_file_not_in_program() {
        let program = Program::from_sources(
            [(Utf8PathBuf::from("/src/a.tsx"), String::new())],
            CompilerOptions::default(),
        )
        .unwrap();
        assert_eq!(
            extract(&program, Utf8Path::new("/src/b.tsx")),
            Err(ExtractError::FileNotInProgram(Utf8PathBuf::from(
                "/src/b.tsx"
            )))
        );
    }
}
