//! Splicing generated validators into transpiled JavaScript.
//!
//! The transpiled text is parsed once, scanned for top-level declarations,
//! and every change is recorded in a [`text_edit::EditSet`] that is applied
//! in a single pass at the end. The input is never modified; on error no
//! output is produced at all.

use crate::error::InjectError;
use crate::extractor::{prop_name, unwrap_parens};
use crate::generator::{self, GeneratorOptions};
use crate::types::{ComponentKind, ComponentNode, ProgramDocument};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    ArrowExpr, AssignOp, AssignTarget, BlockStmt, BlockStmtOrExpr, CallExpr, Callee, Class,
    ClassMember,
    Decl, DefaultDecl, Expr, Function, ImportSpecifier, Lit, MemberExpr, MemberProp, Module,
    ModuleDecl, ModuleItem, ObjectLit, ObjectPat, ObjectPatProp, Pat, Prop, PropName,
    PropOrSpread, SimpleAssignTarget, Stmt, VarDeclarator,
};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};
use text_edit::{EditSet, LineIndex, Span};
use tracing::debug;

/// What to do when a component already declares `propTypes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictPolicy {
    /// Refuse with [`InjectError::ExistingValidator`].
    #[default]
    Fail,
    /// Drop the existing declaration and emit the generated one.
    Replace,
    /// Keep hand-written entries for props that are not generated.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InjectOptions {
    /// Parse the input as TSX instead of JavaScript with JSX.
    pub typescript: bool,
    pub conflict: ConflictPolicy,
    /// Emit every prop, not only those a function component reads.
    pub include_unused_props: bool,
    /// Add the `prop-types` import when nothing binds the imported name.
    pub ensure_import: bool,
    #[serde(flatten)]
    pub generator: GeneratorOptions,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            typescript: false,
            conflict: ConflictPolicy::Fail,
            include_unused_props: true,
            ensure_import: true,
            generator: GeneratorOptions::default(),
        }
    }
}

/// Inserts a `propTypes` declaration for every component of `document` into
/// `source` and returns the new text.
pub fn inject(
    document: &ProgramDocument,
    source: &str,
    options: &InjectOptions,
) -> Result<String, InjectError> {
    if document.is_empty() {
        return Ok(source.to_string());
    }

    let parsed = parse(source, options.typescript)?;
    let mut scan = Scan::new(source, parsed.file_start);
    scan.module(&parsed.module);
    let index = LineIndex::new(source);

    let mut names: FxHashMap<&str, usize> = FxHashMap::default();
    for component in document {
        *names.entry(component.name.as_str()).or_default() += 1;
    }

    let mut edits = EditSet::new();
    for component in document {
        let count = names[component.name.as_str()];
        if count > 1 {
            return Err(InjectError::Ambiguous {
                component: component.name.clone(),
                count,
            });
        }

        let candidate = scan.find(&component.name, component.kind)?;
        let component = filter_unused(component, candidate, options);
        let existing: Vec<&ExistingValidator> = scan
            .validators
            .iter()
            .filter(|validator| validator.component == component.name)
            .collect();

        if existing.is_empty() {
            let block = generator::generate_component(&component, &options.generator);
            edits.insert(candidate.insert_at, format!("\n\n{}", block.trim_end()));
            continue;
        }

        let hand_written: Vec<&HandWritten> = match options.conflict {
            ConflictPolicy::Fail => {
                let (line, column) = index.one_based(existing[0].span.start);
                return Err(InjectError::ExistingValidator {
                    component: component.name.clone(),
                    line,
                    column,
                });
            }
            ConflictPolicy::Replace => Vec::new(),
            ConflictPolicy::Merge => existing.iter().copied().flat_map(|v| &v.entries).collect(),
        };
        debug!(
            component = %component.name,
            policy = ?options.conflict,
            existing = existing.len(),
            "rewriting existing propTypes"
        );

        let block = merged_block(&component, &hand_written, &options.generator);
        let mut placed = false;
        for validator in existing {
            match validator.location {
                Location::Statement if !placed => {
                    edits.replace(validator.span, block.trim_end());
                    placed = true;
                }
                _ => edits.delete(widen_to_line(source, validator.span)),
            }
        }
        if !placed {
            edits.insert(candidate.insert_at, format!("\n\n{}", block.trim_end()));
        }
    }

    let imported_name = options.generator.imported_name.as_str();
    if options.ensure_import && !scan.bindings.contains(imported_name) {
        let quoted = generator::quote_string("prop-types", options.generator.quote_style);
        let line = if scan.is_commonjs() {
            format!("const {imported_name} = require({quoted});")
        } else {
            format!("import {imported_name} from {quoted};")
        };
        match scan.last_import_end.or(scan.prologue_end) {
            Some(offset) => edits.insert(offset, format!("\n{line}")),
            None => edits.insert(0, format!("{line}\n")),
        }
    }

    edits.apply(source).map_err(|err| InjectError::Edit {
        component: document
            .iter()
            .map(|component| component.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        message: err.to_string(),
    })
}

struct Parsed {
    module: Module,
    file_start: BytePos,
}

fn parse(source: &str, typescript: bool) -> Result<Parsed, InjectError> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());
    let file_start = fm.start_pos;
    let syntax = if typescript {
        Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            ..Default::default()
        })
    };

    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    let parse_error = |err: swc_ecma_parser::error::Error| {
        let offset = err.span().lo.0.saturating_sub(file_start.0);
        let (line, column) = LineIndex::new(source).one_based(offset.into());
        InjectError::Parse {
            line,
            column,
            message: err.kind().msg().into_owned(),
        }
    };
    let module = parser.parse_module().map_err(parse_error)?;
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(parse_error(err));
    }
    Ok(Parsed { module, file_start })
}

/// How a top-level binding is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fingerprint {
    Function { params: usize },
    Class,
    /// A call such as `forwardRef(...)` or `memo(...)`.
    Call,
}

impl Fingerprint {
    /// Whether a binding of this shape can hold a component of `kind`.
    ///
    /// Calls stay acceptable for every kind: down-levelled classes compile to
    /// an IIFE, and `FC`-typed constants may hold any wrapper.
    fn accepts(self, kind: ComponentKind) -> bool {
        match (self, kind) {
            (Fingerprint::Function { params }, ComponentKind::Function) => params <= 2,
            (Fingerprint::Class, ComponentKind::Class) => true,
            (Fingerprint::Call, _) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Candidate {
    name: String,
    fingerprint: Fingerprint,
    /// End of the enclosing top-level statement.
    insert_at: usize,
    /// Props the function body reads; `None` when it may read any.
    used: Option<FxHashSet<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    /// `X.propTypes = ...;`
    Statement,
    /// `static propTypes = ...` in a class body.
    ClassMember,
}

/// A `key: value` entry of a hand-written validator object.
#[derive(Debug)]
struct HandWritten {
    /// `None` for spreads, which are always kept.
    key: Option<String>,
    text: String,
}

#[derive(Debug)]
struct ExistingValidator {
    component: String,
    span: Span,
    location: Location,
    entries: Vec<HandWritten>,
}

/// Top-level facts about the transpiled module.
struct Scan<'s> {
    source: &'s str,
    file_start: BytePos,
    candidates: Vec<Candidate>,
    validators: Vec<ExistingValidator>,
    /// Every top-level binding name.
    bindings: FxHashSet<String>,
    last_import_end: Option<usize>,
    prologue_end: Option<usize>,
    has_module_syntax: bool,
    has_commonjs_syntax: bool,
}

impl<'s> Scan<'s> {
    fn new(source: &'s str, file_start: BytePos) -> Self {
        Self {
            source,
            file_start,
            candidates: Vec::new(),
            validators: Vec::new(),
            bindings: FxHashSet::default(),
            last_import_end: None,
            prologue_end: None,
            has_module_syntax: false,
            has_commonjs_syntax: false,
        }
    }

    fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.file_start.0) as usize
    }

    fn range(&self, span: swc_common::Span) -> Span {
        Span::from_usize(self.offset(span.lo), self.offset(span.hi))
    }

    fn is_commonjs(&self) -> bool {
        !self.has_module_syntax && self.has_commonjs_syntax
    }

    fn module(&mut self, module: &Module) {
        let mut in_prologue = true;
        for item in &module.body {
            let end = self.offset(item.span().hi);
            if in_prologue {
                if is_directive(item) {
                    self.prologue_end = Some(end);
                    continue;
                }
                in_prologue = false;
            }

            match item {
                ModuleItem::ModuleDecl(decl) => {
                    self.has_module_syntax = true;
                    match decl {
                        ModuleDecl::Import(import) => {
                            self.last_import_end = Some(end);
                            for specifier in &import.specifiers {
                                let local = match specifier {
                                    ImportSpecifier::Named(named) => &named.local,
                                    ImportSpecifier::Default(default) => &default.local,
                                    ImportSpecifier::Namespace(namespace) => &namespace.local,
                                };
                                self.bindings.insert(local.sym.to_string());
                            }
                        }
                        ModuleDecl::ExportDecl(export) => {
                            self.decl(&export.decl, end);
                        }
                        ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                            DefaultDecl::Fn(function) => {
                                if let Some(ident) = &function.ident {
                                    self.function(&ident.sym, &function.function, end);
                                }
                            }
                            DefaultDecl::Class(class) => {
                                if let Some(ident) = &class.ident {
                                    self.class(&ident.sym, &class.class, end);
                                }
                            }
                            DefaultDecl::TsInterfaceDecl(_) => {}
                        },
                        _ => {}
                    }
                }
                ModuleItem::Stmt(Stmt::Decl(decl)) => {
                    if self.decl(decl, end) {
                        self.last_import_end = Some(end);
                    }
                }
                ModuleItem::Stmt(Stmt::Expr(stmt)) => {
                    if mentions_exports(&stmt.expr) {
                        self.has_commonjs_syntax = true;
                    }
                    if let Some(validator) = self.validator_statement(&stmt.expr, item.span()) {
                        self.validators.push(validator);
                    }
                }
                _ => {}
            }
        }
    }

    /// Records a declaration. Returns whether it is a `require` import.
    fn decl(&mut self, decl: &Decl, end: usize) -> bool {
        match decl {
            Decl::Fn(function) => {
                self.bindings.insert(function.ident.sym.to_string());
                if !function.declare {
                    self.function(&function.ident.sym, &function.function, end);
                }
                false
            }
            Decl::Class(class) => {
                self.bindings.insert(class.ident.sym.to_string());
                self.class(&class.ident.sym, &class.class, end);
                false
            }
            Decl::Var(var) => {
                let mut requires = false;
                for declarator in &var.decls {
                    requires |= self.declarator(declarator, end);
                }
                requires
            }
            _ => false,
        }
    }

    fn declarator(&mut self, declarator: &VarDeclarator, end: usize) -> bool {
        let Pat::Ident(binding) = &declarator.name else {
            if let Pat::Object(pattern) = &declarator.name {
                self.bindings.extend(pattern_bindings(pattern));
            }
            return declarator.init.as_deref().is_some_and(is_require);
        };
        let name = &*binding.id.sym;
        self.bindings.insert(name.to_string());

        let Some(init) = declarator.init.as_deref() else {
            return false;
        };
        if is_require(init) {
            self.has_commonjs_syntax = true;
            return true;
        }
        match unwrap_parens(init) {
            Expr::Arrow(arrow) => self.candidates.push(Candidate {
                name: name.to_string(),
                fingerprint: Fingerprint::Function {
                    params: arrow.params.len(),
                },
                insert_at: end,
                used: arrow_used_props(arrow),
            }),
            Expr::Fn(function) => self.function(name, &function.function, end),
            Expr::Class(class) => self.class(name, &class.class, end),
            Expr::Call(call) => self.candidates.push(Candidate {
                name: name.to_string(),
                fingerprint: Fingerprint::Call,
                insert_at: end,
                used: wrapped_used_props(call),
            }),
            _ => {}
        }
        false
    }

    /// Overload signatures and other bodyless functions are not candidates.
    fn function(&mut self, name: &str, function: &Function, end: usize) {
        if function.body.is_none() {
            return;
        }
        self.candidates.push(Candidate {
            name: name.to_string(),
            fingerprint: Fingerprint::Function {
                params: function.params.len(),
            },
            insert_at: end,
            used: function_used_props(function),
        });
    }

    fn class(&mut self, name: &str, class: &Class, end: usize) {
        self.candidates.push(Candidate {
            name: name.to_string(),
            fingerprint: Fingerprint::Class,
            insert_at: end,
            used: None,
        });

        for member in &class.body {
            let ClassMember::ClassProp(prop) = member else {
                continue;
            };
            if !prop.is_static || !is_prop_types_key(&prop.key) {
                continue;
            }
            let entries = match prop.value.as_deref().map(unwrap_parens) {
                Some(Expr::Object(object)) => self.entries(object),
                _ => Vec::new(),
            };
            self.validators.push(ExistingValidator {
                component: name.to_string(),
                span: self.range(prop.span),
                location: Location::ClassMember,
                entries,
            });
        }
    }

    fn validator_statement(
        &self,
        expr: &Expr,
        span: swc_common::Span,
    ) -> Option<ExistingValidator> {
        let Expr::Assign(assign) = expr else {
            return None;
        };
        if assign.op != AssignOp::Assign {
            return None;
        }
        let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left else {
            return None;
        };
        let Expr::Ident(object) = &*member.obj else {
            return None;
        };
        if member.prop.as_ident().map(|prop| &*prop.sym) != Some("propTypes") {
            return None;
        }
        let entries = match unwrap_parens(&assign.right) {
            Expr::Object(object) => self.entries(object),
            _ => Vec::new(),
        };
        Some(ExistingValidator {
            component: object.sym.to_string(),
            span: self.range(span),
            location: Location::Statement,
            entries,
        })
    }

    /// Hand-written entries, with the source text of each property.
    fn entries(&self, object: &ObjectLit) -> Vec<HandWritten> {
        object
            .props
            .iter()
            .map(|prop| {
                let key = match prop {
                    PropOrSpread::Spread(_) => None,
                    PropOrSpread::Prop(prop) => match &**prop {
                        Prop::Shorthand(ident) => Some(ident.sym.to_string()),
                        Prop::KeyValue(kv) => prop_name(&kv.key),
                        Prop::Method(method) => prop_name(&method.key),
                        Prop::Getter(getter) => prop_name(&getter.key),
                        Prop::Setter(setter) => prop_name(&setter.key),
                        Prop::Assign(assign) => Some(assign.key.sym.to_string()),
                    },
                };
                let text = self
                    .range(prop.span())
                    .slice(self.source)
                    .unwrap_or_default()
                    .to_string();
                HandWritten { key, text }
            })
            .collect()
    }

    /// The single candidate named `name` shaped like a `kind` component.
    fn find(&self, name: &str, kind: ComponentKind) -> Result<&Candidate, InjectError> {
        let matches: Vec<&Candidate> = self
            .candidates
            .iter()
            .filter(|candidate| candidate.name == name && candidate.fingerprint.accepts(kind))
            .collect();
        match matches.as_slice() {
            [] => Err(InjectError::ComponentNotFound {
                component: name.to_string(),
            }),
            [candidate] => Ok(*candidate),
            _ => Err(InjectError::Ambiguous {
                component: name.to_string(),
                count: matches.len(),
            }),
        }
    }
}

fn is_directive(item: &ModuleItem) -> bool {
    matches!(item, ModuleItem::Stmt(Stmt::Expr(stmt)) if matches!(&*stmt.expr, Expr::Lit(Lit::Str(_))))
}

/// `require(...)`, possibly wrapped in an interop helper call.
fn is_require(expr: &Expr) -> bool {
    let Expr::Call(call) = unwrap_parens(expr) else {
        return false;
    };
    let direct = matches!(
        &call.callee,
        Callee::Expr(callee) if matches!(&**callee, Expr::Ident(ident) if &*ident.sym == "require")
    );
    direct
        || call
            .args
            .iter()
            .any(|arg| arg.spread.is_none() && is_require(&arg.expr))
}

/// Assignments to `exports.x`/`module.exports` and `Object.defineProperty(exports, ...)`.
fn mentions_exports(expr: &Expr) -> bool {
    match expr {
        Expr::Assign(assign) => {
            let target = match &assign.left {
                AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
                    is_exports_object(&member.obj) || is_exports_object_member(member)
                }
                _ => false,
            };
            target || mentions_exports(&assign.right)
        }
        Expr::Call(call) => call
            .args
            .first()
            .is_some_and(|arg| is_exports_object(&arg.expr)),
        Expr::Seq(seq) => seq.exprs.iter().any(|expr| mentions_exports(expr)),
        _ => false,
    }
}

fn is_exports_object(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(ident) => &*ident.sym == "exports",
        Expr::Member(member) => is_exports_object_member(member),
        _ => false,
    }
}

fn is_exports_object_member(member: &MemberExpr) -> bool {
    matches!(&*member.obj, Expr::Ident(object) if &*object.sym == "module")
        && member.prop.as_ident().is_some_and(|prop| &*prop.sym == "exports")
}

fn pattern_bindings(pattern: &ObjectPat) -> Vec<String> {
    pattern
        .props
        .iter()
        .filter_map(|prop| match prop {
            ObjectPatProp::KeyValue(kv) => kv.value.as_ident().map(|b| b.id.sym.to_string()),
            ObjectPatProp::Assign(assign) => Some(assign.key.id.sym.to_string()),
            ObjectPatProp::Rest(rest) => rest.arg.as_ident().map(|b| b.id.sym.to_string()),
        })
        .collect()
}

fn is_prop_types_key(key: &PropName) -> bool {
    prop_name(key).as_deref() == Some("propTypes")
}

enum Body<'a> {
    Block(&'a BlockStmt),
    Expr(&'a Expr),
    Empty,
}

fn function_used_props(function: &Function) -> Option<FxHashSet<String>> {
    let body = function.body.as_ref().map_or(Body::Empty, Body::Block);
    used_props(function.params.first().map(|param| &param.pat), body)
}

fn arrow_used_props(arrow: &ArrowExpr) -> Option<FxHashSet<String>> {
    let body = match &*arrow.body {
        BlockStmtOrExpr::BlockStmt(block) => Body::Block(block),
        BlockStmtOrExpr::Expr(expr) => Body::Expr(expr),
    };
    used_props(arrow.params.first(), body)
}

/// Props read by the function wrapped in `forwardRef(...)`/`memo(...)`.
fn wrapped_used_props(call: &CallExpr) -> Option<FxHashSet<String>> {
    for arg in &call.args {
        match unwrap_parens(&arg.expr) {
            Expr::Arrow(arrow) => return arrow_used_props(arrow),
            Expr::Fn(function) => return function_used_props(&function.function),
            Expr::Call(inner) => return wrapped_used_props(inner),
            _ => {}
        }
    }
    None
}

/// Names read from the props parameter, or `None` when it escapes.
fn used_props(first: Option<&Pat>, body: Body<'_>) -> Option<FxHashSet<String>> {
    let Some(pattern) = first else {
        return Some(FxHashSet::default());
    };
    match pattern {
        Pat::Object(object) => destructured_keys(object),
        Pat::Assign(assign) => used_props(Some(&*assign.left), body),
        Pat::Ident(binding) => {
            let mut reads = PropReads {
                name: &*binding.id.sym,
                keys: FxHashSet::default(),
                escaped: false,
            };
            match body {
                Body::Block(block) => block.visit_with(&mut reads),
                Body::Expr(expr) => expr.visit_with(&mut reads),
                Body::Empty => {}
            }
            (!reads.escaped).then_some(reads.keys)
        }
        _ => None,
    }
}

fn destructured_keys(pattern: &ObjectPat) -> Option<FxHashSet<String>> {
    let mut keys = FxHashSet::default();
    for prop in &pattern.props {
        match prop {
            ObjectPatProp::KeyValue(kv) => {
                keys.insert(prop_name(&kv.key)?);
            }
            ObjectPatProp::Assign(assign) => {
                keys.insert(assign.key.id.sym.to_string());
            }
            ObjectPatProp::Rest(_) => return None,
        }
    }
    Some(keys)
}

/// Collects `props.x` reads of one binding and notices any other use of it.
struct PropReads<'a> {
    name: &'a str,
    keys: FxHashSet<String>,
    escaped: bool,
}

impl PropReads<'_> {
    fn is_props(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Ident(ident) if &*ident.sym == self.name)
    }
}

impl Visit for PropReads<'_> {
    fn visit_member_expr(&mut self, member: &MemberExpr) {
        if !self.is_props(&member.obj) {
            member.visit_children_with(self);
            return;
        }
        match &member.prop {
            MemberProp::Ident(prop) => {
                self.keys.insert(prop.sym.to_string());
            }
            MemberProp::Computed(computed) => match &*computed.expr {
                Expr::Lit(Lit::Str(key)) => {
                    self.keys.insert(key.value.to_string_lossy().into_owned());
                }
                _ => {
                    self.escaped = true;
                    computed.visit_with(self);
                }
            },
            MemberProp::PrivateName(_) => {}
        }
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        if let (Pat::Object(pattern), Some(init)) = (&declarator.name, &declarator.init) {
            if self.is_props(init) {
                match destructured_keys(pattern) {
                    Some(keys) => self.keys.extend(keys),
                    None => self.escaped = true,
                }
                return;
            }
        }
        declarator.visit_children_with(self);
    }

    fn visit_ident(&mut self, ident: &swc_ecma_ast::Ident) {
        if &*ident.sym == self.name {
            self.escaped = true;
        }
    }
}

fn filter_unused<'c>(
    component: &'c ComponentNode,
    candidate: &Candidate,
    options: &InjectOptions,
) -> Cow<'c, ComponentNode> {
    match &candidate.used {
        Some(used) if !options.include_unused_props => {
            let mut filtered = component.clone();
            filtered.props.retain(|prop| used.contains(&prop.name));
            debug!(
                component = %component.name,
                kept = filtered.props.len(),
                dropped = component.props.len() - filtered.props.len(),
                "filtered unused props"
            );
            Cow::Owned(filtered)
        }
        _ => Cow::Borrowed(component),
    }
}

/// Generated entries first, then hand-written ones for keys not generated.
fn merged_block(
    component: &ComponentNode,
    hand_written: &[&HandWritten],
    options: &GeneratorOptions,
) -> String {
    let generated = generator::prop_entries(component, options);
    let mut seen: FxHashSet<&str> = generated.iter().map(|(name, _)| name.as_str()).collect();
    let mut entries: Vec<String> = generated.iter().map(|(_, entry)| entry.clone()).collect();
    for entry in hand_written {
        let keep = match &entry.key {
            Some(key) => seen.insert(key.as_str()),
            None => true,
        };
        if keep {
            entries.push(format!("  {},\n", entry.text));
        }
    }
    generator::render_block(&component.name, entries, options)
}

/// Extends a removed span over its indentation, a trailing `;` and the line
/// break, when it sits on lines of its own.
fn widen_to_line(source: &str, span: Span) -> Span {
    let bytes = source.as_bytes();
    let mut start = span.start_usize();
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] != b'\n' {
        return span;
    }

    let mut end = span.end_usize();
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t' | b';') {
        end += 1;
    }
    if bytes[end..].starts_with(b"\r\n") {
        end += 2;
    } else if bytes[end..].starts_with(b"\n") {
        end += 1;
    } else if end < bytes.len() {
        return span;
    }
    Span::from_usize(start, end)
}
