//! Type resolution: from a props type to a flat list of [`PropDescriptor`]s.
//!
//! The resolver walks the type graph of the program lazily. Types are carried
//! around as [`Ty`] values (an AST node plus the generic bindings in effect)
//! and only turned into [`TypeShape`]s once a prop's shape is needed.
//!
//! Named types that are reached again while still being expanded become
//! [`TypeShape::Reference`]; their expansion is recorded in the definitions
//! table returned by [`Resolver::take_definitions`].

use crate::error::ResolveError;
use crate::types::{Literal, PrimitiveKind, PropDescriptor, TypeShape};
use crate::well_known;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use std::rc::Rc;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    Expr, Lit, TruePlusMinus, TsEntityName, TsEnumDecl, TsEnumMemberId, TsKeywordTypeKind,
    TsLit, TsMappedType, TsType, TsTypeElement, TsTypeLit, TsTypeOperatorOp, TsTypeParamDecl,
    TsTypeRef, TsUnionOrIntersectionType, UnaryOp,
};
use ts_program::{DeclRef, Declaration, FileId, Program, Resolution};

/// Names the props type of a component.
#[derive(Debug, Clone)]
pub enum PropsSymbol<'a> {
    /// A bound type declaration.
    Declaration(DeclRef),
    /// A type name as seen from the top level of `file`.
    Named { file: FileId, name: SmolStr },
    /// A type annotation written in `file`, e.g. an inline object literal type.
    Inline { file: FileId, ty: &'a TsType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Nesting depth beyond which object types degrade to `object`.
    pub max_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self { max_depth: 6 }
    }
}

/// Resolves the props named by `symbol` with default options.
pub fn resolve<'p>(
    program: &'p Program,
    symbol: &PropsSymbol<'p>,
) -> Result<Vec<PropDescriptor>, ResolveError> {
    resolve_with(program, symbol, &ResolverOptions::default())
}

/// Resolves the props named by `symbol`.
pub fn resolve_with<'p>(
    program: &'p Program,
    symbol: &PropsSymbol<'p>,
    options: &ResolverOptions,
) -> Result<Vec<PropDescriptor>, ResolveError> {
    Resolver::new(program, *options).resolve_props(symbol)
}

/// Generic parameter bindings in effect for a type node.
#[derive(Clone)]
struct Scope<'p> {
    file: FileId,
    params: Rc<FxHashMap<SmolStr, Ty<'p>>>,
}

impl<'p> Scope<'p> {
    fn root(file: FileId) -> Self {
        Self {
            file,
            params: Rc::default(),
        }
    }

    fn with(&self, name: SmolStr, ty: Ty<'p>) -> Self {
        let mut params = (*self.params).clone();
        params.insert(name, ty);
        Self {
            file: self.file,
            params: Rc::new(params),
        }
    }
}

/// An unevaluated type.
#[derive(Clone)]
enum Ty<'p> {
    Ast { ty: &'p TsType, scope: Scope<'p> },
    StrLit(SmolStr),
    Func,
    Any,
    Union(Vec<Ty<'p>>),
}

impl<'p> Ty<'p> {
    fn ast(ty: &'p TsType, scope: &Scope<'p>) -> Self {
        Ty::Ast {
            ty,
            scope: scope.clone(),
        }
    }
}

/// An object member before its type is evaluated.
#[derive(Clone)]
struct Member<'p> {
    name: String,
    optional: bool,
    ty: Ty<'p>,
    doc: Option<String>,
    type_text: Option<String>,
}

/// A member collected from several union branches.
struct MergedMember<'a> {
    member: Member<'a>,
    seen: usize,
    all_required: bool,
    tys: Vec<Ty<'a>>,
    texts: Vec<String>,
}

/// What a (possibly qualified) type name refers to.
enum Named<'p> {
    Param(Ty<'p>),
    Decl(DeclRef),
    EnumMember { decl: DeclRef, member: String },
    External { module: SmolStr, name: String },
    Unknown(String),
}

const MAX_RECURSION: usize = 96;

/// Stateful resolver for one component: collects the definitions table.
pub struct Resolver<'p> {
    program: &'p Program,
    options: ResolverOptions,
    strict_null_checks: bool,
    /// Named types currently being expanded, innermost last.
    expanding: Vec<DeclRef>,
    referenced: FxHashSet<DeclRef>,
    /// Name used in [`TypeShape::Reference`] for each referenced declaration.
    reference_names: FxHashMap<DeclRef, String>,
    definitions: IndexMap<String, TypeShape>,
    recursion: usize,
}

impl<'p> Resolver<'p> {
    pub fn new(program: &'p Program, options: ResolverOptions) -> Self {
        Self {
            program,
            options,
            strict_null_checks: program.options().strict_null_checks(),
            expanding: Vec::new(),
            referenced: FxHashSet::default(),
            reference_names: FxHashMap::default(),
            definitions: IndexMap::new(),
            recursion: 0,
        }
    }

    /// Expansions of every named type that was cut into a [`TypeShape::Reference`].
    pub fn take_definitions(&mut self) -> IndexMap<String, TypeShape> {
        std::mem::take(&mut self.definitions)
    }

    pub fn resolve_props(
        &mut self,
        symbol: &PropsSymbol<'p>,
    ) -> Result<Vec<PropDescriptor>, ResolveError> {
        match symbol {
            PropsSymbol::Declaration(decl) => self.root_declaration(decl),
            PropsSymbol::Named { file, name } => match self.program.resolve_name(*file, name) {
                Some(Resolution::Local(decl)) => self.root_declaration(&decl),
                Some(Resolution::External { module, name }) => {
                    tracing::debug!("props type `{name}` comes from `{module}`; no props resolved");
                    Ok(Vec::new())
                }
                Some(Resolution::Namespace(_)) | Some(Resolution::ExternalNamespace(_)) => {
                    Err(ResolveError::NotAType {
                        name: name.to_string(),
                        file: self.program.source(*file).path().to_path_buf(),
                    })
                }
                None => Err(ResolveError::UnknownSymbol {
                    name: name.to_string(),
                    file: self.program.source(*file).path().to_path_buf(),
                }),
            },
            PropsSymbol::Inline { file, ty } => {
                if let Some(name) = plain_ref_name(ty) {
                    if let Some(Resolution::Local(decl)) = self.program.resolve_name(*file, name) {
                        if self.program.declarations(&decl).iter().any(Declaration::is_type) {
                            return self.root_declaration(&decl);
                        }
                    }
                }
                let ty = Ty::ast(*ty, &Scope::root(*file));
                match self.members(&ty) {
                    Some(members) => Ok(self.to_props(members, 1)),
                    None => {
                        tracing::debug!("props annotation is not an object type; no props resolved");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    fn root_declaration(&mut self, decl: &DeclRef) -> Result<Vec<PropDescriptor>, ResolveError> {
        let decls = self.program.declarations(decl);
        if decls.is_empty() {
            return Err(ResolveError::UnknownSymbol {
                name: decl.name.to_string(),
                file: self.program.source(decl.file).path().to_path_buf(),
            });
        }
        if !decls.iter().any(Declaration::is_type) {
            return Err(ResolveError::NotAType {
                name: decl.name.to_string(),
                file: self.program.source(decl.file).path().to_path_buf(),
            });
        }

        self.expanding.push(decl.clone());
        let props = match self.decl_members(decl, &[]) {
            Some(members) => self.to_props(members, 1),
            None => {
                tracing::debug!("`{}` is not an object type; no props resolved", decl.name);
                Vec::new()
            }
        };
        self.expanding.pop();

        if self.referenced.contains(decl) {
            let name = self.reference_name(decl);
            self.definitions
                .entry(name)
                .or_insert_with(|| TypeShape::ObjectOf(props.clone()));
        }
        Ok(props)
    }

    /// The declaration's own name, suffixed when a same-named type from
    /// another file already took it.
    fn reference_name(&mut self, decl: &DeclRef) -> String {
        if let Some(name) = self.reference_names.get(decl) {
            return name.clone();
        }
        let taken = |name: &str| self.reference_names.values().any(|used| used == name);
        let mut name = decl.name.to_string();
        let mut suffix = 2;
        while taken(&name) {
            name = format!("{}#{suffix}", decl.name);
            suffix += 1;
        }
        self.reference_names.insert(decl.clone(), name.clone());
        name
    }

    fn to_props(&mut self, members: Vec<Member<'p>>, depth: usize) -> Vec<PropDescriptor> {
        members
            .into_iter()
            .map(|member| {
                let nullable = self.strict_null_checks && self.admits_nullish(&member.ty);
                let shape = self.shape(&member.ty, depth);
                PropDescriptor {
                    name: member.name,
                    required: !member.optional && !nullable,
                    shape,
                    default_value: None,
                    doc: member.doc,
                    type_text: member.type_text,
                }
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    /// Members of an object-like type, or `None` when the type is not one.
    fn members(&mut self, ty: &Ty<'p>) -> Option<Vec<Member<'p>>> {
        if self.recursion >= MAX_RECURSION {
            return None;
        }
        self.recursion += 1;
        let members = self.members_inner(ty);
        self.recursion -= 1;
        members
    }

    fn members_inner(&mut self, ty: &Ty<'p>) -> Option<Vec<Member<'p>>> {
        let (ty, scope) = match ty {
            Ty::Ast { ty, scope } => (*ty, scope),
            Ty::Union(tys) => return self.union_members(tys),
            Ty::StrLit(_) | Ty::Func | Ty::Any => return None,
        };

        match ty {
            TsType::TsTypeLit(lit) => Some(self.literal_members(lit, scope)),
            TsType::TsParenthesizedType(paren) => self.members(&Ty::ast(&paren.type_ann, scope)),
            TsType::TsTypeOperator(op) if op.op == TsTypeOperatorOp::ReadOnly => {
                self.members(&Ty::ast(&op.type_ann, scope))
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => {
                let mut merged = IndexMap::new();
                let mut any_object = false;
                for part in &intersection.types {
                    if let Some(members) = self.members(&Ty::ast(part, scope)) {
                        any_object = true;
                        merge_members(&mut merged, members);
                    }
                }
                any_object.then(|| merged.into_values().collect())
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let tys: Vec<Ty<'p>> = union.types.iter().map(|t| Ty::ast(t, scope)).collect();
                self.union_members(&tys)
            }
            TsType::TsTypeRef(type_ref) => self.ref_members(type_ref, scope),
            TsType::TsMappedType(mapped) => self.mapped_members(mapped, scope),
            TsType::TsIndexedAccessType(access) => {
                let target = self.indexed_access(
                    &Ty::ast(&access.obj_type, scope),
                    &Ty::ast(&access.index_type, scope),
                )?;
                self.members(&target)
            }
            _ => None,
        }
    }

    fn literal_members(&mut self, lit: &'p TsTypeLit, scope: &Scope<'p>) -> Vec<Member<'p>> {
        let mut merged = IndexMap::new();
        for element in &lit.members {
            if let Some(member) = self.member(element, scope) {
                merged.insert(member.name.clone(), member);
            }
        }
        merged.into_values().collect()
    }

    fn member(&self, element: &'p TsTypeElement, scope: &Scope<'p>) -> Option<Member<'p>> {
        match element {
            TsTypeElement::TsPropertySignature(prop) => {
                let name = property_key(&prop.key, prop.computed)?;
                let ann = prop.type_ann.as_deref();
                Some(Member {
                    name,
                    optional: prop.optional,
                    ty: ann.map_or(Ty::Any, |ann| Ty::ast(&ann.type_ann, scope)),
                    doc: self.doc(scope.file, prop.span),
                    type_text: ann.map(|ann| self.text(scope.file, ann.type_ann.span())),
                })
            }
            TsTypeElement::TsMethodSignature(method) => {
                let name = property_key(&method.key, method.computed)?;
                let signature = self.text(scope.file, method.span);
                let type_text = signature
                    .get(self.text(scope.file, method.key.span()).len()..)
                    .map(|rest| rest.trim_start_matches('?').trim_end_matches([';', ',']))
                    .map(|rest| rest.trim().to_string());
                Some(Member {
                    name,
                    optional: method.optional,
                    ty: Ty::Func,
                    doc: self.doc(scope.file, method.span),
                    type_text,
                })
            }
            TsTypeElement::TsGetterSignature(getter) => {
                let name = property_key(&getter.key, getter.computed)?;
                let ann = getter.type_ann.as_deref();
                Some(Member {
                    name,
                    optional: false,
                    ty: ann.map_or(Ty::Any, |ann| Ty::ast(&ann.type_ann, scope)),
                    doc: self.doc(scope.file, getter.span),
                    type_text: ann.map(|ann| self.text(scope.file, ann.type_ann.span())),
                })
            }
            _ => None,
        }
    }

    /// Members of a union of object types: every name, required only if required everywhere.
    fn union_members(&mut self, tys: &[Ty<'p>]) -> Option<Vec<Member<'p>>> {
        let mut flat = Vec::new();
        for ty in tys {
            self.flatten_union(ty, &mut flat, &mut FxHashSet::default());
        }

        let mut branches = Vec::new();
        for ty in flat.iter().filter(|ty| !is_nullish(ty)) {
            branches.push(self.members(ty)?);
        }
        match branches.len() {
            0 => return None,
            1 => return branches.pop(),
            _ => {}
        }

        let total = branches.len();
        let mut merged: IndexMap<String, MergedMember<'p>> = IndexMap::new();
        for branch in branches {
            for member in branch {
                let entry = merged
                    .entry(member.name.clone())
                    .or_insert_with(|| MergedMember {
                        member: member.clone(),
                        seen: 0,
                        all_required: true,
                        tys: Vec::new(),
                        texts: Vec::new(),
                    });
                entry.seen += 1;
                entry.all_required &= !member.optional;
                entry.tys.push(member.ty);
                if let Some(text) = member.type_text {
                    if !entry.texts.contains(&text) {
                        entry.texts.push(text);
                    }
                }
                if entry.member.doc.is_none() {
                    entry.member.doc = member.doc;
                }
            }
        }

        Some(
            merged
                .into_values()
                .map(|mut merged| {
                    merged.member.optional = !(merged.seen == total && merged.all_required);
                    merged.member.ty = if merged.tys.len() == 1 {
                        merged.tys.remove(0)
                    } else {
                        Ty::Union(merged.tys)
                    };
                    merged.member.type_text =
                        (!merged.texts.is_empty()).then(|| merged.texts.join(" | "));
                    merged.member
                })
                .collect(),
        )
    }

    fn ref_members(&mut self, type_ref: &'p TsTypeRef, scope: &Scope<'p>) -> Option<Vec<Member<'p>>> {
        let path = entity_path(&type_ref.type_name);
        let args = type_args(type_ref, scope);
        self.path_members(scope, &path, &args)
    }

    fn path_members(
        &mut self,
        scope: &Scope<'p>,
        path: &[&str],
        args: &[Ty<'p>],
    ) -> Option<Vec<Member<'p>>> {
        match self.lookup(scope, path) {
            Named::Param(ty) => self.members(&ty),
            Named::Decl(decl) => {
                if self.expanding.contains(&decl) {
                    return None;
                }
                self.expanding.push(decl.clone());
                let members = self.decl_members(&decl, args);
                self.expanding.pop();
                members
            }
            Named::Unknown(name) if path.len() == 1 => self.utility_members(&name, args),
            Named::External { module, name } => {
                tracing::debug!("cannot expand members of `{name}` from `{module}`");
                None
            }
            Named::Unknown(_) | Named::EnumMember { .. } => None,
        }
    }

    /// Members of a named declaration: merged interfaces with their bases, or a type alias.
    fn decl_members(&mut self, decl: &DeclRef, args: &[Ty<'p>]) -> Option<Vec<Member<'p>>> {
        let decls = self.program.declarations(decl);

        let interfaces: Vec<_> = decls
            .iter()
            .filter_map(|d| match d {
                Declaration::Interface(interface) => Some(interface),
                _ => None,
            })
            .collect();

        if !interfaces.is_empty() {
            let mut merged = IndexMap::new();
            for interface in interfaces {
                let scope = self.bind_params(decl.file, interface.type_params.as_deref(), args);
                for base in &interface.extends {
                    let Some(path) = expr_path(&base.expr) else {
                        continue;
                    };
                    let base_args: Vec<Ty<'p>> = base
                        .type_args
                        .as_deref()
                        .map(|args| args.params.iter().map(|t| Ty::ast(t, &scope)).collect())
                        .unwrap_or_default();
                    match self.path_members(&scope, &path, &base_args) {
                        Some(members) => merge_members(&mut merged, members),
                        None => tracing::debug!(
                            "cannot expand base `{}` of `{}`",
                            path.join("."),
                            decl.name
                        ),
                    }
                }
                for element in &interface.body.body {
                    if let Some(member) = self.member(element, &scope) {
                        merged.insert(member.name.clone(), member);
                    }
                }
            }
            return Some(merged.into_values().collect());
        }

        decls.iter().find_map(|d| match d {
            Declaration::TypeAlias(alias) => Some(alias),
            _ => None,
        })
        .and_then(|alias| {
            let scope = self.bind_params(decl.file, alias.type_params.as_deref(), args);
            self.members(&Ty::ast(&alias.type_ann, &scope))
        })
    }

    /// `Partial`, `Pick`, `Record` and friends when the program does not declare them.
    fn utility_members(&mut self, name: &str, args: &[Ty<'p>]) -> Option<Vec<Member<'p>>> {
        let first = args.first()?;
        match name {
            "Partial" | "Required" | "Readonly" | "NonNullable" => {
                let mut members = self.members(first)?;
                for member in &mut members {
                    match name {
                        "Partial" => member.optional = true,
                        "Required" => member.optional = false,
                        _ => {}
                    }
                }
                Some(members)
            }
            "Pick" | "Omit" => {
                let keys = self.literal_keys(args.get(1)?)?;
                let members = self.members(first)?;
                let keep = name == "Pick";
                Some(
                    members
                        .into_iter()
                        .filter(|member| keys.contains(&member.name) == keep)
                        .collect(),
                )
            }
            "Record" => {
                let keys = self.literal_keys(first)?;
                let value = args.get(1).cloned().unwrap_or(Ty::Any);
                Some(
                    keys.into_iter()
                        .map(|key| Member {
                            name: key,
                            optional: false,
                            ty: value.clone(),
                            doc: None,
                            type_text: None,
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }

    fn mapped_members(
        &mut self,
        mapped: &'p TsMappedType,
        scope: &Scope<'p>,
    ) -> Option<Vec<Member<'p>>> {
        if mapped.name_type.is_some() {
            return None;
        }
        let constraint = mapped.type_param.constraint.as_deref()?;

        let (keys, source) = match constraint {
            TsType::TsTypeOperator(op) if op.op == TsTypeOperatorOp::KeyOf => {
                let source = self.members(&Ty::ast(&op.type_ann, scope))?;
                let keys = source.iter().map(|m| m.name.clone()).collect();
                (keys, source)
            }
            _ => (self.literal_keys(&Ty::ast(constraint, scope))?, Vec::new()),
        };

        let param = SmolStr::new(&*mapped.type_param.name.sym);
        Some(
            keys.into_iter()
                .map(|key| {
                    let original = source.iter().find(|m| m.name == key);
                    let inner = scope.with(param.clone(), Ty::StrLit(SmolStr::new(&key)));
                    let optional = match mapped.optional {
                        Some(TruePlusMinus::True) | Some(TruePlusMinus::Plus) => true,
                        Some(TruePlusMinus::Minus) => false,
                        None => original.is_some_and(|m| m.optional),
                    };
                    Member {
                        optional,
                        ty: mapped
                            .type_ann
                            .as_deref()
                            .map_or(Ty::Any, |ty| Ty::ast(ty, &inner)),
                        doc: original.and_then(|m| m.doc.clone()),
                        type_text: original.and_then(|m| m.type_text.clone()),
                        name: key,
                    }
                })
                .collect(),
        )
    }

    /// String keys of a literal key type (`'a' | 'b'`, `keyof T`); `None` if open-ended.
    fn literal_keys(&mut self, ty: &Ty<'p>) -> Option<Vec<String>> {
        let mut flat = Vec::new();
        self.flatten_union(ty, &mut flat, &mut FxHashSet::default());

        let mut keys = Vec::new();
        for ty in flat {
            match &ty {
                Ty::StrLit(key) => keys.push(key.to_string()),
                Ty::Ast { ty: node, scope } => match *node {
                    TsType::TsLitType(lit) => match &lit.lit {
                        TsLit::Str(s) => keys.push(s.value.to_string_lossy().into_owned()),
                        TsLit::Number(n) => keys.push(format_number(n.value)),
                        _ => return None,
                    },
                    TsType::TsTypeOperator(op) if op.op == TsTypeOperatorOp::KeyOf => {
                        let members = self.members(&Ty::ast(&op.type_ann, scope))?;
                        keys.extend(members.into_iter().map(|m| m.name));
                    }
                    TsType::TsTypeRef(type_ref) => {
                        let path = entity_path(&type_ref.type_name);
                        let Named::Decl(decl) = self.lookup(scope, &path) else {
                            return None;
                        };
                        if let Some(values) = self.enum_values(&decl) {
                            for (_, value) in values {
                                match value {
                                    Literal::String(s) => keys.push(s),
                                    Literal::Number(n) => keys.push(format_number(n)),
                                    _ => return None,
                                }
                            }
                            continue;
                        }
                        let alias = self.program.declarations(&decl).iter().find_map(|d| match d {
                            Declaration::TypeAlias(alias) => Some(alias),
                            _ => None,
                        })?;
                        let args = type_args(type_ref, scope);
                        let scope = self.bind_params(decl.file, alias.type_params.as_deref(), &args);
                        keys.extend(self.literal_keys(&Ty::ast(&alias.type_ann, &scope))?);
                    }
                    _ => return None,
                },
                _ => return None,
            }
        }
        let mut unique = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Some(unique)
    }

    /// `T[K]`: the member type(s) selected by a literal key type.
    fn indexed_access(&mut self, object: &Ty<'p>, index: &Ty<'p>) -> Option<Ty<'p>> {
        if let Ty::Ast { ty, .. } = index {
            if let TsType::TsKeywordType(keyword) = ty {
                if keyword.kind == TsKeywordTypeKind::TsNumberKeyword {
                    return self.element_type(object);
                }
            }
        }

        let keys = self.literal_keys(index)?;
        let members = self.members(object)?;
        let mut selected: Vec<Ty<'p>> = keys
            .iter()
            .filter_map(|key| members.iter().find(|m| &m.name == key))
            .map(|m| m.ty.clone())
            .collect();
        match selected.len() {
            0 => None,
            1 => selected.pop(),
            _ => Some(Ty::Union(selected)),
        }
    }

    /// Element type of an array or tuple type.
    fn element_type(&mut self, ty: &Ty<'p>) -> Option<Ty<'p>> {
        let Ty::Ast { ty, scope } = ty else {
            return None;
        };
        match *ty {
            TsType::TsArrayType(array) => Some(Ty::ast(&array.elem_type, scope)),
            TsType::TsTupleType(tuple) => Some(Ty::Union(
                tuple.elem_types.iter().map(|e| Ty::ast(&e.ty, scope)).collect(),
            )),
            TsType::TsParenthesizedType(paren) => self.element_type(&Ty::ast(&paren.type_ann, scope)),
            TsType::TsTypeRef(type_ref) => {
                let path = entity_path(&type_ref.type_name);
                match self.lookup(scope, &path) {
                    Named::Param(ty) => self.element_type(&ty),
                    Named::Unknown(name) if name == "Array" || name == "ReadonlyArray" => {
                        type_args(type_ref, scope).into_iter().next()
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Shapes
    // ---------------------------------------------------------------------

    fn shape(&mut self, ty: &Ty<'p>, depth: usize) -> TypeShape {
        if self.recursion >= MAX_RECURSION {
            return TypeShape::any();
        }
        self.recursion += 1;
        let shape = match ty {
            Ty::Ast { ty, scope } => self.ast_shape(*ty, scope, depth),
            Ty::StrLit(s) => TypeShape::Literal(Literal::String(s.to_string())),
            Ty::Func => TypeShape::FunctionSignature,
            Ty::Any => TypeShape::any(),
            Ty::Union(tys) => self.union_shape(tys, depth),
        };
        self.recursion -= 1;
        shape
    }

    fn ast_shape(&mut self, ty: &'p TsType, scope: &Scope<'p>, depth: usize) -> TypeShape {
        match ty {
            TsType::TsKeywordType(keyword) => keyword_shape(keyword.kind),
            TsType::TsFnOrConstructorType(_) => TypeShape::FunctionSignature,
            TsType::TsTypeRef(type_ref) => self.ref_shape(type_ref, scope, depth),
            TsType::TsTypeLit(lit) => {
                let only_calls = !lit.members.is_empty()
                    && lit
                        .members
                        .iter()
                        .all(|m| matches!(m, TsTypeElement::TsCallSignatureDecl(_)));
                if only_calls {
                    return TypeShape::FunctionSignature;
                }
                let members = self.literal_members(lit, scope);
                self.object_shape(members, depth)
            }
            TsType::TsArrayType(array) => TypeShape::ArrayOf(Box::new(
                self.shape(&Ty::ast(&array.elem_type, scope), depth),
            )),
            TsType::TsTupleType(tuple) => {
                if tuple.elem_types.is_empty() {
                    return TypeShape::Primitive(PrimitiveKind::Array);
                }
                let elements: Vec<Ty<'p>> =
                    tuple.elem_types.iter().map(|e| Ty::ast(&e.ty, scope)).collect();
                TypeShape::ArrayOf(Box::new(self.union_shape(&elements, depth)))
            }
            TsType::TsOptionalType(optional) => self.shape(&Ty::ast(&optional.type_ann, scope), depth),
            TsType::TsRestType(rest) => match self.shape(&Ty::ast(&rest.type_ann, scope), depth) {
                TypeShape::ArrayOf(element) => *element,
                other => other,
            },
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let tys: Vec<Ty<'p>> = union.types.iter().map(|t| Ty::ast(t, scope)).collect();
                self.union_shape(&tys, depth)
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => {
                let mut merged = IndexMap::new();
                let mut other = None;
                for part in &intersection.types {
                    let part = Ty::ast(part, scope);
                    match self.members(&part) {
                        Some(members) => merge_members(&mut merged, members),
                        None => {
                            let shape = self.shape(&part, depth);
                            let opaque = matches!(
                                shape,
                                TypeShape::Primitive(PrimitiveKind::Object | PrimitiveKind::Any)
                                    | TypeShape::ObjectOf(_)
                            );
                            if !opaque && other.is_none() {
                                other = Some(shape);
                            }
                        }
                    }
                }
                match other {
                    Some(shape) => shape,
                    None => self.object_shape(merged.into_values().collect(), depth),
                }
            }
            TsType::TsParenthesizedType(paren) => self.shape(&Ty::ast(&paren.type_ann, scope), depth),
            TsType::TsTypeOperator(op) => match op.op {
                TsTypeOperatorOp::KeyOf => self.keyof_shape(&Ty::ast(&op.type_ann, scope)),
                TsTypeOperatorOp::ReadOnly => self.shape(&Ty::ast(&op.type_ann, scope), depth),
                TsTypeOperatorOp::Unique => TypeShape::Primitive(PrimitiveKind::Symbol),
            },
            TsType::TsIndexedAccessType(access) => {
                let target = self.indexed_access(
                    &Ty::ast(&access.obj_type, scope),
                    &Ty::ast(&access.index_type, scope),
                );
                match target {
                    Some(target) => self.shape(&target, depth),
                    None => TypeShape::any(),
                }
            }
            TsType::TsMappedType(mapped) => match self.mapped_members(mapped, scope) {
                Some(members) => self.object_shape(members, depth),
                None => TypeShape::Primitive(PrimitiveKind::Object),
            },
            TsType::TsLitType(lit) => literal_type_shape(&lit.lit),
            TsType::TsTypePredicate(_) => TypeShape::Primitive(PrimitiveKind::Boolean),
            // this, typeof, conditional, infer and import types
            _ => TypeShape::any(),
        }
    }

    fn object_shape(&mut self, members: Vec<Member<'p>>, depth: usize) -> TypeShape {
        if members.is_empty() || depth >= self.options.max_depth {
            return TypeShape::Primitive(PrimitiveKind::Object);
        }
        TypeShape::ObjectOf(self.to_props(members, depth + 1))
    }

    fn ref_shape(&mut self, type_ref: &'p TsTypeRef, scope: &Scope<'p>, depth: usize) -> TypeShape {
        let path = entity_path(&type_ref.type_name);
        let args = type_args(type_ref, scope);
        match self.lookup(scope, &path) {
            Named::Param(ty) => self.shape(&ty, depth),
            Named::Decl(decl) => self.decl_shape(&decl, &args, depth),
            Named::EnumMember { decl, member } => self
                .enum_values(&decl)
                .and_then(|values| values.into_iter().find(|(name, _)| *name == member))
                .map_or_else(TypeShape::any, |(_, value)| TypeShape::Literal(value)),
            Named::External { module, name } => {
                let shape = if well_known::is_react_module(&module) {
                    well_known::react_type(&name)
                } else {
                    None
                };
                shape.unwrap_or_else(|| {
                    tracing::debug!("unknown type `{name}` from `{module}`");
                    TypeShape::any()
                })
            }
            Named::Unknown(name) => self.global_shape(&name, &args, depth),
        }
    }

    fn decl_shape(&mut self, decl: &DeclRef, args: &[Ty<'p>], depth: usize) -> TypeShape {
        let decls = self.program.declarations(decl);

        let alias = decls.iter().find_map(|d| match d {
            Declaration::TypeAlias(alias) => Some(alias),
            _ => None,
        });
        let is_interface = decls.iter().any(|d| matches!(d, Declaration::Interface(_)));

        if is_interface || alias.is_some() {
            if self.expanding.contains(decl) {
                self.referenced.insert(decl.clone());
                return TypeShape::Reference(self.reference_name(decl));
            }
            self.expanding.push(decl.clone());
            let shape = match alias {
                Some(alias) if !is_interface => {
                    let scope = self.bind_params(decl.file, alias.type_params.as_deref(), args);
                    self.shape(&Ty::ast(&alias.type_ann, &scope), depth)
                }
                _ => match self.decl_members(decl, args) {
                    Some(members) => self.object_shape(members, depth),
                    None => TypeShape::Primitive(PrimitiveKind::Object),
                },
            };
            self.expanding.pop();

            if self.referenced.contains(decl) {
                let name = self.reference_name(decl);
                self.definitions
                    .entry(name)
                    .or_insert_with(|| shape.clone());
            }
            return shape;
        }

        if let Some(values) = self.enum_values(decl) {
            let literals: Vec<Literal> = values.into_iter().map(|(_, value)| value).collect();
            return classify(literals.into_iter().map(TypeShape::Literal).collect());
        }
        if decls.iter().any(|d| matches!(d, Declaration::Class { .. })) {
            return TypeShape::InstanceOf(decl.name.to_string());
        }
        TypeShape::any()
    }

    fn global_shape(&mut self, name: &str, args: &[Ty<'p>], depth: usize) -> TypeShape {
        match name {
            "Array" | "ReadonlyArray" => match args.first() {
                Some(element) => TypeShape::ArrayOf(Box::new(self.shape(element, depth))),
                None => TypeShape::Primitive(PrimitiveKind::Array),
            },
            "Partial" | "Required" | "Readonly" | "Pick" | "Omit" | "Record" => {
                match self.utility_members(name, args) {
                    Some(members) => self.object_shape(members, depth),
                    None => TypeShape::Primitive(PrimitiveKind::Object),
                }
            }
            "NonNullable" => match args.first() {
                Some(inner) => self.union_shape(std::slice::from_ref(inner), depth),
                None => TypeShape::any(),
            },
            _ => well_known::global_type(name).unwrap_or_else(|| {
                tracing::debug!("unresolved type `{name}`");
                TypeShape::any()
            }),
        }
    }

    fn keyof_shape(&mut self, target: &Ty<'p>) -> TypeShape {
        match self.members(target) {
            Some(members) => classify(
                members
                    .into_iter()
                    .map(|m| TypeShape::Literal(Literal::String(m.name)))
                    .collect(),
            ),
            None => TypeShape::Primitive(PrimitiveKind::String),
        }
    }

    fn union_shape(&mut self, tys: &[Ty<'p>], depth: usize) -> TypeShape {
        let mut flat = Vec::new();
        for ty in tys {
            self.flatten_union(ty, &mut flat, &mut FxHashSet::default());
        }
        let mut shapes = Vec::new();
        for ty in flat.iter().filter(|ty| !is_nullish(ty)) {
            match self.shape(ty, depth) {
                TypeShape::UnionOf(inner) => shapes.extend(inner),
                TypeShape::EnumOfLiterals(literals) => {
                    shapes.extend(literals.into_iter().map(TypeShape::Literal))
                }
                shape => shapes.push(shape),
            }
        }
        classify(shapes)
    }

    /// Expands unions through parentheses, generic parameters and union-valued aliases.
    fn flatten_union(
        &mut self,
        ty: &Ty<'p>,
        out: &mut Vec<Ty<'p>>,
        seen: &mut FxHashSet<(FileId, String)>,
    ) {
        let Ty::Ast { ty: node, scope } = ty else {
            match ty {
                Ty::Union(tys) => {
                    for ty in tys {
                        self.flatten_union(ty, out, seen);
                    }
                }
                other => out.push(other.clone()),
            }
            return;
        };

        match *node {
            TsType::TsParenthesizedType(paren) => {
                self.flatten_union(&Ty::ast(&paren.type_ann, scope), out, seen)
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                for member in &union.types {
                    self.flatten_union(&Ty::ast(member, scope), out, seen);
                }
            }
            TsType::TsTypeRef(type_ref) => {
                let path = entity_path(&type_ref.type_name);
                match self.lookup(scope, &path) {
                    Named::Param(bound) => self.flatten_union(&bound, out, seen),
                    Named::Decl(decl) => {
                        let alias = self
                            .program
                            .declarations(&decl)
                            .iter()
                            .find_map(|d| match d {
                                Declaration::TypeAlias(alias) => Some(alias),
                                _ => None,
                            });
                        match alias {
                            Some(alias)
                                if is_union(&alias.type_ann)
                                    && seen.insert((decl.file, decl.name.to_string())) =>
                            {
                                let args = type_args(type_ref, scope);
                                let scope =
                                    self.bind_params(decl.file, alias.type_params.as_deref(), &args);
                                self.flatten_union(&Ty::ast(&alias.type_ann, &scope), out, seen);
                            }
                            _ => out.push(ty.clone()),
                        }
                    }
                    _ => out.push(ty.clone()),
                }
            }
            _ => out.push(ty.clone()),
        }
    }

    fn admits_nullish(&mut self, ty: &Ty<'p>) -> bool {
        let mut flat = Vec::new();
        self.flatten_union(ty, &mut flat, &mut FxHashSet::default());
        flat.iter().any(is_nullish)
    }

    // ---------------------------------------------------------------------
    // Names
    // ---------------------------------------------------------------------

    fn lookup(&self, scope: &Scope<'p>, path: &[&str]) -> Named<'p> {
        let Some((first, rest)) = path.split_first() else {
            return Named::Unknown(String::new());
        };
        let last = path.last().copied().unwrap_or_default();
        let qualified = if path.len() >= 2 && path[path.len() - 2] == "JSX" {
            format!("JSX{last}")
        } else {
            last.to_string()
        };

        if rest.is_empty() {
            if let Some(bound) = scope.params.get(*first) {
                return Named::Param(bound.clone());
            }
        }

        let mut current = self.program.resolve_name(scope.file, first);
        for (i, segment) in rest.iter().enumerate() {
            current = match current {
                Some(Resolution::Namespace(file)) => self.program.resolve_export(file, segment),
                Some(Resolution::ExternalNamespace(module))
                | Some(Resolution::External { module, .. }) => {
                    return Named::External {
                        module,
                        name: qualified,
                    };
                }
                Some(Resolution::Local(decl)) => {
                    let is_enum = self
                        .program
                        .declarations(&decl)
                        .iter()
                        .any(|d| matches!(d, Declaration::Enum(_)));
                    if is_enum && i + 1 == rest.len() {
                        return Named::EnumMember {
                            decl,
                            member: segment.to_string(),
                        };
                    }
                    return Named::Unknown(qualified);
                }
                None if *first == "React" || *first == "JSX" => {
                    return Named::External {
                        module: SmolStr::new_static("react"),
                        name: qualified,
                    };
                }
                None => return Named::Unknown(qualified),
            };
        }

        match current {
            Some(Resolution::Local(decl)) => Named::Decl(decl),
            Some(Resolution::External { module, name }) => Named::External {
                module,
                name: name.to_string(),
            },
            Some(Resolution::Namespace(_)) | Some(Resolution::ExternalNamespace(_)) | None => {
                Named::Unknown(qualified)
            }
        }
    }

    fn bind_params(
        &self,
        file: FileId,
        decl: Option<&'p TsTypeParamDecl>,
        args: &[Ty<'p>],
    ) -> Scope<'p> {
        let mut scope = Scope::root(file);
        let Some(decl) = decl else {
            return scope;
        };
        for (i, param) in decl.params.iter().enumerate() {
            let bound = args
                .get(i)
                .cloned()
                .or_else(|| param.default.as_deref().map(|ty| Ty::ast(ty, &scope)))
                .or_else(|| param.constraint.as_deref().map(|ty| Ty::ast(ty, &scope)))
                .unwrap_or(Ty::Any);
            scope = scope.with(SmolStr::new(&*param.name.sym), bound);
        }
        scope
    }

    /// Enum members and their values, or `None` when `decl` is not an enum.
    fn enum_values(&self, decl: &DeclRef) -> Option<Vec<(String, Literal)>> {
        let enums: Vec<&TsEnumDecl> = self
            .program
            .declarations(decl)
            .iter()
            .filter_map(|d| match d {
                Declaration::Enum(e) => Some(&**e),
                _ => None,
            })
            .collect();
        if enums.is_empty() {
            return None;
        }

        let mut values = Vec::new();
        for e in enums {
            let mut next = 0.0;
            for member in &e.members {
                let name = match &member.id {
                    TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
                    TsEnumMemberId::Str(s) => s.value.to_string_lossy().into_owned(),
                };
                let value = match member.init.as_deref() {
                    None => Some(Literal::Number(next)),
                    Some(init) => literal_expr(init),
                };
                match value {
                    Some(Literal::Number(n)) => {
                        next = n + 1.0;
                        values.push((name, Literal::Number(n)));
                    }
                    Some(value) => values.push((name, value)),
                    None => tracing::debug!("skipping computed enum member `{name}`"),
                }
            }
        }
        Some(values)
    }

    fn text(&self, file: FileId, span: Span) -> String {
        self.program.source(file).text_of(span).to_string()
    }

    fn doc(&self, file: FileId, span: Span) -> Option<String> {
        self.program
            .source(file)
            .jsdoc_at(span.lo)
            .map(str::to_string)
    }
}

/// Orders union members into the canonical shape.
///
/// `true | false` becomes `boolean`, literals absorbed by their primitive are
/// dropped, same-kind literals become an enum, a single member stands alone.
pub(crate) fn classify(shapes: Vec<TypeShape>) -> TypeShape {
    let mut unique: Vec<TypeShape> = Vec::with_capacity(shapes.len());
    for shape in shapes {
        if !unique.contains(&shape) {
            unique.push(shape);
        }
    }
    if unique.iter().any(TypeShape::is_any) {
        return TypeShape::any();
    }

    let has = |unique: &[TypeShape], literal: Literal| unique.contains(&TypeShape::Literal(literal));
    if has(&unique, Literal::Boolean(true)) && has(&unique, Literal::Boolean(false)) {
        let position = unique
            .iter()
            .position(|s| matches!(s, TypeShape::Literal(Literal::Boolean(_))))
            .unwrap_or(0);
        unique.retain(|s| !matches!(s, TypeShape::Literal(Literal::Boolean(_))));
        if !unique.contains(&TypeShape::Primitive(PrimitiveKind::Boolean)) {
            unique.insert(position.min(unique.len()), TypeShape::Primitive(PrimitiveKind::Boolean));
        }
    }

    let primitives: Vec<PrimitiveKind> = unique
        .iter()
        .filter_map(|s| match s {
            TypeShape::Primitive(kind) => Some(*kind),
            _ => None,
        })
        .collect();
    unique.retain(|s| match s {
        TypeShape::Literal(Literal::String(_)) => !primitives.contains(&PrimitiveKind::String),
        TypeShape::Literal(Literal::Number(_)) => !primitives.contains(&PrimitiveKind::Number),
        TypeShape::Literal(Literal::Boolean(_)) => !primitives.contains(&PrimitiveKind::Boolean),
        _ => true,
    });

    match unique.len() {
        0 => return TypeShape::any(),
        1 => return unique.remove(0),
        _ => {}
    }

    let literals: Option<Vec<Literal>> = unique
        .iter()
        .map(|s| match s {
            TypeShape::Literal(literal) => Some(literal.clone()),
            _ => None,
        })
        .collect();
    match literals {
        Some(literals) if literals.iter().all(|l| l.same_kind(&literals[0])) => {
            TypeShape::EnumOfLiterals(literals)
        }
        _ => TypeShape::UnionOf(unique),
    }
}

fn is_nullish(ty: &Ty<'_>) -> bool {
    match ty {
        Ty::Ast {
            ty: TsType::TsKeywordType(keyword),
            ..
        } => matches!(
            keyword.kind,
            TsKeywordTypeKind::TsNullKeyword | TsKeywordTypeKind::TsUndefinedKeyword
        ),
        _ => false,
    }
}

fn merge_members<'p>(merged: &mut IndexMap<String, Member<'p>>, members: Vec<Member<'p>>) {
    for member in members {
        merged.insert(member.name.clone(), member);
    }
}

fn keyword_shape(kind: TsKeywordTypeKind) -> TypeShape {
    let primitive = match kind {
        TsKeywordTypeKind::TsStringKeyword => PrimitiveKind::String,
        TsKeywordTypeKind::TsNumberKeyword => PrimitiveKind::Number,
        TsKeywordTypeKind::TsBooleanKeyword => PrimitiveKind::Boolean,
        TsKeywordTypeKind::TsBigIntKeyword => PrimitiveKind::BigInt,
        TsKeywordTypeKind::TsSymbolKeyword => PrimitiveKind::Symbol,
        TsKeywordTypeKind::TsObjectKeyword => PrimitiveKind::Object,
        TsKeywordTypeKind::TsNullKeyword => return TypeShape::Literal(Literal::Null),
        _ => PrimitiveKind::Any,
    };
    TypeShape::Primitive(primitive)
}

fn literal_type_shape(lit: &TsLit) -> TypeShape {
    match lit {
        TsLit::Str(s) => TypeShape::Literal(Literal::String(s.value.to_string_lossy().into_owned())),
        TsLit::Number(n) => TypeShape::Literal(Literal::Number(n.value)),
        TsLit::Bool(b) => TypeShape::Literal(Literal::Boolean(b.value)),
        TsLit::BigInt(_) => TypeShape::Primitive(PrimitiveKind::BigInt),
        TsLit::Tpl(tpl) if tpl.types.is_empty() => TypeShape::Literal(Literal::String(
            tpl.quasis.iter().map(|q| q.raw.to_string()).collect(),
        )),
        TsLit::Tpl(_) => TypeShape::Primitive(PrimitiveKind::String),
    }
}

/// A literal expression usable as an enum value or default.
pub(crate) fn literal_expr(expr: &Expr) -> Option<Literal> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(Literal::String(s.value.to_string_lossy().into_owned())),
        Expr::Lit(Lit::Num(n)) => Some(Literal::Number(n.value)),
        Expr::Lit(Lit::Bool(b)) => Some(Literal::Boolean(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Literal::Null),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match literal_expr(&unary.arg)? {
            Literal::Number(n) => Some(Literal::Number(-n)),
            _ => None,
        },
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => Some(Literal::String(
            tpl.quasis.iter().map(|q| q.raw.to_string()).collect(),
        )),
        Expr::Paren(paren) => literal_expr(&paren.expr),
        _ => None,
    }
}

fn property_key(key: &Expr, computed: bool) -> Option<String> {
    match key {
        Expr::Ident(ident) if !computed => Some(ident.sym.to_string()),
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string_lossy().into_owned()),
        Expr::Lit(Lit::Num(n)) => Some(format_number(n.value)),
        _ => None,
    }
}

pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

fn entity_path(name: &TsEntityName) -> Vec<&str> {
    match name {
        TsEntityName::Ident(ident) => vec![&*ident.sym],
        TsEntityName::TsQualifiedName(qualified) => {
            let mut path = entity_path(&qualified.left);
            path.push(&*qualified.right.sym);
            path
        }
    }
}

fn expr_path(expr: &Expr) -> Option<Vec<&str>> {
    match expr {
        Expr::Ident(ident) => Some(vec![&*ident.sym]),
        Expr::Member(member) => {
            let mut path = expr_path(&member.obj)?;
            path.push(&*member.prop.as_ident()?.sym);
            Some(path)
        }
        _ => None,
    }
}

fn type_args<'p>(type_ref: &'p TsTypeRef, scope: &Scope<'p>) -> Vec<Ty<'p>> {
    type_ref
        .type_params
        .as_deref()
        .map(|args| args.params.iter().map(|t| Ty::ast(t, scope)).collect())
        .unwrap_or_default()
}

fn plain_ref_name(ty: &TsType) -> Option<&str> {
    match ty {
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            type_params: None,
            ..
        }) => Some(&*ident.sym),
        _ => None,
    }
}

fn is_union(ty: &TsType) -> bool {
    match ty {
        TsType::TsParenthesizedType(paren) => is_union(&paren.type_ann),
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(_)) => true,
        _ => false,
    }
}
