//! Top-level symbol binding for one source file.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use swc_ecma_ast::{
    Class, Decl, DefaultDecl, ExportSpecifier, Expr, Function, Ident, ImportSpecifier, Module,
    ModuleDecl, ModuleExportName, ModuleItem, Pat, Stmt, TsEnumDecl, TsInterfaceDecl,
    TsTypeAliasDecl, VarDeclKind, VarDeclarator,
};

/// A top-level declaration bound under a name.
#[derive(Debug, Clone)]
pub enum Declaration {
    Interface(Box<TsInterfaceDecl>),
    TypeAlias(Box<TsTypeAliasDecl>),
    Enum(Box<TsEnumDecl>),
    Class {
        ident: Ident,
        class: Box<Class>,
    },
    Function {
        ident: Ident,
        function: Box<Function>,
    },
    Variable {
        kind: VarDeclKind,
        declarator: Box<VarDeclarator>,
    },
}

impl Declaration {
    /// Whether the declaration introduces a type (interfaces, aliases, enums, classes).
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Declaration::Interface(_)
                | Declaration::TypeAlias(_)
                | Declaration::Enum(_)
                | Declaration::Class { .. }
        )
    }
}

/// How an imported local name is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import { name as local } from 'module'` (and default imports as `default`).
    Named { module: SmolStr, name: SmolStr },
    /// `import * as local from 'module'`
    Namespace { module: SmolStr },
}

impl ImportBinding {
    pub fn module(&self) -> &str {
        match self {
            ImportBinding::Named { module, .. } | ImportBinding::Namespace { module } => module,
        }
    }
}

/// What an exported name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// A name bound in this file (local declaration or import).
    Local(SmolStr),
    /// `export { name } from 'module'`
    ReExport { module: SmolStr, name: SmolStr },
    /// `export * as ns from 'module'`
    ReExportNamespace(SmolStr),
}

/// Symbols bound at the top level of one file.
#[derive(Debug, Clone, Default)]
pub struct FileSymbols {
    /// Local declarations in source order; merged interfaces share a name.
    pub locals: IndexMap<SmolStr, Vec<Declaration>>,
    pub imports: FxHashMap<SmolStr, ImportBinding>,
    pub exports: FxHashMap<SmolStr, ExportTarget>,
    /// `export * from 'module'` specifiers, in source order.
    pub star_exports: Vec<SmolStr>,
    /// Whether the file has any import or export, i.e. is an ES module.
    pub is_module: bool,
}

impl FileSymbols {
    /// Every module specifier the file references.
    pub fn module_requests(&self) -> Vec<SmolStr> {
        let mut requests: Vec<SmolStr> = Vec::new();
        let imports = self.imports.values().map(|b| SmolStr::new(b.module()));
        let exports = self.exports.values().filter_map(|target| match target {
            ExportTarget::ReExport { module, .. } | ExportTarget::ReExportNamespace(module) => {
                Some(module.clone())
            }
            ExportTarget::Local(_) => None,
        });
        for request in imports
            .chain(exports)
            .chain(self.star_exports.iter().cloned())
        {
            if !requests.contains(&request) {
                requests.push(request);
            }
        }
        requests.sort();
        requests
    }

    fn add_local(&mut self, name: &Ident, decl: Declaration) {
        self.locals
            .entry(SmolStr::new(&*name.sym))
            .or_default()
            .push(decl);
    }

    fn export_local(&mut self, exported: impl Into<SmolStr>, local: impl Into<SmolStr>) {
        self.exports
            .insert(exported.into(), ExportTarget::Local(local.into()));
    }
}

/// Binds the top-level declarations, imports and exports of a module.
pub(crate) fn bind_module(module: &Module) -> FileSymbols {
    let mut symbols = FileSymbols::default();

    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => bind_decl(&mut symbols, decl, false),
            ModuleItem::Stmt(_) => {}
            ModuleItem::ModuleDecl(module_decl) => {
                symbols.is_module = true;
                bind_module_decl(&mut symbols, module_decl);
            }
        }
    }

    symbols
}

fn bind_module_decl(symbols: &mut FileSymbols, decl: &ModuleDecl) {
    match decl {
        ModuleDecl::Import(import) => {
            let module = SmolStr::new(import.src.value.to_string_lossy());
            for spec in &import.specifiers {
                let (local, binding) = match spec {
                    ImportSpecifier::Named(named) => {
                        let name = named
                            .imported
                            .as_ref()
                            .map(export_name)
                            .unwrap_or_else(|| SmolStr::new(&*named.local.sym));
                        (
                            &named.local,
                            ImportBinding::Named {
                                module: module.clone(),
                                name,
                            },
                        )
                    }
                    ImportSpecifier::Default(default) => (
                        &default.local,
                        ImportBinding::Named {
                            module: module.clone(),
                            name: SmolStr::new_static("default"),
                        },
                    ),
                    ImportSpecifier::Namespace(ns) => (
                        &ns.local,
                        ImportBinding::Namespace {
                            module: module.clone(),
                        },
                    ),
                };
                symbols
                    .imports
                    .insert(SmolStr::new(&*local.sym), binding);
            }
        }
        ModuleDecl::ExportDecl(export) => bind_decl(symbols, &export.decl, true),
        ModuleDecl::ExportNamed(named) => {
            let source = named
                .src
                .as_ref()
                .map(|src| SmolStr::new(src.value.to_string_lossy()));
            for spec in &named.specifiers {
                match (spec, &source) {
                    (ExportSpecifier::Named(spec), None) => {
                        let local = export_name(&spec.orig);
                        let exported = spec.exported.as_ref().map(export_name);
                        symbols.export_local(exported.unwrap_or_else(|| local.clone()), local);
                    }
                    (ExportSpecifier::Named(spec), Some(module)) => {
                        let name = export_name(&spec.orig);
                        let exported = spec
                            .exported
                            .as_ref()
                            .map(export_name)
                            .unwrap_or_else(|| name.clone());
                        symbols.exports.insert(
                            exported,
                            ExportTarget::ReExport {
                                module: module.clone(),
                                name,
                            },
                        );
                    }
                    (ExportSpecifier::Namespace(ns), Some(module)) => {
                        symbols.exports.insert(
                            export_name(&ns.name),
                            ExportTarget::ReExportNamespace(module.clone()),
                        );
                    }
                    (ExportSpecifier::Default(default), Some(module)) => {
                        symbols.exports.insert(
                            SmolStr::new(&*default.exported.sym),
                            ExportTarget::ReExport {
                                module: module.clone(),
                                name: SmolStr::new_static("default"),
                            },
                        );
                    }
                    _ => {}
                }
            }
        }
        ModuleDecl::ExportAll(all) => {
            symbols
                .star_exports
                .push(SmolStr::new(all.src.value.to_string_lossy()));
        }
        ModuleDecl::ExportDefaultDecl(default) => match &default.decl {
            DefaultDecl::Fn(fn_expr) => {
                if let Some(ident) = &fn_expr.ident {
                    symbols.add_local(
                        ident,
                        Declaration::Function {
                            ident: ident.clone(),
                            function: fn_expr.function.clone(),
                        },
                    );
                    symbols.export_local("default", &*ident.sym);
                }
            }
            DefaultDecl::Class(class_expr) => {
                if let Some(ident) = &class_expr.ident {
                    symbols.add_local(
                        ident,
                        Declaration::Class {
                            ident: ident.clone(),
                            class: class_expr.class.clone(),
                        },
                    );
                    symbols.export_local("default", &*ident.sym);
                }
            }
            DefaultDecl::TsInterfaceDecl(interface) => {
                symbols.add_local(&interface.id, Declaration::Interface(interface.clone()));
                symbols.export_local("default", &*interface.id.sym);
            }
        },
        ModuleDecl::ExportDefaultExpr(default) => {
            if let Expr::Ident(ident) = default.expr.as_ref() {
                symbols.export_local("default", &*ident.sym);
            }
        }
        _ => {}
    }
}

fn bind_decl(symbols: &mut FileSymbols, decl: &Decl, exported: bool) {
    let mut bound: Vec<SmolStr> = Vec::new();
    match decl {
        Decl::TsInterface(interface) => {
            symbols.add_local(&interface.id, Declaration::Interface(interface.clone()));
            bound.push(SmolStr::new(&*interface.id.sym));
        }
        Decl::TsTypeAlias(alias) => {
            symbols.add_local(&alias.id, Declaration::TypeAlias(alias.clone()));
            bound.push(SmolStr::new(&*alias.id.sym));
        }
        Decl::TsEnum(decl) => {
            symbols.add_local(&decl.id, Declaration::Enum(decl.clone()));
            bound.push(SmolStr::new(&*decl.id.sym));
        }
        Decl::Class(class) => {
            symbols.add_local(
                &class.ident,
                Declaration::Class {
                    ident: class.ident.clone(),
                    class: class.class.clone(),
                },
            );
            bound.push(SmolStr::new(&*class.ident.sym));
        }
        Decl::Fn(func) => {
            symbols.add_local(
                &func.ident,
                Declaration::Function {
                    ident: func.ident.clone(),
                    function: func.function.clone(),
                },
            );
            bound.push(SmolStr::new(&*func.ident.sym));
        }
        Decl::Var(var) => {
            for declarator in &var.decls {
                if let Pat::Ident(binding) = &declarator.name {
                    symbols.add_local(
                        &binding.id,
                        Declaration::Variable {
                            kind: var.kind,
                            declarator: Box::new(declarator.clone()),
                        },
                    );
                    bound.push(SmolStr::new(&*binding.id.sym));
                }
            }
        }
        _ => {}
    }

    if exported {
        for name in bound {
            symbols.export_local(name.clone(), name);
        }
    }
}

fn export_name(name: &ModuleExportName) -> SmolStr {
    match name {
        ModuleExportName::Ident(ident) => SmolStr::new(&*ident.sym),
        ModuleExportName::Str(value) => SmolStr::new(value.value.to_string_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_source, SourceKind};
    use camino::Utf8Path;
    use pretty_assertions::assert_eq;

    fn bind(text: &str) -> FileSymbols {
        let parsed = parse_source(Utf8Path::new("/test.tsx"), text, SourceKind::Tsx).unwrap();
        bind_module(&parsed.module)
    }

    #[test]
    fn binds_local_declarations_in_order() {
        let symbols = bind(
            "interface A { a: string }\ntype B = { b: number };\nenum C { X }\ninterface A { c: boolean }\n",
        );
        let names: Vec<&str> = symbols.locals.keys().map(SmolStr::as_str).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(symbols.locals["A"].len(), 2);
        assert!(!symbols.is_module);
    }

    #[test]
    fn binds_imports() {
        let symbols = bind(
            "import React, { FC as Component } from 'react';\nimport * as types from './types';\n",
        );
        assert_eq!(
            symbols.imports["React"],
            ImportBinding::Named {
                module: "react".into(),
                name: "default".into()
            }
        );
        assert_eq!(
            symbols.imports["Component"],
            ImportBinding::Named {
                module: "react".into(),
                name: "FC".into()
            }
        );
        assert_eq!(
            symbols.imports["types"],
            ImportBinding::Namespace {
                module: "./types".into()
            }
        );
        assert!(symbols.is_module);
    }

    #[test]
    fn binds_exports_and_reexports() {
        let symbols = bind(
            "export interface Props { a: string }\nexport { Props as ButtonProps };\nexport { Other } from './other';\nexport * from './all';\nexport default function Button(props: Props) { return null; }\n",
        );
        assert_eq!(symbols.exports["Props"], ExportTarget::Local("Props".into()));
        assert_eq!(
            symbols.exports["ButtonProps"],
            ExportTarget::Local("Props".into())
        );
        assert_eq!(
            symbols.exports["Other"],
            ExportTarget::ReExport {
                module: "./other".into(),
                name: "Other".into()
            }
        );
        assert_eq!(symbols.exports["default"], ExportTarget::Local("Button".into()));
        assert_eq!(symbols.star_exports, vec![SmolStr::new("./all")]);
        assert_eq!(
            symbols.module_requests(),
            vec![SmolStr::new("./all"), SmolStr::new("./other")]
        );
    }
}
