//! Shapes for library and DOM types that are not declared in the program.

use crate::types::{ElementKind, PrimitiveKind, TypeShape};

/// Module specifiers whose exports are treated as React types.
pub(crate) fn is_react_module(module: &str) -> bool {
    matches!(module, "react" | "preact/compat" | "@types/react")
}

/// Shape of a type exported by React, by its exported name.
pub(crate) fn react_type(name: &str) -> Option<TypeShape> {
    let shape = match name {
        "ReactNode" | "ReactChild" | "ReactFragment" | "ReactChildren" => {
            TypeShape::Element(ElementKind::Node)
        }
        "ReactElement" | "ReactPortal" | "JSXElement" => TypeShape::Element(ElementKind::Element),
        "ComponentType" | "ElementType" | "FC" | "FunctionComponent" | "VFC"
        | "ComponentClass" | "JSXElementConstructor" | "ExoticComponent"
        | "ForwardRefExoticComponent" | "NamedExoticComponent" | "LazyExoticComponent"
        | "MemoExoticComponent" => TypeShape::Element(ElementKind::ElementType),
        "ReactText" => TypeShape::UnionOf(vec![
            TypeShape::Primitive(PrimitiveKind::String),
            TypeShape::Primitive(PrimitiveKind::Number),
        ]),
        "CSSProperties" | "RefObject" | "MutableRefObject" => {
            TypeShape::Primitive(PrimitiveKind::Object)
        }
        "Ref" | "LegacyRef" | "ForwardedRef" | "Dispatch" | "EventHandler"
        | "ReactEventHandler" => TypeShape::FunctionSignature,
        name if name.ends_with("EventHandler") => TypeShape::FunctionSignature,
        _ => return None,
    };
    Some(shape)
}

/// Shape of a global (lib.d.ts) type that the program does not declare.
///
/// Generic containers (`Array`, `Record`, ...) are handled by the resolver.
pub(crate) fn global_type(name: &str) -> Option<TypeShape> {
    let shape = match name {
        "Date" | "RegExp" | "Element" | "HTMLElement" | "Error" | "Map" | "Set" | "WeakMap"
        | "WeakSet" | "File" | "Blob" => TypeShape::InstanceOf(name.to_string()),
        name if is_html_element(name) => TypeShape::InstanceOf(name.to_string()),
        "Function" | "CallableFunction" | "NewableFunction" => TypeShape::FunctionSignature,
        "Object" => TypeShape::Primitive(PrimitiveKind::Object),
        "String" => TypeShape::Primitive(PrimitiveKind::String),
        "Number" => TypeShape::Primitive(PrimitiveKind::Number),
        "Boolean" => TypeShape::Primitive(PrimitiveKind::Boolean),
        "Symbol" => TypeShape::Primitive(PrimitiveKind::Symbol),
        "BigInt" => TypeShape::Primitive(PrimitiveKind::BigInt),
        _ => return None,
    };
    Some(shape)
}

fn is_html_element(name: &str) -> bool {
    name.len() > "HTMLElement".len() && name.starts_with("HTML") && name.ends_with("Element")
}
