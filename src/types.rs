//! Type-expression heuristics: erasure, container detection, generic-argument unwrapping.
//!
//! Types arrive as source-level expressions such as `java.util.List<java.lang.String>`.
//! Everything the builders need to know about them goes through [`TypeIntrospection`], so a
//! front-end with a real type checker can swap in its own answers.
use indexmap::IndexSet;
use serde::Serialize;

use crate::model::{ElementId, TypeModel};

/// A type expression exactly as declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(expr: impl Into<String>) -> Self {
        TypeRef(expr.into().trim().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait TypeIntrospection {
    /// Is `ty` assignable to an ordered/unordered container abstraction?
    fn is_container_type(&self, ty: &TypeRef) -> bool;
    /// Raw form of `ty` with generic arguments stripped.
    fn erase(&self, ty: &TypeRef) -> String;
    /// First generic argument of `ty`, if it has a usable one.
    fn first_type_argument(&self, ty: &TypeRef) -> Option<TypeRef>;
}

/// Collection abstractions recognised out of the box, by qualified and simple name.
pub const DEFAULT_CONTAINERS: &[&str] = &[
    "java.util.Collection",
    "java.util.List",
    "java.util.Set",
    "java.util.SortedSet",
    "java.util.NavigableSet",
    "java.util.Queue",
    "java.util.Deque",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.TreeSet",
    "java.util.ArrayDeque",
    "Collection",
    "List",
    "Set",
    "SortedSet",
    "NavigableSet",
    "Queue",
    "Deque",
    "ArrayList",
    "LinkedList",
    "HashSet",
    "LinkedHashSet",
    "TreeSet",
    "ArrayDeque",
];

/// Textual introspection backed by the loaded model for user-declared containers.
pub struct ModelTypes<'m> {
    model: &'m TypeModel,
    containers: IndexSet<String>,
}

impl<'m> ModelTypes<'m> {
    pub fn new(model: &'m TypeModel) -> Self {
        Self::with_containers(model, std::iter::empty::<String>())
    }

    /// Recognise `extra` container names on top of [`DEFAULT_CONTAINERS`].
    pub fn with_containers<I>(model: &'m TypeModel, extra: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut containers: IndexSet<String> =
            DEFAULT_CONTAINERS.iter().map(|s| s.to_string()).collect();
        containers.extend(extra.into_iter().map(Into::into));
        Self { model, containers }
    }

    // Walks supertypes and interfaces of a model type. The model is acyclic along
    // supertypes, but interfaces are free text, so visited ids are tracked.
    fn model_type_is_container(&self, id: ElementId, visited: &mut IndexSet<ElementId>) -> bool {
        if !visited.insert(id) {
            return false;
        }
        let element = self.model.get(id);
        let parents = element.supertype_ref.iter().chain(element.interfaces.iter());
        for parent in parents {
            let erased = erase_expr(parent.as_str());
            if self.containers.contains(&erased) {
                return true;
            }
            if let Some(next) = self.model.resolve_type(id, &erased) {
                if self.model_type_is_container(next, visited) {
                    return true;
                }
            }
        }
        false
    }
}

impl TypeIntrospection for ModelTypes<'_> {
    fn is_container_type(&self, ty: &TypeRef) -> bool {
        let erased = erase_expr(ty.as_str());
        if erased.ends_with("[]") {
            return false;
        }
        if self.containers.contains(&erased) {
            return true;
        }
        match self.model.lookup(&erased) {
            Some(id) => self.model_type_is_container(id, &mut IndexSet::new()),
            None => false,
        }
    }

    fn erase(&self, ty: &TypeRef) -> String {
        erase_expr(ty.as_str())
    }

    fn first_type_argument(&self, ty: &TypeRef) -> Option<TypeRef> {
        let first = type_arguments(ty.as_str()).into_iter().next()?;
        unwrap_wildcard(first).map(TypeRef::new)
    }
}

/// Strip every generic argument list: `a.Map<K, a.List<V>>[]` -> `a.Map[]`.
pub fn erase_expr(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut depth = 0usize;
    for c in expr.trim().chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

/// Top-level generic arguments of the outermost type, split on depth-1 commas.
fn type_arguments(expr: &str) -> Vec<&str> {
    let Some(open) = expr.find('<') else {
        return Vec::new();
    };
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = open + 1;
    for (i, c) in expr.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    args.push(expr[start..i].trim());
                    break;
                }
            }
            ',' if depth == 1 => {
                args.push(expr[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.retain(|a| !a.is_empty());
    args
}

// `? extends Foo` and `? super Foo` bind to Foo; a bare `?` carries no type.
fn unwrap_wildcard(arg: &str) -> Option<&str> {
    let Some(rest) = arg.strip_prefix('?') else {
        return Some(arg);
    };
    let rest = rest.trim_start();
    rest.strip_prefix("extends")
        .or_else(|| rest.strip_prefix("super"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
