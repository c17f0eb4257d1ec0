//! Ancestor-first, depth-first collection of marked elements.
//!
//! For a node the order is:
//! 1. the supertype's walk (so ancestors precede descendants),
//! 2. the walk of every enclosed member, in declaration order,
//! 3. the node itself, when it carries the marker.
//!
//! There is no de-duplication: an element reachable along two paths is visited twice.
use tracing::{debug, warn};

use crate::model::{ElementId, Marker, MarkerKind, TypeModel};

/// Visit every element under `root` carrying a `kind` marker, in traversal order.
pub fn walk<'m, F>(model: &'m TypeModel, root: Option<ElementId>, kind: MarkerKind, mut visit: F)
where
    F: FnMut(ElementId, &'m Marker),
{
    let Some(root) = root else {
        return;
    };
    let mut on_stack = vec![false; model.len()];
    walk_inner(model, root, kind, &mut on_stack, &mut visit);
}

/// The elements [`walk`] would visit, in order.
pub fn collect(model: &TypeModel, root: Option<ElementId>, kind: MarkerKind) -> Vec<ElementId> {
    let mut out = Vec::new();
    walk(model, root, kind, |id, _| out.push(id));
    out
}

fn walk_inner<'m, F>(
    model: &'m TypeModel,
    id: ElementId,
    kind: MarkerKind,
    on_stack: &mut [bool],
    visit: &mut F,
) where
    F: FnMut(ElementId, &'m Marker),
{
    let element = model.get(id);
    // A nested type extending its enclosing type would otherwise recurse forever.
    if on_stack[id.index()] {
        warn!(element = %element.qualified_name, "element re-entered during its own walk, skipping");
        return;
    }
    on_stack[id.index()] = true;

    if let Some(supertype) = element.supertype {
        debug!(element = %element.qualified_name, supertype = %model.get(supertype).qualified_name, "descending into supertype");
        walk_inner(model, supertype, kind, on_stack, visit);
    }
    for member in &element.enclosed {
        walk_inner(model, *member, kind, on_stack, visit);
    }
    if let Some(marker) = element.marker(kind) {
        visit(id, marker);
    }

    on_stack[id.index()] = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::model_from_json;
    use serde_json::json;

    fn arg(name: &str) -> serde_json::Value {
        json!({"kind": "field", "name": name, "type": "int", "markers": [{"kind": "argument"}]})
    }

    fn names(model: &TypeModel, ids: &[ElementId]) -> Vec<String> {
        ids.iter().map(|id| model.get(*id).simple_name.clone()).collect()
    }

    #[test]
    fn ancestors_come_first_at_every_depth() {
        let model = model_from_json(
            json!([
                {"name": "p.Root", "members": [arg("r1"), arg("r2")]},
                {"name": "p.Mid", "extends": "p.Root", "members": [arg("m1")]},
                {"name": "p.Leaf", "extends": "p.Mid", "members": [arg("l1"), arg("l2")]}
            ]),
            json!([]),
        );
        let ids = collect(&model, model.lookup("p.Leaf"), MarkerKind::Argument);
        assert_eq!(names(&model, &ids), ["r1", "r2", "m1", "l1", "l2"]);
    }

    #[test]
    fn nested_declarations_expand_in_place() {
        let model = model_from_json(
            json!({"name": "p.Outer", "members": [
                arg("a"),
                {"kind": "type", "name": "Inner", "members": [arg("inner")],
                 "markers": [{"kind": "argument"}]},
                arg("b")
            ]}),
            json!([]),
        );
        let ids = collect(&model, model.lookup("p.Outer"), MarkerKind::Argument);
        assert_eq!(names(&model, &ids), ["a", "inner", "Inner", "b"]);
    }

    #[test]
    fn root_marker_is_visited_last() {
        let model = model_from_json(
            json!({"name": "p.T", "markers": [{"kind": "attribute"}], "members": [
                {"kind": "method", "name": "m", "returns": "int", "markers": [{"kind": "attribute"}]}
            ]}),
            json!([]),
        );
        let ids = collect(&model, model.lookup("p.T"), MarkerKind::Attribute);
        assert_eq!(names(&model, &ids), ["m", "T"]);
    }

    #[test]
    fn two_paths_yield_two_visits() {
        let model = model_from_json(
            json!([
                {"name": "p.Base", "members": [arg("shared")]},
                {"name": "p.Outer", "members": [
                    {"kind": "type", "name": "N1", "extends": "p.Base"},
                    {"kind": "type", "name": "N2", "extends": "p.Base"}
                ]}
            ]),
            json!([]),
        );
        let ids = collect(&model, model.lookup("p.Outer"), MarkerKind::Argument);
        assert_eq!(names(&model, &ids), ["shared", "shared"]);
        assert_eq!(ids[0], ids[1]);
    }

    #[test]
    fn absent_root_yields_nothing() {
        let model = TypeModel::default();
        assert!(collect(&model, None, MarkerKind::Argument).is_empty());
    }

    #[test]
    fn nested_type_extending_its_owner_terminates() {
        let model = model_from_json(
            json!({"name": "p.A", "members": [
                arg("x"),
                {"kind": "type", "name": "Inner", "extends": "p.A", "members": [arg("y")]}
            ]}),
            json!([]),
        );
        let ids = collect(&model, model.lookup("p.A"), MarkerKind::Argument);
        assert_eq!(names(&model, &ids), ["x", "y"]);
    }

    #[test]
    fn other_marker_kinds_are_ignored() {
        let model = model_from_json(
            json!({"name": "p.T", "members": [
                arg("a"),
                {"kind": "field", "name": "attr", "type": "int", "markers": [{"kind": "attribute"}]}
            ]}),
            json!([]),
        );
        let ids = collect(&model, model.lookup("p.T"), MarkerKind::Argument);
        assert_eq!(names(&model, &ids), ["a"]);
    }
}
