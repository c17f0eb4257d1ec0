//! Flat name -> value maps extracted from `attribute` markers.
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::model::{ElementId, Marker, MarkerKind, TypeModel};
use crate::walk;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    List(Vec<String>),
}

pub type AttributeMap = IndexMap<String, AttributeValue>;

/// Attributes declared anywhere in `root`'s hierarchy. A more-derived declaration replaces
/// an inherited one with the same name outright.
pub fn build(model: &TypeModel, root: ElementId) -> AttributeMap {
    let mut map = AttributeMap::new();
    walk::walk(model, Some(root), MarkerKind::Attribute, |id, marker| {
        let Marker::Attribute(marker) = marker else {
            return;
        };
        let element = model.get(id);
        let name = marker.name_override().unwrap_or(element.simple_name.as_str()).to_string();
        let values = &marker.value.0;
        let value = if marker.collection || values.len() > 1 {
            AttributeValue::List(values.clone())
        } else {
            AttributeValue::Single(values.first().cloned().unwrap_or_default())
        };
        if let Some(previous) = map.insert(name.clone(), value) {
            debug!(attribute = %name, element = %element.qualified_name, ?previous, "attribute overridden");
        }
    });
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::model_from_json;
    use serde_json::json;

    fn attr(name: &str, marker: serde_json::Value) -> serde_json::Value {
        json!({"kind": "field", "name": name, "type": "String", "markers": [marker]})
    }

    #[test]
    fn derived_declaration_replaces_inherited_value() {
        let model = model_from_json(
            json!([
                {"name": "p.Base", "members": [
                    attr("x", json!({"kind": "attribute", "value": ["b1", "b2"]})),
                    attr("y", json!({"kind": "attribute", "value": "base-y"}))
                ]},
                {"name": "p.Derived", "extends": "p.Base", "members": [
                    attr("x", json!({"kind": "attribute", "value": "derived"}))
                ]}
            ]),
            json!([]),
        );
        let map = build(&model, model.lookup("p.Derived").unwrap());
        assert_eq!(map["x"], AttributeValue::Single("derived".into()));
        assert_eq!(map["y"], AttributeValue::Single("base-y".into()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn collection_flag_and_arity_select_list_values() {
        let model = model_from_json(
            json!({"name": "p.T", "members": [
                attr("one", json!({"kind": "attribute", "value": "v"})),
                attr("forced", json!({"kind": "attribute", "value": "v", "collection": true})),
                attr("many", json!({"kind": "attribute", "value": ["a", "b"]})),
                attr("empty", json!({"kind": "attribute"}))
            ]}),
            json!([]),
        );
        let map = build(&model, model.lookup("p.T").unwrap());
        assert_eq!(map["one"], AttributeValue::Single("v".into()));
        assert_eq!(map["forced"], AttributeValue::List(vec!["v".into()]));
        assert_eq!(map["many"], AttributeValue::List(vec!["a".into(), "b".into()]));
        assert_eq!(map["empty"], AttributeValue::Single(String::new()));
    }

    #[test]
    fn name_defaults_to_member_name() {
        let model = model_from_json(
            json!({"name": "p.T", "members": [
                attr("foo", json!({"kind": "attribute", "value": "1"})),
                attr("bar", json!({"kind": "attribute", "name": "renamed", "value": "2"}))
            ]}),
            json!([]),
        );
        let map = build(&model, model.lookup("p.T").unwrap());
        assert!(map.contains_key("foo"));
        assert!(map.contains_key("renamed"));
        assert!(!map.contains_key("bar"));
    }
}
