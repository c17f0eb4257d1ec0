//! Rule signatures: ordered arguments and return values extracted from `argument` markers.
use serde::Serialize;
use tracing::{debug, warn};

use crate::description::DescriptionCache;
use crate::model::{ElementId, Marker, MarkerKind, TypeModel, marker::ArgumentRole};
use crate::types::TypeIntrospection;
use crate::walk;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub arguments: Vec<Argument>,
    pub returns: Vec<Argument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub multi_valued: bool,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Non-fatal findings while building a signature.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureNote {
    /// More than one member claimed the overall return type; the later one won.
    ReturnTypeOverwritten { previous: String, current: String, element: String },
}

/// Everything the signature builder reads besides the model itself.
pub struct Extraction<'a> {
    pub model: &'a TypeModel,
    pub types: &'a dyn TypeIntrospection,
    pub descriptions: &'a DescriptionCache,
}

/// Build the signature of `root` and its whole hierarchy.
pub fn build(cx: &Extraction<'_>, root: ElementId) -> (Signature, Vec<SignatureNote>) {
    let mut signature = Signature::default();
    let mut notes = Vec::new();

    walk::walk(cx.model, Some(root), MarkerKind::Argument, |id, marker| {
        let Marker::Argument(marker) = marker else {
            return;
        };
        let element = cx.model.get(id);
        let effective = element.effective_type();

        // Member types may name model types relative to the declaring package.
        let (multi_valued, type_name) = if cx.types.is_container_type(&cx.model.qualify(id, &effective)) {
            let item = cx
                .types
                .first_type_argument(&effective)
                .map(|arg| arg.as_str().to_string())
                .unwrap_or_else(|| {
                    debug!(element = %element.qualified_name, ty = %effective, "container without type argument, using raw type");
                    cx.types.erase(&effective)
                });
            (true, item)
        } else {
            (false, cx.types.erase(&effective))
        };

        let argument = Argument {
            name: marker.name_override().unwrap_or(element.simple_name.as_str()).to_string(),
            type_name,
            multi_valued,
            required: marker.required,
            description: cx.descriptions.read(cx.model, id),
            prompt: marker
                .prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        };

        if marker.return_type {
            let erased = cx.types.erase(&effective);
            if let Some(previous) = signature.return_type.replace(erased.clone()) {
                warn!(element = %element.qualified_name, previous = %previous, current = %erased,
                    "return type declared more than once, keeping the last");
                notes.push(SignatureNote::ReturnTypeOverwritten {
                    previous,
                    current: erased,
                    element: element.qualified_name.clone(),
                });
            }
        }

        match marker.role {
            ArgumentRole::Input => signature.arguments.push(argument),
            ArgumentRole::Returns => signature.returns.push(argument),
        }
    });

    (signature, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{DescriptionCache, FsResourceStore};
    use crate::model::model_from_json;
    use crate::types::ModelTypes;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn signature_of(sources: Value, classpath: Value, root: &str) -> (Signature, Vec<SignatureNote>, TempDir) {
        let dir = TempDir::new().unwrap();
        let model = model_from_json(sources, classpath);
        let types = ModelTypes::new(&model);
        let descriptions = DescriptionCache::new(Box::new(FsResourceStore::new(dir.path())));
        let cx = Extraction { model: &model, types: &types, descriptions: &descriptions };
        let (sig, notes) = build(&cx, model.lookup(root).unwrap());
        (sig, notes, dir)
    }

    fn names(args: &[Argument]) -> Vec<&str> {
        args.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn base_arguments_precede_derived_ones() {
        let (sig, _, _dir) = signature_of(
            json!([
                {"name": "p.Base", "members": [
                    {"kind": "field", "name": "a", "type": "String", "markers": [{"kind": "argument"}]}
                ]},
                {"name": "p.Derived", "extends": "p.Base", "members": [
                    {"kind": "field", "name": "b", "type": "String", "markers": [{"kind": "argument"}]}
                ]}
            ]),
            json!([]),
            "p.Derived",
        );
        assert_eq!(names(&sig.arguments), ["a", "b"]);
    }

    #[test]
    fn deep_hierarchy_flattens_in_declaration_order() {
        let level = |name: &str, parent: Option<&str>, args: &[&str]| {
            let members: Vec<Value> = args
                .iter()
                .map(|a| json!({"kind": "field", "name": a, "type": "int", "markers": [{"kind": "argument"}]}))
                .collect();
            json!({"name": name, "extends": parent, "members": members})
        };
        let (sig, _, _dir) = signature_of(
            json!([
                level("p.L3", Some("p.L2"), &["l3a", "l3b"]),
                level("p.L2", Some("p.L1"), &["l2a"]),
                level("p.L1", Some("p.L0"), &["l1a", "l1b", "l1c"]),
                level("p.L0", None, &["l0a"]),
            ]),
            json!([]),
            "p.L3",
        );
        assert_eq!(names(&sig.arguments), ["l0a", "l1a", "l1b", "l1c", "l2a", "l3a", "l3b"]);
    }

    #[test]
    fn container_members_are_multi_valued() {
        let (sig, _, _dir) = signature_of(
            json!({"name": "p.R", "members": [
                {"kind": "field", "name": "tags", "type": "java.util.List<String>", "markers": [{"kind": "argument"}]},
                {"kind": "field", "name": "raw", "type": "java.util.Set", "markers": [{"kind": "argument"}]},
                {"kind": "field", "name": "lookup", "type": "java.util.Map<String, Integer>", "markers": [{"kind": "argument"}]}
            ]}),
            json!([]),
            "p.R",
        );
        let [tags, raw, lookup] = &sig.arguments[..] else { panic!("three arguments") };
        assert!(tags.multi_valued);
        assert_eq!(tags.type_name, "String");
        assert!(raw.multi_valued);
        assert_eq!(raw.type_name, "java.util.Set");
        assert!(!lookup.multi_valued);
        assert_eq!(lookup.type_name, "java.util.Map");
    }

    #[test]
    fn package_relative_member_types_resolve_to_model_containers() {
        let (sig, _, _dir) = signature_of(
            json!([
                {"name": "p.Bag", "implements": ["java.util.Collection"]},
                {"name": "p.R", "members": [
                    {"kind": "field", "name": "raw", "type": "Bag", "markers": [{"kind": "argument"}]},
                    {"kind": "field", "name": "typed", "type": "Bag<p.Item>", "markers": [{"kind": "argument"}]},
                    {"kind": "field", "name": "qualified", "type": "p.Bag", "markers": [{"kind": "argument"}]},
                    {"kind": "field", "name": "other", "type": "Unknown", "markers": [{"kind": "argument"}]}
                ]}
            ]),
            json!([]),
            "p.R",
        );
        let [raw, typed, qualified, other] = &sig.arguments[..] else { panic!("four arguments") };
        assert!(raw.multi_valued);
        assert_eq!(raw.type_name, "Bag");
        assert!(typed.multi_valued);
        assert_eq!(typed.type_name, "p.Item");
        assert!(qualified.multi_valued);
        assert!(!other.multi_valued);
        assert_eq!(other.type_name, "Unknown");
    }

    #[test]
    fn marker_parameters_shape_the_argument() {
        let (sig, _, _dir) = signature_of(
            json!({"name": "p.R", "members": [
                {"kind": "field", "name": "foo", "type": "int", "doc": "  The foo.  ",
                 "markers": [{"kind": "argument", "required": true, "prompt": "  "}]},
                {"kind": "method", "name": "getBar", "returns": "a.Bar<X>",
                 "markers": [{"kind": "argument", "name": "bar", "prompt": " Pick a bar "}]}
            ]}),
            json!([]),
            "p.R",
        );
        let foo = &sig.arguments[0];
        assert_eq!(foo.name, "foo");
        assert!(foo.required);
        assert_eq!(foo.prompt, None);
        assert_eq!(foo.description.as_deref(), Some("The foo."));
        let bar = &sig.arguments[1];
        assert_eq!(bar.name, "bar");
        assert_eq!(bar.type_name, "a.Bar");
        assert!(!bar.required);
        assert_eq!(bar.prompt.as_deref(), Some("Pick a bar"));
    }

    #[test]
    fn roles_split_lists_independently_of_return_type_flag() {
        let (sig, notes, _dir) = signature_of(
            json!({"name": "p.R", "members": [
                {"kind": "field", "name": "in1", "type": "int", "markers": [{"kind": "argument"}]},
                {"kind": "field", "name": "out1", "type": "java.util.List<a.Row>",
                 "markers": [{"kind": "argument", "role": "returns", "returnType": true}]},
                {"kind": "field", "name": "in2", "type": "a.Total",
                 "markers": [{"kind": "argument", "returnType": true}]}
            ]}),
            json!([]),
            "p.R",
        );
        assert_eq!(names(&sig.arguments), ["in1", "in2"]);
        assert_eq!(names(&sig.returns), ["out1"]);
        assert_eq!(sig.return_type.as_deref(), Some("a.Total"));
        assert_eq!(
            notes,
            [SignatureNote::ReturnTypeOverwritten {
                previous: "java.util.List".into(),
                current: "a.Total".into(),
                element: "p.R.in2".into(),
            }]
        );
    }

    #[test]
    fn classpath_supertype_contributes_arguments() {
        let (sig, _, _dir) = signature_of(
            json!({"name": "p.R", "extends": "lib.Base", "members": [
                {"kind": "field", "name": "mine", "type": "int", "markers": [{"kind": "argument"}]}
            ]}),
            json!({"name": "lib.Base", "members": [
                {"kind": "field", "name": "inherited", "type": "int", "doc": "not live", "markers": [{"kind": "argument"}]}
            ]}),
            "p.R",
        );
        assert_eq!(names(&sig.arguments), ["inherited", "mine"]);
        assert_eq!(sig.arguments[0].description, None);
    }
}
