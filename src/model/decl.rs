//! Serialized form of the type model, as written by a front-end extractor.
use serde::Deserialize;
use serde_json::Value;

use super::marker::Marker;

/// One declared type. `name` is fully qualified at the top level and simple when nested.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecl {
    pub name: String,
    #[serde(default = "void")]
    pub returns: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorDecl {
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

fn void() -> String {
    "void".to_string()
}

/// Accepts `{"types": [...]}`, a bare array of declarations, or a single declaration.
///
/// Dispatch happens on the raw value (instead of an untagged enum) so that errors keep the
/// JSON path of the offending value.
pub fn parse_document(value: Value) -> Result<Vec<TypeDecl>, String> {
    match value {
        Value::Object(mut map) if map.contains_key("types") => {
            let types = map.remove("types").unwrap_or(Value::Null);
            crate::path_de::from_value_with_path::<Vec<TypeDecl>>(types)
                .map_err(|e| format!("in `types`: {e}"))
        }
        Value::Array(_) => crate::path_de::from_value_with_path::<Vec<TypeDecl>>(value),
        other => crate::path_de::from_value_with_path::<TypeDecl>(other).map(|decl| vec![decl]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_all_document_shapes() {
        let decl = json!({"name": "a.B"});
        assert_eq!(parse_document(json!({"types": [decl.clone()]})).unwrap().len(), 1);
        assert_eq!(parse_document(json!([decl.clone(), decl.clone()])).unwrap().len(), 2);
        assert_eq!(parse_document(decl).unwrap()[0].name, "a.B");
    }

    #[test]
    fn members_are_tagged_by_kind() {
        let decls = parse_document(json!({
            "name": "a.Outer",
            "members": [
                {"kind": "field", "name": "x", "type": "int"},
                {"kind": "method", "name": "run"},
                {"kind": "constructor"},
                {"kind": "type", "name": "Inner", "extends": "a.Base"}
            ]
        }))
        .unwrap();
        let members = &decls[0].members;
        assert!(matches!(&members[0], MemberDecl::Field(f) if f.ty.as_deref() == Some("int")));
        assert!(matches!(&members[1], MemberDecl::Method(m) if m.returns == "void"));
        assert!(matches!(&members[2], MemberDecl::Constructor(_)));
        assert!(matches!(&members[3], MemberDecl::Type(t) if t.name == "Inner"));
    }

    #[test]
    fn errors_carry_the_json_path() {
        let err = parse_document(json!({"types": [{"name": "a.B", "members": [{"kind": "field"}]}]}))
            .unwrap_err();
        assert!(err.contains("[0].members[0]"), "{err}");
    }
}
