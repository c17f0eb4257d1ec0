use serde::Deserialize;

/// A declarative marker attached to a type or member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Marker {
    Rule(RuleMarker),
    NamedObject(NamedObjectMarker),
    Argument(ArgumentMarker),
    Attribute(AttributeMarker),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Rule,
    NamedObject,
    Argument,
    Attribute,
}

impl MarkerKind {
    /// The `kind` tag used in model documents.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::Rule => "rule",
            MarkerKind::NamedObject => "named-object",
            MarkerKind::Argument => "argument",
            MarkerKind::Attribute => "attribute",
        }
    }
}

impl Marker {
    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::Rule(_) => MarkerKind::Rule,
            Marker::NamedObject(_) => MarkerKind::NamedObject,
            Marker::Argument(_) => MarkerKind::Argument,
            Marker::Attribute(_) => MarkerKind::Attribute,
        }
    }
}

/// Marks a top-level type as a rule implementation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMarker {
    #[serde(default)]
    pub value: Option<String>,
    /// Classification values. Only the first one is honoured.
    #[serde(default, rename = "type")]
    pub types: StringValues,
}

impl RuleMarker {
    pub fn value_override(&self) -> Option<&str> {
        non_blank(&self.value)
    }
}

/// Marks a top-level type as a named configuration object.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedObjectMarker {
    #[serde(default)]
    pub value: Option<String>,
}

impl NamedObjectMarker {
    pub fn value_override(&self) -> Option<&str> {
        non_blank(&self.value)
    }
}

/// Declares a rule argument (or return value) on a field, method or nested type.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentMarker {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub role: ArgumentRole,
    /// The member's type is the rule's overall return type.
    #[serde(default)]
    pub return_type: bool,
}

impl ArgumentMarker {
    pub fn name_override(&self) -> Option<&str> {
        non_blank(&self.name)
    }
}

/// Which signature list an argument lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgumentRole {
    #[default]
    Input,
    Returns,
}

/// Declares a flat attribute on a field, method or nested type.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMarker {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: StringValues,
    /// Always emit the value as a list, even with a single entry.
    #[serde(default)]
    pub collection: bool,
}

impl AttributeMarker {
    pub fn name_override(&self) -> Option<&str> {
        non_blank(&self.name)
    }
}

/// A marker parameter that accepts either a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct StringValues(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for StringValues {
    fn from(raw: OneOrMany) -> Self {
        match raw {
            OneOrMany::One(s) => StringValues(vec![s]),
            OneOrMany::Many(xs) => StringValues(xs),
        }
    }
}

impl StringValues {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

// Marker parameters default to "" in most front-ends; blank means "not set".
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn markers_parse_by_kind() {
        let m: Marker = serde_json::from_value(json!({
            "kind": "argument", "name": "amount", "required": true, "role": "returns", "returnType": true
        }))
        .unwrap();
        let Marker::Argument(arg) = m else { panic!("expected argument marker") };
        assert_eq!(arg.name_override(), Some("amount"));
        assert!(arg.required);
        assert_eq!(arg.role, ArgumentRole::Returns);
        assert!(arg.return_type);
    }

    #[test]
    fn string_values_accept_one_or_many() {
        let one: AttributeMarker = serde_json::from_value(json!({"value": "x"})).unwrap();
        assert_eq!(one.value, StringValues(vec!["x".into()]));
        let many: RuleMarker = serde_json::from_value(json!({"type": ["a", "b"]})).unwrap();
        assert_eq!(many.types.len(), 2);
        let none: RuleMarker = serde_json::from_value(json!({})).unwrap();
        assert!(none.types.is_empty());
    }

    #[test]
    fn blank_overrides_are_absent() {
        let m = RuleMarker { value: Some("   ".into()), ..RuleMarker::default() };
        assert_eq!(m.value_override(), None);
        let m = NamedObjectMarker { value: Some(" tax ".into()) };
        assert_eq!(m.value_override(), Some("tax"));
    }
}
