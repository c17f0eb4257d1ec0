//! Artifact documents and their XML wire form.
//!
//! Shape of a rule document:
//!
//! ```xml
//! <rule name="discount" type="pricing" language="java">
//!   <description>...</description>
//!   <attributes>
//!     <attribute key="implementation" value="com.acme.Discount"/>
//!     <attribute key="tags"><item>a</item><item>b</item></attribute>
//!   </attributes>
//!   <signature returnType="java.math.BigDecimal">
//!     <arguments>
//!       <argument name="amount" type="int" multi="false" required="true">
//!         <description>...</description><prompt>...</prompt>
//!       </argument>
//!     </arguments>
//!     <returns>...</returns>
//!   </signature>
//! </rule>
//! ```
//!
//! Named objects use `<named-object name="...">` with only `<description>` and
//! `<attributes>`. List order in the document is the order of the in-memory lists.
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element};
use sxd_document::{Package, parser, writer};

use crate::attributes::{AttributeMap, AttributeValue};
use crate::error::DocumentError;
use crate::signature::{Argument, Signature};

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDocument {
    pub name: String,
    pub rule_type: Option<String>,
    pub language: String,
    pub description: Option<String>,
    pub attributes: AttributeMap,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedObjectDocument {
    pub name: String,
    pub description: Option<String>,
    pub attributes: AttributeMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Rule(RuleDocument),
    NamedObject(NamedObjectDocument),
}

impl Artifact {
    pub fn name(&self) -> &str {
        match self {
            Artifact::Rule(rule) => &rule.name,
            Artifact::NamedObject(named) => &named.name,
        }
    }
}

/// Turns artifacts into document text and back.
pub trait DocumentFormat {
    fn to_document(&self, artifact: &Artifact) -> Result<String, DocumentError>;
    fn parse_document(&self, text: &str) -> Result<Artifact, DocumentError>;
    /// File extension of rendered documents, without the dot.
    fn extension(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl DocumentFormat for XmlFormat {
    fn to_document(&self, artifact: &Artifact) -> Result<String, DocumentError> {
        let package = Package::new();
        let doc = package.as_document();
        let root = match artifact {
            Artifact::Rule(rule) => rule_element(&doc, rule),
            Artifact::NamedObject(named) => named_object_element(&doc, named),
        };
        doc.root().append_child(root);

        let mut out = Vec::new();
        writer::format_document(&doc, &mut out).map_err(|e| DocumentError::Serialize(e.to_string()))?;
        String::from_utf8(out).map_err(|e| DocumentError::Serialize(e.to_string()))
    }

    fn parse_document(&self, text: &str) -> Result<Artifact, DocumentError> {
        let package = parser::parse(text).map_err(|e| DocumentError::Parse(format!("{e:?}")))?;
        let doc = package.as_document();
        let root = doc
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(e) => Some(e),
                _ => None,
            })
            .ok_or_else(|| DocumentError::Shape("no root element".into()))?;

        match root.name().local_part() {
            "rule" => Ok(Artifact::Rule(RuleDocument {
                name: required_attr(root, "name")?,
                rule_type: root.attribute_value("type").map(str::to_string),
                language: required_attr(root, "language")?,
                description: child(root, "description").map(text_of),
                attributes: read_attributes(child(root, "attributes"))?,
                signature: read_signature(child(root, "signature"))?,
            })),
            "named-object" => Ok(Artifact::NamedObject(NamedObjectDocument {
                name: required_attr(root, "name")?,
                description: child(root, "description").map(text_of),
                attributes: read_attributes(child(root, "attributes"))?,
            })),
            other => Err(DocumentError::Shape(format!("unknown root element <{other}>"))),
        }
    }

    fn extension(&self) -> &'static str {
        "xml"
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WRITING
// ————————————————————————————————————————————————————————————————————————————

fn rule_element<'d>(doc: &Document<'d>, rule: &RuleDocument) -> Element<'d> {
    let root = doc.create_element("rule");
    root.set_attribute_value("name", &rule.name);
    if let Some(rule_type) = &rule.rule_type {
        root.set_attribute_value("type", rule_type);
    }
    root.set_attribute_value("language", &rule.language);
    if let Some(description) = &rule.description {
        append_text_element(doc, root, "description", description);
    }
    root.append_child(attributes_element(doc, &rule.attributes));
    root.append_child(signature_element(doc, &rule.signature));
    root
}

fn named_object_element<'d>(doc: &Document<'d>, named: &NamedObjectDocument) -> Element<'d> {
    let root = doc.create_element("named-object");
    root.set_attribute_value("name", &named.name);
    if let Some(description) = &named.description {
        append_text_element(doc, root, "description", description);
    }
    root.append_child(attributes_element(doc, &named.attributes));
    root
}

fn attributes_element<'d>(doc: &Document<'d>, attributes: &AttributeMap) -> Element<'d> {
    let list = doc.create_element("attributes");
    for (key, value) in attributes {
        let entry = doc.create_element("attribute");
        entry.set_attribute_value("key", key);
        match value {
            AttributeValue::Single(value) => {
                entry.set_attribute_value("value", value);
            }
            AttributeValue::List(items) => {
                for item in items {
                    append_text_element(doc, entry, "item", item);
                }
            }
        }
        list.append_child(entry);
    }
    list
}

fn signature_element<'d>(doc: &Document<'d>, signature: &Signature) -> Element<'d> {
    let element = doc.create_element("signature");
    if let Some(return_type) = &signature.return_type {
        element.set_attribute_value("returnType", return_type);
    }
    element.append_child(arguments_element(doc, "arguments", &signature.arguments));
    element.append_child(arguments_element(doc, "returns", &signature.returns));
    element
}

fn arguments_element<'d>(doc: &Document<'d>, name: &str, arguments: &[Argument]) -> Element<'d> {
    let list = doc.create_element(name);
    for argument in arguments {
        let entry = doc.create_element("argument");
        entry.set_attribute_value("name", &argument.name);
        entry.set_attribute_value("type", &argument.type_name);
        entry.set_attribute_value("multi", bool_str(argument.multi_valued));
        entry.set_attribute_value("required", bool_str(argument.required));
        if let Some(description) = &argument.description {
            append_text_element(doc, entry, "description", description);
        }
        if let Some(prompt) = &argument.prompt {
            append_text_element(doc, entry, "prompt", prompt);
        }
        list.append_child(entry);
    }
    list
}

fn append_text_element<'d>(doc: &Document<'d>, parent: Element<'d>, name: &str, text: &str) {
    let element = doc.create_element(name);
    element.append_child(doc.create_text(text));
    parent.append_child(element);
}

fn bool_str(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

// ————————————————————————————————————————————————————————————————————————————
// READING
// ————————————————————————————————————————————————————————————————————————————

fn children<'d>(element: Element<'d>, name: &'d str) -> impl Iterator<Item = Element<'d>> {
    element.children().into_iter().filter_map(move |c| match c {
        ChildOfElement::Element(e) if e.name().local_part() == name => Some(e),
        _ => None,
    })
}

fn child<'d>(element: Element<'d>, name: &'d str) -> Option<Element<'d>> {
    children(element, name).next()
}

fn text_of(element: Element<'_>) -> String {
    element
        .children()
        .into_iter()
        .filter_map(|c| match c {
            ChildOfElement::Text(t) => Some(t.text().to_string()),
            _ => None,
        })
        .collect()
}

fn required_attr(element: Element<'_>, name: &str) -> Result<String, DocumentError> {
    element.attribute_value(name).map(str::to_string).ok_or_else(|| {
        DocumentError::Shape(format!(
            "<{}> is missing the `{name}` attribute",
            element.name().local_part()
        ))
    })
}

fn bool_attr(element: Element<'_>, name: &str) -> Result<bool, DocumentError> {
    match required_attr(element, name)?.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(DocumentError::Shape(format!("`{name}` must be true or false, got `{other}`"))),
    }
}

fn read_attributes(list: Option<Element<'_>>) -> Result<AttributeMap, DocumentError> {
    let mut map = AttributeMap::new();
    let Some(list) = list else {
        return Ok(map);
    };
    for entry in children(list, "attribute") {
        let key = required_attr(entry, "key")?;
        let value = match entry.attribute_value("value") {
            Some(value) => AttributeValue::Single(value.to_string()),
            None => AttributeValue::List(children(entry, "item").map(text_of).collect()),
        };
        map.insert(key, value);
    }
    Ok(map)
}

fn read_signature(element: Option<Element<'_>>) -> Result<Signature, DocumentError> {
    let Some(element) = element else {
        return Ok(Signature::default());
    };
    Ok(Signature {
        arguments: read_arguments(child(element, "arguments"))?,
        returns: read_arguments(child(element, "returns"))?,
        return_type: element.attribute_value("returnType").map(str::to_string),
    })
}

fn read_arguments(list: Option<Element<'_>>) -> Result<Vec<Argument>, DocumentError> {
    let Some(list) = list else {
        return Ok(Vec::new());
    };
    children(list, "argument")
        .map(|entry| {
            Ok(Argument {
                name: required_attr(entry, "name")?,
                type_name: required_attr(entry, "type")?,
                multi_valued: bool_attr(entry, "multi")?,
                required: bool_attr(entry, "required")?,
                description: child(entry, "description").map(text_of),
                prompt: child(entry, "prompt").map(text_of),
            })
        })
        .collect()
}
