//! Immutable build-time view of the declared type hierarchy.
//!
//! Declarations from the model documents are flattened into an arena of [`Element`]s.
//! Owner, supertype and member links are resolved once in [`TypeModel::build`]; nothing
//! downstream mutates the model or calls back into the front-end.
pub mod decl;
pub mod marker;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ModelError;
use crate::types::{TypeRef, erase_expr};

pub use decl::{MemberDecl, TypeDecl};
pub use marker::{Marker, MarkerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Type,
    Field,
    Method,
    Constructor,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Type => "type",
            ElementKind::Field => "field",
            ElementKind::Method => "method",
            ElementKind::Constructor => "constructor",
        }
    }
}

/// Where a declaration came from in this build round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Compiled in this round; documentation is live.
    Source,
    /// Separately compiled; only its shape is known.
    Classpath,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub simple_name: String,
    /// Types: fully qualified name. Members: owner's qualified name + `.` + simple name.
    pub qualified_name: String,
    /// Field type or method return type.
    pub declared_type: Option<TypeRef>,
    pub owner: Option<ElementId>,
    pub supertype: Option<ElementId>,
    /// Textual supertype reference, kept even when it does not resolve.
    pub supertype_ref: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub enclosed: Vec<ElementId>,
    pub markers: Vec<Marker>,
    pub doc: Option<String>,
    pub origin: Origin,
}

impl Element {
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }

    /// The type a member contributes to a signature: a method's return type, a field's
    /// declared type, or the type itself for nested declarations.
    pub fn effective_type(&self) -> TypeRef {
        match self.kind {
            ElementKind::Type => TypeRef::new(self.qualified_name.clone()),
            ElementKind::Field | ElementKind::Method => self
                .declared_type
                .clone()
                .unwrap_or_else(|| TypeRef::new("void")),
            ElementKind::Constructor => TypeRef::new("void"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    elements: Vec<Element>,
    types: IndexMap<String, ElementId>,
    top_level: Vec<ElementId>,
}

impl TypeModel {
    /// Build the arena from this round's source declarations and the classpath.
    ///
    /// A source declaration shadows a classpath declaration of the same name.
    pub fn build(sources: Vec<TypeDecl>, classpath: Vec<TypeDecl>) -> Result<Self, ModelError> {
        let mut model = TypeModel::default();
        let mut pending = Vec::new();

        let mut source_names = indexmap::IndexSet::new();
        for decl in &sources {
            if !source_names.insert(decl.name.clone()) {
                return Err(ModelError::DuplicateType { name: decl.name.clone() });
            }
        }
        let mut classpath_names = indexmap::IndexSet::new();
        for decl in classpath {
            if !classpath_names.insert(decl.name.clone()) {
                return Err(ModelError::DuplicateType { name: decl.name.clone() });
            }
            if source_names.contains(&decl.name) {
                debug!(name = %decl.name, "source declaration shadows classpath type");
                continue;
            }
            let id = model.push_type(decl, None, Origin::Classpath, &mut pending)?;
            model.top_level.push(id);
        }
        for decl in sources {
            let id = model.push_type(decl, None, Origin::Source, &mut pending)?;
            model.top_level.push(id);
        }
        // Keep top-level order as declared in the sources, classpath types after them.
        model.top_level.sort_by_key(|id| model.elements[id.0].origin == Origin::Classpath);

        for (id, reference) in pending {
            let resolved = model.resolve_supertype(id, &reference);
            if resolved.is_none() {
                debug!(element = %model.elements[id.0].qualified_name, supertype = %reference.as_str(),
                    "supertype not in model, hierarchy ends here");
            }
            model.elements[id.0].supertype = resolved;
        }
        model.check_acyclic()?;
        Ok(model)
    }

    fn push_type(
        &mut self,
        decl: TypeDecl,
        owner: Option<ElementId>,
        origin: Origin,
        pending: &mut Vec<(ElementId, TypeRef)>,
    ) -> Result<ElementId, ModelError> {
        let (simple_name, qualified_name) = match owner {
            Some(owner) => (
                decl.name.clone(),
                format!("{}.{}", self.elements[owner.0].qualified_name, decl.name),
            ),
            None => (simple_name_of(&decl.name).to_string(), decl.name.clone()),
        };
        if self.types.contains_key(&qualified_name) {
            return Err(ModelError::DuplicateType { name: qualified_name });
        }
        let id = ElementId(self.elements.len());
        let supertype_ref = decl.extends.map(TypeRef::new);
        if let Some(reference) = &supertype_ref {
            pending.push((id, reference.clone()));
        }
        self.elements.push(Element {
            kind: ElementKind::Type,
            simple_name,
            qualified_name: qualified_name.clone(),
            declared_type: None,
            owner,
            supertype: None,
            supertype_ref,
            interfaces: decl.implements.into_iter().map(TypeRef::new).collect(),
            enclosed: Vec::new(),
            markers: decl.markers,
            doc: live_doc(decl.doc, origin),
            origin,
        });
        self.types.insert(qualified_name.clone(), id);

        for member in decl.members {
            let child = match member {
                MemberDecl::Type(nested) => self.push_type(nested, Some(id), origin, pending)?,
                MemberDecl::Field(field) => {
                    let Some(ty) = field.ty else {
                        return Err(ModelError::MissingType {
                            element: format!("{qualified_name}.{}", field.name),
                        });
                    };
                    self.push_member(id, ElementKind::Field, field.name, Some(ty), field.doc, field.markers, origin)
                }
                MemberDecl::Method(method) => self.push_member(
                    id,
                    ElementKind::Method,
                    method.name,
                    Some(method.returns),
                    method.doc,
                    method.markers,
                    origin,
                ),
                MemberDecl::Constructor(ctor) => {
                    let name = self.elements[id.0].simple_name.clone();
                    self.push_member(id, ElementKind::Constructor, name, None, ctor.doc, ctor.markers, origin)
                }
            };
            self.elements[id.0].enclosed.push(child);
        }
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    fn push_member(
        &mut self,
        owner: ElementId,
        kind: ElementKind,
        name: String,
        ty: Option<String>,
        doc: Option<String>,
        markers: Vec<Marker>,
        origin: Origin,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            kind,
            qualified_name: format!("{}.{}", self.elements[owner.0].qualified_name, name),
            simple_name: name,
            declared_type: ty.map(TypeRef::new),
            owner: Some(owner),
            supertype: None,
            supertype_ref: None,
            interfaces: Vec::new(),
            enclosed: Vec::new(),
            markers,
            doc: live_doc(doc, origin),
            origin,
        });
        id
    }

    /// Exact erased name first, then relative to the declaring package.
    fn resolve_supertype(&self, id: ElementId, reference: &TypeRef) -> Option<ElementId> {
        self.resolve_type(id, &erase_expr(reference.as_str()))
    }

    /// Look up a raw type name as written inside `context`: first as is, then relative to
    /// the package of `context`.
    pub fn resolve_type(&self, context: ElementId, name: &str) -> Option<ElementId> {
        if let Some(found) = self.lookup(name) {
            return Some(found);
        }
        let package = self.package_of(context)?;
        self.lookup(&format!("{package}.{name}"))
    }

    /// `ty` with its head name qualified by the package of `context` when only the
    /// package-relative form names a model type. Otherwise `ty` comes back unchanged.
    pub fn qualify(&self, context: ElementId, ty: &TypeRef) -> TypeRef {
        let expr = ty.as_str();
        let head_end = expr.find(['<', '[']).unwrap_or(expr.len());
        let head = expr[..head_end].trim();
        if head.is_empty() || self.lookup(head).is_some() {
            return ty.clone();
        }
        match self.package_of(context) {
            Some(package) if self.lookup(&format!("{package}.{head}")).is_some() => {
                TypeRef::new(format!("{package}.{head}{}", &expr[head_end..]))
            }
            _ => ty.clone(),
        }
    }

    fn check_acyclic(&self) -> Result<(), ModelError> {
        for start in self.types.values().copied() {
            let mut seen = indexmap::IndexSet::new();
            let mut current = Some(start);
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(ModelError::CyclicHierarchy {
                        name: self.elements[start.0].qualified_name.clone(),
                    });
                }
                current = self.elements[id.0].supertype;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<ElementId> {
        self.types.get(qualified_name).copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Every element in arena order (a type precedes its members).
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().enumerate().map(|(i, e)| (ElementId(i), e))
    }

    /// Top-level types: sources in declaration order, then classpath types.
    pub fn top_level_types(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.top_level.iter().map(|id| (*id, &self.elements[id.0]))
    }

    /// The package of the top-level type enclosing `id`, if it has one.
    pub fn package_of(&self, id: ElementId) -> Option<&str> {
        let mut current = id;
        while let Some(owner) = self.elements[current.0].owner {
            current = owner;
        }
        let qualified = &self.elements[current.0].qualified_name;
        qualified.rfind('.').map(|i| &qualified[..i])
    }

    /// Qualified name of the element's owner: the enclosing type for members and nested
    /// types, the package for top-level types.
    pub fn owner_name(&self, id: ElementId) -> Option<&str> {
        let element = &self.elements[id.0];
        match element.owner {
            Some(owner) => Some(self.elements[owner.0].qualified_name.as_str()),
            None => self.package_of(id),
        }
    }
}

fn simple_name_of(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

// Classpath types are already compiled; their documentation is only reachable through
// the description cache.
fn live_doc(doc: Option<String>, origin: Origin) -> Option<String> {
    match origin {
        Origin::Source => doc,
        Origin::Classpath => None,
    }
}

#[cfg(test)]
pub(crate) fn model_from_json(sources: serde_json::Value, classpath: serde_json::Value) -> TypeModel {
    let sources = decl::parse_document(sources).unwrap();
    let classpath = decl::parse_document(classpath).unwrap();
    TypeModel::build(sources, classpath).unwrap()
}
