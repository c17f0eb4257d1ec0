use std::path::Path;

use super::{ArtifactKind, Emission, Emitter, NAMED_OBJECT_NAMESPACE, check_object_name, write_artifact};
use crate::attributes;
use crate::emit::document::{Artifact, NamedObjectDocument};
use crate::error::EmitError;
use crate::model::ElementId;
use crate::model::marker::NamedObjectMarker;

pub fn assemble(
    emitter: &Emitter<'_>,
    id: ElementId,
    marker: &NamedObjectMarker,
) -> Result<NamedObjectDocument, EmitError> {
    let cx = &emitter.extraction;
    let element = cx.model.get(id);
    let name = marker.value_override().unwrap_or(element.simple_name.as_str()).to_string();
    check_object_name(&name, &element.qualified_name)?;
    Ok(NamedObjectDocument {
        name,
        description: cx.descriptions.read(cx.model, id),
        attributes: attributes::build(cx.model, id),
    })
}

/// Assemble and write to `output_root/named-objects/<name>.xml`.
pub fn emit(
    emitter: &Emitter<'_>,
    id: ElementId,
    marker: &NamedObjectMarker,
    output_root: &Path,
) -> Result<Emission, EmitError> {
    let document = assemble(emitter, id, marker)?;
    let object_name = document.name.clone();
    let dir = output_root.join(NAMED_OBJECT_NAMESPACE);
    let path = write_artifact(emitter.format, &Artifact::NamedObject(document), &dir)?;
    Ok(Emission {
        kind: ArtifactKind::NamedObject,
        object_name,
        path,
        warnings: Vec::new(),
    })
}
