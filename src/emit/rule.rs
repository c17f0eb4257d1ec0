use std::path::Path;

use tracing::warn;

use super::{ArtifactKind, Emission, Emitter, LANGUAGE, Warning, check_object_name, write_artifact};
use crate::attributes::{self, AttributeValue};
use crate::emit::document::{Artifact, RuleDocument};
use crate::error::EmitError;
use crate::model::ElementId;
use crate::model::marker::RuleMarker;
use crate::signature;

/// Assemble the rule document for `id` without writing it.
pub fn assemble(
    emitter: &Emitter<'_>,
    id: ElementId,
    marker: &RuleMarker,
) -> Result<(RuleDocument, Vec<Warning>), EmitError> {
    let cx = &emitter.extraction;
    let element = cx.model.get(id);
    let name = marker.value_override().unwrap_or(element.simple_name.as_str()).to_string();
    check_object_name(&name, &element.qualified_name)?;

    let mut warnings = Vec::new();
    let types = &marker.types.0;
    if types.len() > 1 {
        let warning = Warning::AmbiguousRuleType {
            object: name.clone(),
            kept: types[0].clone(),
            discarded: types[1..].to_vec(),
        };
        warn!(element = %element.qualified_name, "{warning}");
        warnings.push(warning);
    }

    let mut attributes = attributes::build(cx.model, id);
    attributes.insert(
        emitter.implementation_attribute.to_string(),
        AttributeValue::Single(element.qualified_name.clone()),
    );

    let (signature, notes) = signature::build(cx, id);
    warnings.extend(notes.into_iter().map(|note| Warning::from_signature_note(&name, note)));

    let document = RuleDocument {
        name,
        rule_type: marker.types.first().map(str::to_string),
        language: LANGUAGE.to_string(),
        description: cx.descriptions.read(cx.model, id),
        attributes,
        signature,
    };
    Ok((document, warnings))
}

/// Assemble and write the rule document to `output_dir/<name>.xml`.
pub fn emit(
    emitter: &Emitter<'_>,
    id: ElementId,
    marker: &RuleMarker,
    output_dir: &Path,
) -> Result<Emission, EmitError> {
    let (document, warnings) = assemble(emitter, id, marker)?;
    let object_name = document.name.clone();
    let path = write_artifact(emitter.format, &Artifact::Rule(document), output_dir)?;
    Ok(Emission {
        kind: ArtifactKind::Rule,
        object_name,
        path,
        warnings,
    })
}
