//! Artifact emitters: assemble a document per marked type and write it out.
pub mod document;
pub mod named;
pub mod rule;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::EmitError;
use crate::signature::{Extraction, SignatureNote};

pub use document::{Artifact, DocumentFormat, NamedObjectDocument, RuleDocument, XmlFormat};

/// Implementation language recorded on every rule.
pub const LANGUAGE: &str = "java";

/// Sub-folder of the named-object output root that holds named-object documents.
pub const NAMED_OBJECT_NAMESPACE: &str = "named-objects";

pub const DEFAULT_IMPLEMENTATION_ATTRIBUTE: &str = "implementation";

/// Shared inputs of both emitters.
pub struct Emitter<'a> {
    pub extraction: Extraction<'a>,
    pub format: &'a dyn DocumentFormat,
    /// Attribute key carrying the implementing type's qualified name.
    pub implementation_attribute: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Rule,
    NamedObject,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Rule => f.write_str("rule"),
            ArtifactKind::NamedObject => f.write_str("named object"),
        }
    }
}

/// A non-fatal problem found while assembling an artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A rule marker declared several type values; only `kept` is used.
    AmbiguousRuleType { object: String, kept: String, discarded: Vec<String> },
    ReturnTypeOverwritten { object: String, element: String, previous: String, current: String },
}

impl Warning {
    fn from_signature_note(object: &str, note: SignatureNote) -> Self {
        match note {
            SignatureNote::ReturnTypeOverwritten { previous, current, element } => Warning::ReturnTypeOverwritten {
                object: object.to_string(),
                element,
                previous,
                current,
            },
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AmbiguousRuleType { object, kept, discarded } => write!(
                f,
                "rule `{object}` declares several types; using `{kept}`, ignoring {}",
                discarded.join(", ")
            ),
            Warning::ReturnTypeOverwritten { object, element, previous, current } => write!(
                f,
                "rule `{object}`: `{element}` replaces return type `{previous}` with `{current}`"
            ),
        }
    }
}

/// A written artifact.
#[derive(Debug, Clone)]
pub struct Emission {
    pub kind: ArtifactKind,
    pub object_name: String,
    pub path: PathBuf,
    pub warnings: Vec<Warning>,
}

/// Object names become file names, so they must be a single plain path component.
fn check_object_name(object: &str, element: &str) -> Result<(), EmitError> {
    let bad = object.is_empty()
        || object == "."
        || object == ".."
        || object.contains(['/', '\\'])
        || object.chars().any(char::is_control);
    if bad {
        return Err(EmitError::InvalidObjectName {
            object: object.to_string(),
            element: element.to_string(),
        });
    }
    Ok(())
}

/// Render `artifact` and write it to `dir/<name>.<ext>`, replacing any existing file.
///
/// The document is written to a temporary file in `dir` and then moved into place, so a
/// failed write never leaves a truncated document behind.
fn write_artifact(format: &dyn DocumentFormat, artifact: &Artifact, dir: &Path) -> Result<PathBuf, EmitError> {
    let object = artifact.name();
    let text = format.to_document(artifact).map_err(|source| EmitError::Render {
        object: object.to_string(),
        source,
    })?;
    let path = dir.join(format!("{object}.{}", format.extension()));
    let write_error = |source| EmitError::Write {
        object: object.to_string(),
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_error)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(text.as_bytes()).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(&path).map_err(|e| write_error(e.error))?;

    info!(object = %object, path = %path.display(), "artifact written");
    Ok(path)
}
