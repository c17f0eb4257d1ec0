//! Per-element documentation that survives across build rounds.
//!
//! Live documentation is only present for elements compiled in the current round. Whatever
//! was seen in an earlier round is persisted under a resource key derived from the element's
//! owner, simple name and kind, and read back when the live text is gone.
use std::io;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::DescriptionError;
use crate::model::{ElementId, ElementKind, TypeModel};

/// Storage for description resources. Keys are `/`-separated relative paths.
pub trait ResourceStore {
    /// `Ok(None)` when no resource exists under `key`.
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, contents: &str) -> io::Result<()>;
    /// Where this store keeps its resources, for log output and store comparison.
    fn location(&self) -> String;
}

/// Resources as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsResourceStore {
    root: PathBuf,
}

impl FsResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys with a segment that could leave the root are refused.
    fn path_of(&self, key: &str) -> io::Result<PathBuf> {
        if !key.split('/').all(is_plain_segment) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("resource key `{key}` escapes the store root"),
            ));
        }
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }
}

impl ResourceStore for FsResourceStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_of(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        let path = self.path_of(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

pub struct DescriptionCache {
    output: Box<dyn ResourceStore>,
    input: Option<Box<dyn ResourceStore>>,
}

impl DescriptionCache {
    /// A cache reading back from where it writes.
    pub fn new(output: Box<dyn ResourceStore>) -> Self {
        Self { output, input: None }
    }

    /// A cache whose earlier-round resources live in a separate input location.
    pub fn with_input(output: Box<dyn ResourceStore>, input: Box<dyn ResourceStore>) -> Self {
        if input.location() == output.location() {
            return Self::new(output);
        }
        Self { output, input: Some(input) }
    }

    /// Persist the element's live documentation. Returns whether anything was written.
    ///
    /// A no-op for elements without a usable key or without non-blank documentation.
    pub fn save(&self, model: &TypeModel, id: ElementId) -> Result<bool, DescriptionError> {
        let Some(key) = resource_key(model, id) else {
            return Ok(false);
        };
        let element = model.get(id);
        let Some(text) = live_text(element.doc.as_deref()) else {
            return Ok(false);
        };
        self.output.write(&key, text).map_err(|source| DescriptionError::Persist {
            element: element.qualified_name.clone(),
            key: key.clone(),
            source,
        })?;
        debug!(element = %element.qualified_name, key = %key, "description saved");
        Ok(true)
    }

    /// Live documentation if present, else the persisted text. Never fails: any lookup
    /// problem reads as "no description".
    pub fn read(&self, model: &TypeModel, id: ElementId) -> Option<String> {
        let element = model.get(id);
        if let Some(text) = live_text(element.doc.as_deref()) {
            return Some(text.to_string());
        }
        let key = resource_key(model, id)?;
        let stores = self.input.iter().chain(std::iter::once(&self.output));
        for store in stores {
            match store.read(&key) {
                Ok(Some(contents)) => {
                    if let Some(text) = live_text(Some(&contents)) {
                        trace!(element = %element.qualified_name, store = %store.location(), "description read from cache");
                        return Some(text.to_string());
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(element = %element.qualified_name, store = %store.location(), error = %e,
                        "description lookup failed, treating as absent");
                }
            }
        }
        None
    }
}

/// `{owner}/{simple}.{kind}.txt`; `None` for unsupported kinds, unnamed elements and names
/// that are not a plain path segment.
pub fn resource_key(model: &TypeModel, id: ElementId) -> Option<String> {
    let element = model.get(id);
    let kind = match element.kind {
        ElementKind::Type | ElementKind::Field | ElementKind::Method => element.kind.as_str(),
        ElementKind::Constructor => return None,
    };
    let simple = element.simple_name.trim();
    if simple.is_empty() {
        return None;
    }
    if !is_plain_segment(simple) {
        debug!(element = %element.qualified_name, "name is not a plain path segment, no description key");
        return None;
    }
    let file = format!("{simple}.{kind}.txt");
    match model.owner_name(id).filter(|owner| !owner.is_empty()) {
        Some(owner) if is_plain_segment(owner) => Some(format!("{owner}/{file}")),
        Some(owner) => {
            debug!(element = %element.qualified_name, owner = %owner, "owner is not a plain path segment, no description key");
            None
        }
        None => Some(file),
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
        && !segment.chars().any(char::is_control)
}

fn live_text(doc: Option<&str>) -> Option<&str> {
    doc.map(str::trim).filter(|s| !s.is_empty())
}
