//! Error types for each pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid or unreadable build options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid build option `{option}`: {message}")]
    InvalidOption { option: &'static str, message: String },

    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl ConfigError {
    pub fn invalid(option: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOption { option, message: message.into() }
    }
}

/// Failures while loading model documents or building the type arena.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model document {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    /// Malformed document; `message` carries the JSON path of the offending value.
    #[error("malformed model document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("pre-processing of {path} failed: {message}")]
    Filter { path: PathBuf, message: String },

    #[error("type `{name}` is declared more than once")]
    DuplicateType { name: String },

    #[error("supertype chain of `{name}` is cyclic")]
    CyclicHierarchy { name: String },

    #[error("field `{element}` has no declared type")]
    MissingType { element: String },
}

/// A description could not be persisted to the resource store.
#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("failed to persist description of `{element}` to {key}: {source}")]
    Persist {
        element: String,
        key: String,
        source: std::io::Error,
    },
}

/// Document serialization and parsing failures.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("failed to parse document: {0}")]
    Parse(String),

    /// Well-formed XML that does not have the expected artifact shape.
    #[error("unexpected document shape: {0}")]
    Shape(String),
}

/// Failure to produce one artifact. Always names the offending object.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("cannot use `{object}` (from `{element}`) as an artifact name")]
    InvalidObjectName { object: String, element: String },

    #[error("failed to write artifact `{object}` to {path}: {source}")]
    Write {
        object: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render artifact `{object}`: {source}")]
    Render {
        object: String,
        source: DocumentError,
    },

    #[error(transparent)]
    Description(#[from] DescriptionError),
}
