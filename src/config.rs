//! Build options for one round.
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::emit::DEFAULT_IMPLEMENTATION_ATTRIBUTE;
use crate::error::ConfigError;

pub const DEFAULT_OUTPUT_ROOT: &str = "target/metadata";
pub const DEFAULT_RESOURCE_ROOT: &str = "target/generated-resources";
pub const DEFAULT_DESCRIPTION_DIR: &str = "descriptions";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").unwrap());
static QUALIFIED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap());
static PATH_COMPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// Output root for rule documents.
    pub rules_output: Option<PathBuf>,
    /// Output root for named-object documents (the namespace folder goes below it).
    pub named_objects_output: Option<PathBuf>,
    /// Where descriptions are persisted for later rounds.
    pub resource_output: PathBuf,
    /// Where earlier rounds' descriptions are read from. Defaults to `resource_output`.
    pub resource_input: Option<PathBuf>,
    /// Directory below the resource roots holding the description cache.
    pub description_dir: String,
    /// Attribute key linking a rule back to its implementing type.
    pub implementation_attribute: String,
    /// Additional qualified names treated as containers.
    pub container_types: Vec<String>,
    pub skip_rules: bool,
    pub skip_named_objects: bool,
    pub skip_descriptions: bool,
    /// Stop the round at the first failed artifact instead of collecting failures.
    pub fail_fast: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            rules_output: None,
            named_objects_output: None,
            resource_output: PathBuf::from(DEFAULT_RESOURCE_ROOT),
            resource_input: None,
            description_dir: DEFAULT_DESCRIPTION_DIR.to_string(),
            implementation_attribute: DEFAULT_IMPLEMENTATION_ATTRIBUTE.to_string(),
            container_types: Vec::new(),
            skip_rules: false,
            skip_named_objects: false,
            skip_descriptions: false,
            fail_fast: false,
        }
    }
}

impl BuildOptions {
    /// Load options from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        crate::path_de::from_str_with_path(&source).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Reject options that would only fail later, halfway through a round.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_path("rulesOutput", self.rules_output.as_deref())?;
        check_path("namedObjectsOutput", self.named_objects_output.as_deref())?;
        check_path("resourceOutput", Some(&self.resource_output))?;
        check_path("resourceInput", self.resource_input.as_deref())?;
        if !PATH_COMPONENT.is_match(&self.description_dir) {
            return Err(ConfigError::invalid(
                "descriptionDir",
                format!("`{}` is not a single plain directory name", self.description_dir),
            ));
        }
        if !IDENTIFIER.is_match(&self.implementation_attribute) {
            return Err(ConfigError::invalid(
                "implementationAttribute",
                format!("`{}` is not a valid attribute key", self.implementation_attribute),
            ));
        }
        if let Some(bad) = self.container_types.iter().find(|t| !QUALIFIED_NAME.is_match(t)) {
            return Err(ConfigError::invalid(
                "containerTypes",
                format!("`{bad}` is not a qualified type name"),
            ));
        }
        Ok(())
    }

    pub fn rules_root(&self) -> PathBuf {
        self.rules_output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT))
    }

    pub fn named_objects_root(&self) -> PathBuf {
        self.named_objects_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT))
    }

    pub fn description_output_dir(&self) -> PathBuf {
        self.resource_output.join(&self.description_dir)
    }

    pub fn description_input_dir(&self) -> PathBuf {
        self.resource_input
            .as_ref()
            .unwrap_or(&self.resource_output)
            .join(&self.description_dir)
    }
}

fn check_path(option: &'static str, path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(p) if p.as_os_str().is_empty() => Err(ConfigError::invalid(option, "path must not be empty")),
        _ => Ok(()),
    }
}
