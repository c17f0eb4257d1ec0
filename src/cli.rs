//! Command line surface: `generate` runs a build round, `inspect` shows what one type yields.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::{Value, json};
use tracing::{Level, debug};

use crate::config::BuildOptions;
use crate::description::{DescriptionCache, FsResourceStore};
use crate::emit::XmlFormat;
use crate::error::{ConfigError, ModelError};
use crate::model::{TypeDecl, TypeModel, decl};
use crate::orchestrate::{Round, RoundReport};
use crate::signature::{Extraction, SignatureNote};
use crate::types::ModelTypes;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile rule and named-object metadata documents from annotated type models
#[derive(Parser, Debug)]
#[command(name = "metagen", version)]
pub struct CommandLineInterface {
    /// log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run one build round and write metadata documents
    Generate(GenerateOut),
    /// print the signature, attributes and description extracted for one type
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /model/types)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one model document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// Model documents compiled in this round. Literal paths or quoted glob patterns.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// Model documents of already compiled types (supertypes from earlier rounds or libraries).
    #[arg(long, num_args = 1..)]
    classpath: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
struct OptionOverrides {
    /// JSON build options file; flags below take precedence over it
    #[arg(long)]
    config: Option<PathBuf>,

    /// output root for rule documents
    #[arg(long)]
    rules_out: Option<PathBuf>,

    /// output root for named-object documents
    #[arg(long)]
    named_objects_out: Option<PathBuf>,

    /// where descriptions are persisted
    #[arg(long)]
    resource_out: Option<PathBuf>,

    /// where descriptions of earlier rounds are read from
    #[arg(long)]
    resource_in: Option<PathBuf>,

    #[arg(long)]
    description_dir: Option<String>,

    /// attribute key linking a rule to its implementing type
    #[arg(long)]
    implementation_attribute: Option<String>,

    /// additional container type (repeatable)
    #[arg(long = "container-type")]
    container_types: Vec<String>,

    #[arg(long)]
    skip_rules: bool,

    #[arg(long)]
    skip_named_objects: bool,

    #[arg(long)]
    skip_descriptions: bool,

    /// stop at the first failed artifact
    #[arg(long)]
    fail_fast: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    overrides: OptionOverrides,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    overrides: OptionOverrides,

    /// qualified name of the type to inspect
    #[arg(long = "type")]
    type_name: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_model(&self) -> Result<TypeModel> {
        let sources = self.load_decls(&self.input).context("failed to load source model documents")?;
        let classpath = self.load_decls(&self.classpath).context("failed to load classpath model documents")?;
        debug!(sources = sources.len(), classpath = classpath.len(), "model documents loaded");
        Ok(TypeModel::build(sources, classpath)?)
    }

    fn load_decls(&self, patterns: &[String]) -> Result<Vec<TypeDecl>> {
        let mut decls = Vec::new();
        for source_path in resolve_file_path_patterns(patterns)? {
            for document in self.load_documents(&source_path)? {
                let parsed = decl::parse_document(document).map_err(|message| ModelError::Parse {
                    path: source_path.clone(),
                    message,
                })?;
                decls.extend(parsed);
            }
        }
        Ok(decls)
    }

    fn load_documents(&self, source_path: &Path) -> Result<Vec<Value>, ModelError> {
        let source = std::fs::read_to_string(source_path).map_err(|source| ModelError::Read {
            path: source_path.to_path_buf(),
            source,
        })?;
        let mut value = serde_json::from_str::<Value>(&source).map_err(|e| ModelError::Parse {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(pointer) = self.json_pointer.as_deref() {
            value = value.pointer(pointer).cloned().ok_or_else(|| ModelError::Filter {
                path: source_path.to_path_buf(),
                message: format!("JSON pointer `{pointer}` selects nothing"),
            })?;
        }
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::run_filter(jq_expr, &value).map_err(|e| ModelError::Filter {
                path: source_path.to_path_buf(),
                message: format!("{e:#}"),
            }),
        }
    }
}

impl OptionOverrides {
    /// Config file (or defaults), then flags, then validation.
    fn resolve(&self) -> Result<BuildOptions, ConfigError> {
        let mut options = match self.config.as_deref() {
            Some(path) => BuildOptions::load(path)?,
            None => BuildOptions::default(),
        };
        if let Some(path) = &self.rules_out {
            options.rules_output = Some(path.clone());
        }
        if let Some(path) = &self.named_objects_out {
            options.named_objects_output = Some(path.clone());
        }
        if let Some(path) = &self.resource_out {
            options.resource_output = path.clone();
        }
        if let Some(path) = &self.resource_in {
            options.resource_input = Some(path.clone());
        }
        if let Some(dir) = &self.description_dir {
            options.description_dir = dir.clone();
        }
        if let Some(key) = &self.implementation_attribute {
            options.implementation_attribute = key.clone();
        }
        options.container_types.extend(self.container_types.iter().cloned());
        options.skip_rules |= self.skip_rules;
        options.skip_named_objects |= self.skip_named_objects;
        options.skip_descriptions |= self.skip_descriptions;
        options.fail_fast |= self.fail_fast;
        options.validate()?;
        Ok(options)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let options = target.overrides.resolve()?;
                let model = target.input_settings.load_model()?;
                let descriptions = description_cache(&options);
                let round = Round {
                    model: &model,
                    options: &options,
                    descriptions: &descriptions,
                    format: &XmlFormat,
                };
                let report = round.run()?;
                print_summary(&report);
                if !report.is_success() {
                    bail!("{} of {} artifacts failed", report.failures.len(), report.failures.len() + report.emitted.len());
                }
                Ok(())
            }
            Command::Inspect(target) => {
                let options = target.overrides.resolve()?;
                let model = target.input_settings.load_model()?;
                let descriptions = description_cache(&options);
                let view = inspect(&model, &options, &descriptions, &target.type_name)?;
                println!("{}", serde_json::to_string_pretty(&view)?);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn description_cache(options: &BuildOptions) -> DescriptionCache {
    DescriptionCache::with_input(
        Box::new(FsResourceStore::new(options.description_output_dir())),
        Box::new(FsResourceStore::new(options.description_input_dir())),
    )
}

fn inspect(model: &TypeModel, options: &BuildOptions, descriptions: &DescriptionCache, type_name: &str) -> Result<Value> {
    let Some(id) = model.lookup(type_name) else {
        bail!("type `{type_name}` is not in the model");
    };
    let types = ModelTypes::with_containers(model, options.container_types.iter().cloned());
    let cx = Extraction { model, types: &types, descriptions };
    let (signature, notes) = crate::signature::build(&cx, id);
    let notes: Vec<String> = notes
        .into_iter()
        .map(|note| match note {
            SignatureNote::ReturnTypeOverwritten { previous, current, element } => {
                format!("`{element}` replaces return type `{previous}` with `{current}`")
            }
        })
        .collect();
    let element = model.get(id);
    Ok(json!({
        "type": element.qualified_name,
        "markers": element.markers.iter().map(|m| m.kind().as_str()).collect::<Vec<_>>(),
        "description": descriptions.read(model, id),
        "attributes": crate::attributes::build(model, id),
        "signature": signature,
        "notes": notes,
    }))
}

fn print_summary(report: &RoundReport) {
    for emission in &report.emitted {
        println!(
            "{} {} {} → {}",
            "✔".green(),
            emission.kind,
            emission.object_name.bold(),
            emission.path.display()
        );
        for warning in &emission.warnings {
            println!("  {} {warning}", "warning:".yellow());
        }
    }
    for failure in &report.failures {
        let what = failure.kind.map(|k| k.to_string()).unwrap_or_else(|| "description".to_string());
        eprintln!("{} {what} for {}: {}", "✘".red(), failure.element.bold(), failure.error);
    }
    let tally = format!(
        "{} written, {} failed, {} descriptions saved",
        report.emitted.len(),
        report.failures.len(),
        report.descriptions_saved
    );
    if report.is_success() {
        println!("{}", tally.green());
    } else {
        eprintln!("{}", tally.red());
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: Value) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, value.to_string()).unwrap();
        path.to_string_lossy().to_string()
    }

    fn settings(input: Vec<String>) -> InputSettings {
        InputSettings { json_pointer: None, jq_expr: None, input, classpath: Vec::new() }
    }

    #[test]
    fn parses_generate_with_overrides() {
        let cli = CommandLineInterface::try_parse_from([
            "metagen", "-v", "generate", "-i", "model.json", "--classpath", "lib.json",
            "--container-type", "com.acme.Bag", "--fail-fast",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);
        let Command::Generate(target) = &cli.cmd else {
            panic!("expected generate");
        };
        assert_eq!(target.input_settings.classpath, ["lib.json"]);
        let options = target.overrides.resolve().unwrap();
        assert!(options.fail_fast);
        assert_eq!(options.container_types, ["com.acme.Bag"]);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("metagen.json");
        std::fs::write(&config, r#"{"rulesOutput": "from-file", "skipRules": true}"#).unwrap();
        let overrides = OptionOverrides {
            config: Some(config),
            rules_out: Some("from-flag".into()),
            ..OptionOverrides::default()
        };
        let options = overrides.resolve().unwrap();
        assert_eq!(options.rules_output, Some(PathBuf::from("from-flag")));
        assert!(options.skip_rules);

        let bad = OptionOverrides { implementation_attribute: Some("no good".into()), ..OptionOverrides::default() };
        assert!(matches!(bad.resolve(), Err(ConfigError::InvalidOption { .. })));
    }

    #[test]
    fn glob_inputs_and_filters() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", json!({"dump": {"types": [{"name": "p.A"}]}}));
        write(&dir, "b.json", json!({"dump": {"types": [{"name": "p.B"}]}}));
        let pattern = dir.path().join("*.json").to_string_lossy().to_string();

        let mut input = settings(vec![pattern.clone()]);
        input.json_pointer = Some("/dump".into());
        let model = input.load_model().unwrap();
        assert!(model.lookup("p.A").is_some() && model.lookup("p.B").is_some());

        let mut input = settings(vec![pattern]);
        input.jq_expr = Some(".dump.types[]".into());
        assert_eq!(input.load_model().unwrap().top_level_types().count(), 2);
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.json", json!({"name": "p.A", "members": [{"kind": "field", "name": 3}]}));
        let err = settings(vec![path]).load_model().unwrap_err();
        let model_error = err.downcast_ref::<ModelError>().unwrap();
        assert!(matches!(model_error, ModelError::Parse { path, .. } if path.ends_with("bad.json")));

        let missing = dir.path().join("nothing-*.json").to_string_lossy().to_string();
        assert!(settings(vec![missing]).load_model().is_err());
    }

    #[test]
    fn inspect_reports_extraction_results() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "model.json",
            json!({"name": "p.Rule", "doc": "Does things.", "markers": [{"kind": "rule"}], "members": [
                {"kind": "field", "name": "items", "type": "java.util.List<p.Item>",
                 "markers": [{"kind": "argument"}, {"kind": "attribute", "value": "x"}]}
            ]}),
        );
        let model = settings(vec![path]).load_model().unwrap();
        let options = BuildOptions { resource_output: dir.path().join("res"), ..BuildOptions::default() };
        let view = inspect(&model, &options, &description_cache(&options), "p.Rule").unwrap();
        assert_eq!(view["description"], "Does things.");
        assert_eq!(view["markers"], json!(["rule"]));
        assert_eq!(view["attributes"]["items"], "x");
        assert_eq!(view["signature"]["arguments"][0]["type"], "p.Item");
        assert_eq!(view["signature"]["arguments"][0]["multiValued"], true);

        assert!(inspect(&model, &options, &description_cache(&options), "p.Missing").is_err());
    }
}
