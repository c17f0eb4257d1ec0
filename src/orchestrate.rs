//! One build round: persist descriptions, then emit an artifact per marked top-level type.
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::config::BuildOptions;
use crate::description::DescriptionCache;
use crate::emit::{self, ArtifactKind, DocumentFormat, Emission, Emitter};
use crate::error::EmitError;
use crate::model::{Marker, MarkerKind, Origin, TypeModel};
use crate::signature::Extraction;
use crate::types::ModelTypes;

pub struct Round<'a> {
    pub model: &'a TypeModel,
    pub options: &'a BuildOptions,
    pub descriptions: &'a DescriptionCache,
    pub format: &'a dyn DocumentFormat,
}

/// One element that could not be processed.
#[derive(Debug)]
pub struct Failure {
    pub element: String,
    /// `None` when the failure happened while saving descriptions.
    pub kind: Option<ArtifactKind>,
    pub error: EmitError,
}

#[derive(Debug, Default)]
pub struct RoundReport {
    pub descriptions_saved: usize,
    pub emitted: Vec<Emission>,
    pub failures: Vec<Failure>,
}

impl RoundReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Returned instead of a report when `fail_fast` is set and something failed.
#[derive(Debug, Error)]
#[error("build round halted at `{element}`: {source}")]
pub struct RoundHalted {
    pub element: String,
    pub source: EmitError,
}

impl Round<'_> {
    pub fn run(&self) -> Result<RoundReport, RoundHalted> {
        let _span = info_span!("round", types = self.model.top_level_types().count()).entered();
        let mut report = RoundReport::default();

        if self.options.skip_descriptions {
            debug!("description cache updates skipped");
        } else {
            self.save_descriptions(&mut report)?;
        }

        let types = ModelTypes::with_containers(self.model, self.options.container_types.iter().cloned());
        let emitter = Emitter {
            extraction: Extraction {
                model: self.model,
                types: &types,
                descriptions: self.descriptions,
            },
            format: self.format,
            implementation_attribute: &self.options.implementation_attribute,
        };
        let rules_root = self.options.rules_root();
        let named_root = self.options.named_objects_root();

        let discovered = self
            .model
            .top_level_types()
            .filter(|(_, element)| element.origin == Origin::Source);
        for (id, element) in discovered {
            if let Some(Marker::Rule(marker)) = element.marker(MarkerKind::Rule) {
                if self.options.skip_rules {
                    debug!(element = %element.qualified_name, "rule skipped");
                } else {
                    let result = emit::rule::emit(&emitter, id, marker, &rules_root);
                    self.record(&mut report, &element.qualified_name, ArtifactKind::Rule, result)?;
                }
            }
            if let Some(Marker::NamedObject(marker)) = element.marker(MarkerKind::NamedObject) {
                if self.options.skip_named_objects {
                    debug!(element = %element.qualified_name, "named object skipped");
                } else {
                    let result = emit::named::emit(&emitter, id, marker, &named_root);
                    self.record(&mut report, &element.qualified_name, ArtifactKind::NamedObject, result)?;
                }
            }
        }

        info!(
            emitted = report.emitted.len(),
            failed = report.failures.len(),
            descriptions = report.descriptions_saved,
            "round finished"
        );
        Ok(report)
    }

    fn save_descriptions(&self, report: &mut RoundReport) -> Result<(), RoundHalted> {
        let marked = self
            .model
            .elements()
            .filter(|(_, e)| e.origin == Origin::Source && !e.markers.is_empty());
        for (id, element) in marked {
            match self.descriptions.save(self.model, id) {
                Ok(true) => report.descriptions_saved += 1,
                Ok(false) => {}
                Err(e) => self.fail(report, &element.qualified_name, None, e.into())?,
            }
        }
        Ok(())
    }

    fn record(
        &self,
        report: &mut RoundReport,
        element: &str,
        kind: ArtifactKind,
        result: Result<Emission, EmitError>,
    ) -> Result<(), RoundHalted> {
        match result {
            Ok(emission) => {
                report.emitted.push(emission);
                Ok(())
            }
            Err(error) => self.fail(report, element, Some(kind), error),
        }
    }

    fn fail(
        &self,
        report: &mut RoundReport,
        element: &str,
        kind: Option<ArtifactKind>,
        error: EmitError,
    ) -> Result<(), RoundHalted> {
        if self.options.fail_fast {
            return Err(RoundHalted { element: element.to_string(), source: error });
        }
        warn!(element = %element, error = %error, "artifact failed, continuing round");
        report.failures.push(Failure { element: element.to_string(), kind, error });
        Ok(())
    }
}
