//! Conversion of a source workflow tree into a declarative job graph.
//!
//! The walk is single-threaded and keeps all of its state in a
//! [`Converter`] owned by one [`convert`] call, so concurrent conversions
//! never share anything.

mod context;
mod pipeline;
mod variables;
mod walker;

use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::source::SourceWorkflow;
use crate::workflow::Workflow;

pub use pipeline::{flatten_pipeline, ConvertedNode};
pub use variables::{parse_value, partition, Partitioned};

/// Outcome of a conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversion {
    pub workflow: Workflow,

    /// Non-fatal findings: naming collisions, dangling references, leniently
    /// resolved joins
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Converts `source` into its declarative form.
///
/// The root tree is walked first, then joins are resolved. With
/// `full_export`, applications and environments are exported as variables,
/// secrets, repositories and deployments, and jobs receive the matching
/// context references.
///
/// # Errors
///
/// Returns `UnresolvedJoinParent` when joins are strict and a join parent
/// was never converted.
pub fn convert(source: &SourceWorkflow, options: &ConvertConfig) -> Result<Conversion> {
    let mut converter = Converter::new(source, options);

    if options.full_export {
        converter.export_scopes();
    }
    converter.walk(&source.root, &[], None);
    converter.resolve_joins()?;

    let conversion = converter.finish();
    info!(
        "Converted workflow {:?}: {} jobs, {} warnings",
        source.name,
        conversion.workflow.jobs.len(),
        conversion.warnings.len()
    );
    Ok(conversion)
}

/// State of one conversion pass.
pub(crate) struct Converter<'a> {
    source: &'a SourceWorkflow,
    options: &'a ConvertConfig,
    workflow: Workflow,
    /// End job names of every converted pipeline node, by node ID
    converted: HashMap<i64, Vec<String>>,
    warnings: Vec<String>,
}

impl<'a> Converter<'a> {
    fn new(source: &'a SourceWorkflow, options: &'a ConvertConfig) -> Self {
        let workflow = Workflow {
            name: (!source.name.is_empty()).then(|| source.name.clone()),
            ..Workflow::default()
        };
        Self {
            source,
            options,
            workflow,
            converted: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    fn finish(self) -> Conversion {
        Conversion {
            workflow: self.workflow,
            warnings: self.warnings,
        }
    }
}
