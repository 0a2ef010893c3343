//! The declarative workflow document produced by the converter.
//!
//! Every map is keyed by a slugged name and ordered, so serializing the same
//! document twice yields identical bytes.

mod action;
mod condition;
mod graph;
mod job;
mod step;
mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use action::{Action, ActionParameter, Requirement, ServiceRequirement};
pub use condition::{merge as merge_conditions, Check, Condition, ScriptMerge};
pub use graph::{compute_layers, GraphNode, Layers};
pub use job::{ContextRef, Job};
pub use step::{BuiltinStep, Step, StepAction};
pub use validate::{ValidationFailure, ValidationReport};

/// Prefix flagging a reference as resolved outside the document.
pub const EXTERNAL_MARKER: char = '@';

/// Splits the external-scope marker off `name`.
///
/// Returns the bare name and whether the marker was present.
pub fn strip_external_marker(name: &str) -> (&str, bool) {
    match name.strip_prefix(EXTERNAL_MARKER) {
        Some(bare) => (bare, true),
        None => (name, false),
    }
}

/// Adds the external-scope marker to `name`.
pub fn external(name: &str) -> String {
    format!("{EXTERNAL_MARKER}{name}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stages: BTreeMap<String, Stage>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub jobs: BTreeMap<String, Job>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, VariableSet>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, Secret>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repositories: BTreeMap<String, Repository>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deployments: BTreeMap<String, Deployment>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, Action>,
}

impl Workflow {
    /// Jobs as a dependency graph.
    pub fn job_graph(&self) -> Vec<GraphNode> {
        self.jobs
            .iter()
            .map(|(name, job)| GraphNode {
                name: name.clone(),
                depends_on: job.depends_on.clone(),
            })
            .collect()
    }

    /// Stages as a dependency graph.
    pub fn stage_graph(&self) -> Vec<GraphNode> {
        self.stages
            .iter()
            .map(|(name, stage)| GraphNode {
                name: name.clone(),
                depends_on: stage.depends_on.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Condition>,
}

/// Plain variables of one scope, keyed by variable name.
pub type VariableSet = BTreeMap<String, VariableValue>;

/// A plain variable, typed at conversion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

/// An opaque secret value, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(pub String);

/// Source-control binding of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssh_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connection: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub integration: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, DeploymentConfigValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfigValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// References the validator found outside the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDependencies {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<String>,
}

impl ExternalDependencies {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.deployments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_external_marker() {
        assert_eq!(strip_external_marker("@shared-build"), ("shared-build", true));
        assert_eq!(strip_external_marker("local"), ("local", false));
        assert_eq!(external("k8s"), "@k8s");
    }

    #[test]
    fn test_variable_values_keep_their_types() {
        let yaml = "flag: true\nreplicas: 3.0\nname: web\n";
        let set: VariableSet = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(set["flag"], VariableValue::Boolean(true));
        assert_eq!(set["replicas"], VariableValue::Number(3.0));
        assert_eq!(set["name"], VariableValue::Text("web".to_string()));
    }

    #[test]
    fn test_empty_workflow_serializes_to_empty_object() {
        let json = serde_json::to_string(&Workflow::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_document_keys() {
        let mut workflow = Workflow::default();
        workflow.jobs.insert("build".into(), Job::default());
        workflow.secrets.insert("app-web-token".into(), Secret("s3cr3t".into()));
        workflow.deployments.insert(
            "web-k8s".into(),
            Deployment {
                integration: external("k8s"),
                config: BTreeMap::new(),
            },
        );

        let json = serde_json::to_value(&workflow).unwrap();

        assert!(json.get("jobs").is_some());
        assert_eq!(json["secrets"]["app-web-token"], "s3cr3t");
        assert_eq!(json["deployments"]["web-k8s"]["integration"], "@k8s");
        assert!(json.get("variables").is_none());
    }
}
