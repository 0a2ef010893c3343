//! In-memory source workflow, as supplied by the caller.
//!
//! The graph is read-only for the converter. Numeric IDs key every shared
//! entity (pipelines, applications, environments, integrations).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::workflow::{Requirement, Step};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceWorkflow {
    #[serde(default)]
    pub name: String,

    /// Root of the node tree
    pub root: Node,

    /// Join nodes, outside the tree, resolved in a second pass
    #[serde(default)]
    pub joins: Vec<Node>,

    #[serde(default)]
    pub pipelines: HashMap<i64, Pipeline>,

    #[serde(default)]
    pub applications: HashMap<i64, Application>,

    #[serde(default)]
    pub environments: HashMap<i64, Environment>,

    #[serde(default)]
    pub project_integrations: HashMap<i64, ProjectIntegration>,
}

impl SourceWorkflow {
    /// Finds a node anywhere in the tree or among the joins.
    pub fn node_by_id(&self, id: i64) -> Option<&Node> {
        std::iter::once(&self.root)
            .chain(self.joins.iter())
            .find_map(|n| n.find(id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Pipeline,
    Fork,
    Join,
    OutgoingHook,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,

    #[serde(rename = "type", default)]
    pub node_type: NodeType,

    #[serde(default)]
    pub name: String,

    /// Child nodes, in declaration order
    #[serde(default)]
    pub triggers: Vec<Node>,

    /// Parents of a join node
    #[serde(default)]
    pub join_context: Vec<JoinParent>,

    #[serde(default)]
    pub context: NodeContext,
}

impl Node {
    fn find(&self, id: i64) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.triggers.iter().find_map(|t| t.find(id))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JoinParent {
    pub parent_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeContext {
    #[serde(default)]
    pub pipeline_id: Option<i64>,

    #[serde(default)]
    pub application_id: Option<i64>,

    #[serde(default)]
    pub environment_id: Option<i64>,

    #[serde(default)]
    pub environment_name: Option<String>,

    #[serde(default)]
    pub project_integration_id: Option<i64>,

    #[serde(default)]
    pub conditions: NodeConditions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConditions {
    #[serde(default)]
    pub script: Option<String>,

    #[serde(default)]
    pub plain: Vec<PlainCondition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlainCondition {
    pub variable: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,

    /// Actions of the stage; they run in parallel
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A leaf action of a pipeline stage. Its steps are already in their
/// declarative form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_enabled() -> bool {
    true
}

/// Declared kind of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    String,
    Text,
    Number,
    Boolean,
    /// Secret, never exported as a plain variable
    Password,
    Key,
    Repository,
    List,
    /// Any kind not listed above (`ssh`, `pgp`, ...), kept as raw text
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: VariableKind,

    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    pub name: String,

    #[serde(default)]
    pub variables: Vec<Variable>,

    #[serde(default)]
    pub repository_fullname: String,

    #[serde(default)]
    pub vcs_server: String,

    #[serde(default)]
    pub repository_strategy: RepositoryStrategy,

    /// Deployment settings, keyed by integration name
    #[serde(default)]
    pub deployment_strategies: HashMap<String, HashMap<String, TypedValue>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryStrategy {
    /// Empty when the application has no source-control connection
    #[serde(default)]
    pub connection_type: String,

    #[serde(default)]
    pub ssh_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypedValue {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,

    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectIntegration {
    pub name: String,
}

/// A historical run of a source workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRun {
    #[serde(default)]
    pub number: i64,

    #[serde(default)]
    pub status: String,

    pub workflow: SourceWorkflow,

    /// Executions of each node, keyed by node ID
    #[serde(default)]
    pub node_runs: HashMap<i64, Vec<NodeRun>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRun {
    pub workflow_node_id: i64,

    #[serde(default)]
    pub sub_number: i64,

    #[serde(default)]
    pub stages: Vec<StageRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageRun {
    pub name: String,

    #[serde(default)]
    pub run_jobs: Vec<RunJob>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunJob {
    pub status: String,
    pub action_id: i64,
    pub action_name: String,
}
