use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::action::Requirement;
use super::condition::Condition;
use super::step::Step;

/// One schedulable unit of the declarative workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Only serialized for disabled jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A pointer from a job to shared data, resolved by the execution engine.
///
/// Serialized as `var.<name>`, `secret.<name>` or `repository.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContextRef {
    Var(String),
    Secret(String),
    Repository(String),
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextRef::Var(name) => write!(f, "var.{name}"),
            ContextRef::Secret(name) => write!(f, "secret.{name}"),
            ContextRef::Repository(name) => write!(f, "repository.{name}"),
        }
    }
}

impl FromStr for ContextRef {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (kind, name) = raw
            .split_once('.')
            .ok_or_else(|| format!("invalid context reference {raw:?}"))?;
        if name.is_empty() {
            return Err(format!("context reference {raw:?} has no name"));
        }
        match kind {
            "var" => Ok(ContextRef::Var(name.to_string())),
            "secret" => Ok(ContextRef::Secret(name.to_string())),
            "repository" => Ok(ContextRef::Repository(name.to_string())),
            _ => Err(format!("unknown context kind {kind:?} in {raw:?}")),
        }
    }
}

impl TryFrom<String> for ContextRef {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<ContextRef> for String {
    fn from(reference: ContextRef) -> Self {
        reference.to_string()
    }
}
