use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JobGraphError, Result};

/// Key of the script step variant.
pub const SCRIPT_KEY: &str = "script";

/// Key of the deploy step variant.
pub const DEPLOY_KEY: &str = "deploy";

/// Step kinds understood natively by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinStep {
    Coverage,
    ArtifactDownload,
    ArtifactUpload,
    ServeStaticFiles,
    GitClone,
    GitTag,
    ReleaseVcs,
    JUnitReport,
    Checkout,
    InstallKey,
}

impl BuiltinStep {
    pub const ALL: [BuiltinStep; 10] = [
        BuiltinStep::Coverage,
        BuiltinStep::ArtifactDownload,
        BuiltinStep::ArtifactUpload,
        BuiltinStep::ServeStaticFiles,
        BuiltinStep::GitClone,
        BuiltinStep::GitTag,
        BuiltinStep::ReleaseVcs,
        BuiltinStep::JUnitReport,
        BuiltinStep::Checkout,
        BuiltinStep::InstallKey,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BuiltinStep::Coverage => "coverage",
            BuiltinStep::ArtifactDownload => "artifactDownload",
            BuiltinStep::ArtifactUpload => "artifactUpload",
            BuiltinStep::ServeStaticFiles => "serveStaticFiles",
            BuiltinStep::GitClone => "gitClone",
            BuiltinStep::GitTag => "gitTag",
            BuiltinStep::ReleaseVcs => "releaseVCS",
            BuiltinStep::JUnitReport => "jUnitReport",
            BuiltinStep::Checkout => "checkout",
            BuiltinStep::InstallKey => "installKey",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

/// The single action a step performs, borrowed from the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction<'a> {
    Script(&'a Value),
    Deploy(&'a str),
    Builtin { kind: BuiltinStep, params: &'a Value },
    /// A reusable action, local or external (marker-prefixed)
    Custom { name: &'a str, params: &'a Value },
}

/// One step of a job.
///
/// On the wire a step is a map with exactly one key naming its action. The
/// typed constructors always produce a single entry; documents read from
/// disk may not, which [`Step::action`] reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step(IndexMap<String, Value>);

impl Step {
    fn single(key: impl Into<String>, value: Value) -> Self {
        let mut entries = IndexMap::with_capacity(1);
        entries.insert(key.into(), value);
        Self(entries)
    }

    pub fn script(script: impl Into<Value>) -> Self {
        Self::single(SCRIPT_KEY, script.into())
    }

    pub fn deploy(deployment: &str) -> Self {
        Self::single(DEPLOY_KEY, Value::String(deployment.to_string()))
    }

    pub fn builtin(kind: BuiltinStep, params: Value) -> Self {
        Self::single(kind.key(), params)
    }

    pub fn custom(name: &str, params: Value) -> Self {
        Self::single(name, params)
    }

    /// Names of every populated action variant, in declaration order.
    pub fn action_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Resolves the step's unique action.
    ///
    /// # Errors
    ///
    /// Returns `MissingStepAction` when no variant is populated and
    /// `MultipleStepActions` when more than one is.
    pub fn action(&self) -> Result<StepAction<'_>> {
        let mut entries = self.0.iter();
        let Some((key, value)) = entries.next() else {
            return Err(JobGraphError::MissingStepAction);
        };
        if entries.next().is_some() {
            return Err(JobGraphError::MultipleStepActions(self.action_names()));
        }

        let action = match key.as_str() {
            SCRIPT_KEY => StepAction::Script(value),
            DEPLOY_KEY => match value.as_str() {
                Some(target) => StepAction::Deploy(target),
                None => return Err(JobGraphError::UnknownDeployment(value.to_string())),
            },
            other => match BuiltinStep::from_key(other) {
                Some(kind) => StepAction::Builtin {
                    kind,
                    params: value,
                },
                None => StepAction::Custom {
                    name: other,
                    params: value,
                },
            },
        };
        Ok(action)
    }

    pub fn is_deploy(&self) -> bool {
        self.0.contains_key(DEPLOY_KEY)
    }

    /// Points a deploy step at `deployment`. Other steps are left untouched.
    pub fn retarget_deploy(&mut self, deployment: &str) {
        if let Some(target) = self.0.get_mut(DEPLOY_KEY) {
            *target = Value::String(deployment.to_string());
        }
    }
}
