use serde::{Deserialize, Serialize};

/// A run-time gate on a job or stage.
///
/// A condition with neither a script nor checks always holds, so it is
/// never materialized: constructors return `None` for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Expression evaluated by the execution engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Plain comparisons, all of which must hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<Check>,
}

/// A plain `{variable} {operator} {value}` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub variable: String,
    pub operator: String,
    pub value: String,
}

/// How two non-empty scripts are combined when conditions merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptMerge {
    /// `(current) and (ancestor)`
    #[default]
    And,
    /// Keep the descendant's script, drop the ancestor's
    Current,
    /// Keep the ancestor's script, drop the descendant's
    Ancestor,
}

impl Condition {
    /// Builds a condition from its parts, or `None` when both are empty.
    pub fn from_parts(script: Option<String>, checks: Vec<Check>) -> Option<Self> {
        let script = script.filter(|s| !s.trim().is_empty());
        let condition = Self { script, checks };
        (!condition.is_empty()).then_some(condition)
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.checks.is_empty()
    }

    /// Folds `ancestor` into `self` so that both must hold.
    ///
    /// Checks are conjoined: the descendant's come first, followed by the
    /// ancestor's. Scripts follow `mode` when both sides carry one.
    pub fn merge(&mut self, ancestor: &Condition, mode: ScriptMerge) {
        self.script = match (self.script.take(), ancestor.script.as_ref()) {
            (None, None) => None,
            (Some(current), None) => Some(current),
            (None, Some(inherited)) => Some(inherited.clone()),
            (Some(current), Some(inherited)) => Some(match mode {
                ScriptMerge::And => format!("({current}) and ({inherited})"),
                ScriptMerge::Current => current,
                ScriptMerge::Ancestor => inherited.clone(),
            }),
        };
        self.checks.extend(ancestor.checks.iter().cloned());
    }
}

/// Merges two optional conditions; `None` on either side is the identity.
pub fn merge(
    current: Option<Condition>,
    ancestor: Option<&Condition>,
    mode: ScriptMerge,
) -> Option<Condition> {
    match (current, ancestor) {
        (None, None) => None,
        (Some(current), None) => Some(current),
        (None, Some(ancestor)) => Some(ancestor.clone()),
        (Some(mut current), Some(ancestor)) => {
            current.merge(ancestor, mode);
            Some(current)
        }
    }
}
