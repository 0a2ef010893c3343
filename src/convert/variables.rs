use crate::source::{Variable, VariableKind};
use crate::workflow::{Secret, VariableSet, VariableValue};

/// Variables of one scope, split by sensitivity.
#[derive(Debug, Default)]
pub struct Partitioned<'a> {
    /// Plain variables, typed
    pub plain: VariableSet,
    /// Secret variables in declaration order, values untouched
    pub secrets: Vec<(&'a str, Secret)>,
}

/// Splits `variables` into typed plain values and opaque secrets.
///
/// Used for application and environment scopes alike.
pub fn partition(variables: &[Variable]) -> Partitioned<'_> {
    let mut partitioned = Partitioned::default();
    for variable in variables {
        if variable.kind == VariableKind::Password {
            partitioned
                .secrets
                .push((variable.name.as_str(), Secret(variable.value.clone())));
        } else {
            partitioned.plain.insert(
                variable.name.clone(),
                parse_value(variable.kind, &variable.value),
            );
        }
    }
    partitioned
}

/// Types a plain variable value.
///
/// A value that does not parse as its declared kind silently becomes the
/// kind's zero value.
pub fn parse_value(kind: VariableKind, raw: &str) -> VariableValue {
    match kind {
        VariableKind::Number => VariableValue::Number(raw.parse().unwrap_or(0.0)),
        VariableKind::Boolean => VariableValue::Boolean(parse_bool(raw).unwrap_or(false)),
        _ => VariableValue::Text(raw.to_string()),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
