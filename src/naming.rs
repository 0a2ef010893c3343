//! Deterministic names for everything the converter emits.
//!
//! Every key of the declarative document goes through [`slug`], so the same
//! source entity always lands on the same name. Join resolution and run
//! projection both rely on that to find jobs again.

/// Separator placed between the parts of a composite name.
pub const SEPARATOR: char = '-';

/// Prefix of application-scoped variable and secret containers.
pub const APPLICATION_SCOPE: &str = "app";

/// Prefix of environment-scoped variable and secret containers.
pub const ENVIRONMENT_SCOPE: &str = "env";

/// Normalizes a string into a safe identifier.
///
/// Rules:
/// - Lowercase
/// - Every character outside `[a-z0-9]` becomes a hyphen
/// - Consecutive hyphens collapse into one
/// - Leading and trailing hyphens are trimmed
pub fn slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with(SEPARATOR) {
            out.push(SEPARATOR);
        }
    }
    while out.ends_with(SEPARATOR) {
        out.pop();
    }
    out
}

/// Joins `parts` with [`SEPARATOR`] and slugs the result.
pub fn slug_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .map(|p| p.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string());
    slug(&joined)
}

/// Canonical job name: `node-stage-action-actionID`.
///
/// Used both when flattening pipelines and when projecting runs, the two
/// must agree.
pub fn job_name(node_name: &str, stage_name: &str, action_name: &str, action_id: i64) -> String {
    slug_parts([
        node_name,
        stage_name,
        action_name,
        action_id.to_string().as_str(),
    ])
}

/// Name of a scoped variable container, e.g. `app-my-app`.
pub fn scope_name(scope: &str, entity_name: &str) -> String {
    slug_parts([scope, entity_name])
}

/// Name of a scoped secret, e.g. `env-prod-db-password`.
pub fn scoped_secret_name(scope: &str, entity_name: &str, secret_name: &str) -> String {
    slug_parts([scope, entity_name, secret_name])
}

/// Name of a deployment bound to an application through an integration.
pub fn deployment_name(application_name: &str, integration_name: &str) -> String {
    slug_parts([application_name, integration_name])
}

#[cfg(test)]
mod tests {
    use super::*;

    mod slug_tests {
        use super::*;

        #[test]
        fn test_lowercases_and_replaces_separators() {
            assert_eq!(slug("Build And Test"), "build-and-test");
        }

        #[test]
        fn test_collapses_runs_of_non_alphanumeric() {
            assert_eq!(slug("my  app__v2!!"), "my-app-v2");
        }

        #[test]
        fn test_trims_leading_and_trailing_separators() {
            assert_eq!(slug("---hello---world---"), "hello-world");
        }

        #[test]
        fn test_empty_and_symbol_only_inputs() {
            assert_eq!(slug(""), "");
            assert_eq!(slug("@@@"), "");
        }

        #[test]
        fn test_is_deterministic() {
            let first = slug("Deploy/Prod (EU)");
            let second = slug("Deploy/Prod (EU)");
            assert_eq!(first, second);
            assert_eq!(first, "deploy-prod-eu");
        }
    }

    mod composite_tests {
        use super::*;

        #[test]
        fn test_job_name_includes_action_id() {
            assert_eq!(job_name("build", "Stage 1", "Compile", 42), "build-stage-1-compile-42");
        }

        #[test]
        fn test_scope_names() {
            assert_eq!(scope_name(APPLICATION_SCOPE, "My App"), "app-my-app");
            assert_eq!(
                scoped_secret_name(ENVIRONMENT_SCOPE, "Prod", "DB_PASSWORD"),
                "env-prod-db-password"
            );
        }

        #[test]
        fn test_deployment_name() {
            assert_eq!(deployment_name("my-app", "Kubernetes"), "my-app-kubernetes");
        }

        #[test]
        fn test_distinct_entities_can_collide() {
            // Collisions are detected by the converter, not here.
            assert_eq!(job_name("a b", "c", "d", 1), job_name("a", "b c", "d", 1));
        }
    }
}
