use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::debug;

use super::variables::partition;
use super::Converter;
use crate::naming::{self, APPLICATION_SCOPE, ENVIRONMENT_SCOPE};
use crate::source::{Application, Node, Variable};
use crate::workflow::{external, ContextRef, Deployment, DeploymentConfigValue, Job, Repository};

impl<'a> Converter<'a> {
    /// Exports every application and environment as shared document data.
    ///
    /// Applications yield a repository (when connected to source control),
    /// a variable container and one secret per secret variable.
    /// Environments yield the same minus the repository.
    pub(crate) fn export_scopes(&mut self) {
        let source = self.source;

        let mut application_ids: Vec<&i64> = source.applications.keys().collect();
        application_ids.sort();
        for id in application_ids {
            let application = &source.applications[id];
            if !application.repository_strategy.connection_type.is_empty() {
                let name = naming::slug(&application.name);
                let repository = Repository {
                    ssh_key: external(&application.repository_strategy.ssh_key),
                    connection: application.repository_strategy.connection_type.clone(),
                    slug: application.repository_fullname.clone(),
                    server: external(&application.vcs_server),
                };
                let previous = self.workflow.repositories.insert(name.clone(), repository);
                if previous.is_some() {
                    self.warn(format!(
                        "repository {name:?} overwrites a repository of the same name"
                    ));
                }
            }
            self.export_variables(APPLICATION_SCOPE, &application.name, &application.variables);
        }

        let mut environment_ids: Vec<&i64> = source.environments.keys().collect();
        environment_ids.sort();
        for id in environment_ids {
            let environment = &source.environments[id];
            self.export_variables(ENVIRONMENT_SCOPE, &environment.name, &environment.variables);
        }
    }

    fn export_variables(&mut self, scope: &str, entity_name: &str, variables: &[Variable]) {
        let partitioned = partition(variables);

        for (secret_name, secret) in partitioned.secrets {
            let name = naming::scoped_secret_name(scope, entity_name, secret_name);
            if self.workflow.secrets.insert(name.clone(), secret).is_some() {
                self.warn(format!("secret {name:?} overwrites a secret of the same name"));
            }
        }

        if !partitioned.plain.is_empty() {
            let name = naming::scope_name(scope, entity_name);
            if self.workflow.variables.insert(name.clone(), partitioned.plain).is_some() {
                self.warn(format!("variables {name:?} overwrite variables of the same name"));
            }
        }
    }

    /// Binds the jobs of a pipeline node to its environment, application
    /// and deployment.
    ///
    /// Every job of the node receives the same context references, in this
    /// order: environment variables, environment secrets, repository,
    /// application variables, application secrets.
    pub(crate) fn bind_context(&mut self, node: &Node, jobs: &mut IndexMap<String, Job>) {
        let source = self.source;
        let context = &node.context;
        let mut references = Vec::new();

        if let Some(environment_id) = context.environment_id {
            match source.environments.get(&environment_id) {
                Some(environment) => {
                    let environment_name = if environment.name.is_empty() {
                        context.environment_name.as_deref().unwrap_or_default()
                    } else {
                        environment.name.as_str()
                    };
                    push_scope_references(
                        &mut references,
                        ENVIRONMENT_SCOPE,
                        environment_name,
                        &environment.variables,
                    );
                }
                None => self.warn(format!(
                    "environment {environment_id} of node {:?} not found",
                    node.name
                )),
            }
        }

        let mut deployment = None;
        if let Some(application_id) = context.application_id {
            match source.applications.get(&application_id) {
                Some(application) => {
                    if !application.repository_strategy.connection_type.is_empty() {
                        references.push(ContextRef::Repository(naming::slug(&application.name)));
                    }
                    push_scope_references(
                        &mut references,
                        APPLICATION_SCOPE,
                        &application.name,
                        &application.variables,
                    );
                    deployment = self.bind_deployment(node, application);
                }
                None => self.warn(format!(
                    "application {application_id} of node {:?} not found",
                    node.name
                )),
            }
        }

        for job in jobs.values_mut() {
            job.context.extend(references.iter().cloned());
            if let Some(deployment) = &deployment {
                for step in job.steps.iter_mut().filter(|s| s.is_deploy()) {
                    step.retarget_deploy(deployment);
                }
            }
        }
    }

    /// Registers the deployment of `application` through the node's
    /// integration and returns its name.
    fn bind_deployment(&mut self, node: &Node, application: &Application) -> Option<String> {
        let source = self.source;
        let integration_id = node.context.project_integration_id?;
        if application.deployment_strategies.is_empty() {
            return None;
        }
        let Some(integration) = source.project_integrations.get(&integration_id) else {
            self.warn(format!(
                "integration {integration_id} of node {:?} not found",
                node.name
            ));
            return None;
        };
        let strategy = application.deployment_strategies.get(&integration.name)?;

        let config: BTreeMap<String, DeploymentConfigValue> = strategy
            .iter()
            .map(|(key, value)| {
                (
                    key.clone(),
                    DeploymentConfigValue {
                        kind: value.kind.clone(),
                        value: value.value.clone(),
                    },
                )
            })
            .collect();
        let deployment = Deployment {
            integration: external(&integration.name),
            config,
        };

        let name = naming::deployment_name(&application.name, &integration.name);
        debug!("Binding node {:?} to deployment {name}", node.name);
        if let Some(previous) = self.workflow.deployments.insert(name.clone(), deployment.clone()) {
            if previous != deployment {
                self.warn(format!("deployment {name:?} overwrites a different deployment"));
            }
        }
        Some(name)
    }
}

fn push_scope_references(
    references: &mut Vec<ContextRef>,
    scope: &str,
    entity_name: &str,
    variables: &[Variable],
) {
    let partitioned = partition(variables);
    if !partitioned.plain.is_empty() {
        references.push(ContextRef::Var(naming::scope_name(scope, entity_name)));
    }
    for (secret_name, _) in partitioned.secrets {
        references.push(ContextRef::Secret(naming::scoped_secret_name(
            scope,
            entity_name,
            secret_name,
        )));
    }
}
