use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::graph::compute_layers;
use super::step::{Step, StepAction};
use super::{strip_external_marker, ExternalDependencies, Workflow};
use crate::config::DocumentFormat;
use crate::error::JobGraphError;

/// A failed validation, carrying whatever was collected before the failing
/// check.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ValidationFailure {
    #[source]
    pub error: JobGraphError,
    pub collected: ExternalDependencies,
}

type ValidationResult<T> = std::result::Result<T, ValidationFailure>;

/// Collects external references while walking the document.
///
/// Errors are raised with the dependencies gathered so far.
#[derive(Default)]
struct Collector {
    collected: ExternalDependencies,
}

impl Collector {
    fn fail<T>(self, error: JobGraphError) -> ValidationResult<T> {
        Err(ValidationFailure {
            error,
            collected: self.collected,
        })
    }

    fn check_steps(&mut self, workflow: &Workflow, steps: &[Step]) -> Result<(), JobGraphError> {
        for step in steps {
            self.check_step(workflow, step)?;
        }
        Ok(())
    }

    fn check_step(&mut self, workflow: &Workflow, step: &Step) -> Result<(), JobGraphError> {
        match step.action()? {
            StepAction::Custom { name, .. } => {
                let (target, is_external) = strip_external_marker(name);
                if is_external {
                    self.collected.actions.push(target.to_string());
                } else if !workflow.actions.contains_key(target) {
                    return Err(JobGraphError::UnknownAction(target.to_string()));
                }
            }
            StepAction::Deploy(name) => {
                let (target, is_external) = strip_external_marker(name);
                if is_external {
                    self.collected.deployments.push(target.to_string());
                } else if !workflow.deployments.contains_key(target) {
                    return Err(JobGraphError::UnknownDeployment(target.to_string()));
                }
            }
            StepAction::Script(_) | StepAction::Builtin { .. } => {}
        }
        Ok(())
    }
}

impl Workflow {
    /// Checks the structural integrity of the document.
    ///
    /// Single pass, stops at the first error. Checks run in this order:
    /// stage dependencies, then each job (stage, dependencies, steps), then
    /// the steps of local actions, then dependency cycles.
    ///
    /// # Returns
    ///
    /// The external dependencies referenced with the external-scope marker.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] holding the first error and the
    /// external dependencies collected before it.
    pub fn validate(&self) -> ValidationResult<ExternalDependencies> {
        let mut collector = Collector::default();

        for stage in self.stages.values() {
            if let Some(unknown) = stage
                .depends_on
                .iter()
                .find(|d| !self.stages.contains_key(d.as_str()))
            {
                return collector.fail(JobGraphError::UnknownStage(unknown.clone()));
            }
        }

        for (name, job) in &self.jobs {
            debug!("Validating job {name}");
            if let Some(stage) = &job.stage {
                if !self.stages.contains_key(stage) {
                    return collector.fail(JobGraphError::UnknownJobStage {
                        job: name.clone(),
                        stage: stage.clone(),
                    });
                }
            }
            if let Some(dependency) = job
                .depends_on
                .iter()
                .find(|d| !self.jobs.contains_key(d.as_str()))
            {
                return collector.fail(JobGraphError::UnknownJobDependency {
                    job: name.clone(),
                    dependency: dependency.clone(),
                });
            }
            if let Err(error) = collector.check_steps(self, &job.steps) {
                return collector.fail(error);
            }
        }

        for (name, action) in &self.actions {
            debug!("Validating action {name}");
            if let Err(error) = collector.check_steps(self, &action.steps) {
                return collector.fail(error);
            }
        }

        for graph in [self.stage_graph(), self.job_graph()] {
            let layers = compute_layers(&graph);
            if !layers.unresolved.is_empty() {
                return collector.fail(JobGraphError::DependencyCycle(layers.unresolved));
            }
        }

        Ok(collector.collected)
    }
}

/// Response of a validation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub workflow: Workflow,

    #[serde(default, skip_serializing_if = "ExternalDependencies::is_empty")]
    pub external_dependencies: ExternalDependencies,
}

impl ValidationReport {
    /// Validates an already parsed document.
    pub fn from_workflow(workflow: Workflow) -> Self {
        match workflow.validate() {
            Ok(external_dependencies) => Self {
                valid: true,
                error: None,
                workflow,
                external_dependencies,
            },
            Err(failure) => Self {
                valid: false,
                error: Some(format!("invalid workflow: {}", failure.error)),
                workflow,
                external_dependencies: failure.collected,
            },
        }
    }

    /// Parses a serialized document and validates it.
    ///
    /// When `format` is `None` it is detected from the content. An
    /// unparsable document yields an invalid report with an empty workflow.
    pub fn from_input(body: &str, format: Option<DocumentFormat>) -> Self {
        let format = format.unwrap_or_else(|| DocumentFormat::detect(body));
        match format.parse::<Workflow>(body) {
            Ok(workflow) => Self::from_workflow(workflow),
            Err(err) => Self {
                valid: false,
                error: Some(format!("invalid workflow format: {err}")),
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Action, Deployment, Job, Stage};
    use serde_json::json;

    fn job_with_steps(steps: Vec<Step>) -> Job {
        Job {
            steps,
            ..Job::default()
        }
    }

    fn workflow_with_job(name: &str, job: Job) -> Workflow {
        let mut workflow = Workflow::default();
        workflow.jobs.insert(name.to_string(), job);
        workflow
    }

    mod step_tests {
        use super::*;

        #[test]
        fn test_single_action_step_is_accepted() {
            let workflow = workflow_with_job("build", job_with_steps(vec![Step::script("make")]));

            assert!(workflow.validate().is_ok());
        }

        #[test]
        fn test_step_with_two_actions_is_rejected() {
            let step: Step = serde_json::from_value(json!({"script": "make", "checkout": "."})).unwrap();
            let workflow = workflow_with_job("build", job_with_steps(vec![step]));

            let failure = workflow.validate().unwrap_err();

            assert!(matches!(failure.error, JobGraphError::MultipleStepActions(_)));
        }

        #[test]
        fn test_step_without_action_is_rejected() {
            let workflow = workflow_with_job("build", job_with_steps(vec![Step::default()]));

            let failure = workflow.validate().unwrap_err();

            assert!(matches!(failure.error, JobGraphError::MissingStepAction));
        }
    }

    mod reference_tests {
        use super::*;

        #[test]
        fn test_external_action_is_collected_not_resolved() {
            let workflow = workflow_with_job(
                "build",
                job_with_steps(vec![Step::custom("@shared-build", json!({}))]),
            );

            let external = workflow.validate().unwrap();

            assert_eq!(external.actions, vec!["shared-build".to_string()]);
            assert!(external.deployments.is_empty());
        }

        #[test]
        fn test_unknown_local_action_is_rejected() {
            let workflow = workflow_with_job(
                "build",
                job_with_steps(vec![Step::custom("compile", json!({}))]),
            );

            let failure = workflow.validate().unwrap_err();

            assert!(matches!(failure.error, JobGraphError::UnknownAction(ref name) if name == "compile"));
        }

        #[test]
        fn test_local_action_resolves() {
            let mut workflow = workflow_with_job(
                "build",
                job_with_steps(vec![Step::custom("compile", json!({}))]),
            );
            workflow.actions.insert(
                "compile".into(),
                Action {
                    steps: vec![Step::script("cargo build")],
                    ..Action::default()
                },
            );

            assert!(workflow.validate().is_ok());
        }

        #[test]
        fn test_local_action_steps_are_validated() {
            let mut workflow = Workflow::default();
            workflow.actions.insert(
                "compile".into(),
                Action {
                    steps: vec![Step::deploy("missing")],
                    ..Action::default()
                },
            );

            let failure = workflow.validate().unwrap_err();

            assert!(matches!(failure.error, JobGraphError::UnknownDeployment(_)));
        }

        #[test]
        fn test_deployments_local_and_external() {
            let mut workflow = workflow_with_job(
                "deploy",
                job_with_steps(vec![Step::deploy("web-k8s"), Step::deploy("@shared-k8s")]),
            );
            workflow
                .deployments
                .insert("web-k8s".into(), Deployment::default());

            let external = workflow.validate().unwrap();

            assert_eq!(external.deployments, vec!["shared-k8s".to_string()]);
        }

        #[test]
        fn test_failure_keeps_dependencies_collected_so_far() {
            let workflow = workflow_with_job(
                "build",
                job_with_steps(vec![
                    Step::custom("@shared-build", json!({})),
                    Step::deploy("missing"),
                ]),
            );

            let failure = workflow.validate().unwrap_err();

            assert_eq!(failure.collected.actions, vec!["shared-build".to_string()]);
        }
    }

    mod graph_tests {
        use super::*;

        #[test]
        fn test_unknown_stage_dependency_is_rejected() {
            let mut workflow = Workflow::default();
            workflow.stages.insert(
                "test".into(),
                Stage {
                    depends_on: vec!["build".into()],
                    conditions: None,
                },
            );

            let failure = workflow.validate().unwrap_err();

            assert!(matches!(failure.error, JobGraphError::UnknownStage(ref s) if s == "build"));
        }

        #[test]
        fn test_unknown_job_stage_is_rejected() {
            let job = Job {
                stage: Some("missing".into()),
                ..Job::default()
            };
            let workflow = workflow_with_job("build", job);

            assert!(matches!(
                workflow.validate().unwrap_err().error,
                JobGraphError::UnknownJobStage { .. }
            ));
        }

        #[test]
        fn test_unknown_job_dependency_is_rejected() {
            let job = Job {
                depends_on: vec!["ghost".into()],
                ..Job::default()
            };
            let workflow = workflow_with_job("build", job);

            assert!(matches!(
                workflow.validate().unwrap_err().error,
                JobGraphError::UnknownJobDependency { .. }
            ));
        }

        #[test]
        fn test_job_cycle_is_rejected() {
            let mut workflow = Workflow::default();
            for (name, dep) in [("a", "b"), ("b", "a")] {
                workflow.jobs.insert(
                    name.into(),
                    Job {
                        depends_on: vec![dep.into()],
                        ..Job::default()
                    },
                );
            }

            assert!(matches!(
                workflow.validate().unwrap_err().error,
                JobGraphError::DependencyCycle(_)
            ));
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_report_for_valid_yaml_document() {
            let body = "jobs:\n  build:\n    steps:\n      - \"@shared-build\": {}\n";

            let report = ValidationReport::from_input(body, None);

            assert!(report.valid);
            assert!(report.error.is_none());
            assert_eq!(report.external_dependencies.actions, vec!["shared-build".to_string()]);
            assert!(report.workflow.jobs.contains_key("build"));
        }

        #[test]
        fn test_report_for_invalid_document_keeps_workflow() {
            let body = r#"{"jobs": {"build": {"steps": [{"compile": {}}]}}}"#;

            let report = ValidationReport::from_input(body, Some(DocumentFormat::Json));

            assert!(!report.valid);
            assert!(report.error.unwrap().contains("unknown action"));
            assert!(report.workflow.jobs.contains_key("build"));
        }

        #[test]
        fn test_report_for_malformed_document() {
            let report = ValidationReport::from_input("{not json", Some(DocumentFormat::Json));

            assert!(!report.valid);
            assert!(report.error.unwrap().starts_with("invalid workflow format"));
            assert_eq!(report.workflow, Workflow::default());
        }

        #[test]
        fn test_report_serialization_shape() {
            let report = ValidationReport::from_workflow(Workflow::default());
            let json = serde_json::to_value(&report).unwrap();

            assert_eq!(json["valid"], true);
            assert!(json.get("error").is_none());
            assert!(json.get("workflow").is_some());
            assert!(json.get("external_dependencies").is_none());
        }

        #[test]
        fn test_report_serializes_collected_external_dependencies() {
            let body = "jobs:\n  ship:\n    steps:\n      - deploy: \"@prod-k8s\"\n";

            let report = ValidationReport::from_input(body, None);
            let json = serde_json::to_value(&report).unwrap();

            assert_eq!(json["external_dependencies"]["deployments"][0], "prod-k8s");
            assert!(json["external_dependencies"].get("actions").is_none());
        }
    }
}
