//! Projection of historical runs onto converted job names.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::ConvertConfig;
use crate::convert::convert;
use crate::error::Result;
use crate::naming;
use crate::source::SourceRun;
use crate::workflow::Workflow;

/// One execution attempt of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub status: String,
    pub sub_number: i64,
}

/// A historical run re-keyed by converted job name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub number: i64,
    pub status: String,
    pub workflow: Workflow,

    /// Attempts per job, most recent sub-run first
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub job_runs: BTreeMap<String, Vec<JobRun>>,
}

/// Converts the run's workflow and maps every recorded job execution onto
/// the job name the conversion produced for it.
///
/// Attempts are never de-duplicated. Node runs pointing at a node the
/// workflow no longer has are skipped.
pub fn project_run(run: &SourceRun, options: &ConvertConfig) -> Result<WorkflowRun> {
    let conversion = convert(&run.workflow, options)?;
    let mut projected = WorkflowRun {
        number: run.number,
        status: run.status.clone(),
        workflow: conversion.workflow,
        job_runs: BTreeMap::new(),
    };

    let mut node_ids: Vec<&i64> = run.node_runs.keys().collect();
    node_ids.sort();

    for node_id in node_ids {
        for node_run in &run.node_runs[node_id] {
            let Some(node) = run.workflow.node_by_id(node_run.workflow_node_id) else {
                warn!(
                    "Run {} references unknown node {}, skipping",
                    run.number, node_run.workflow_node_id
                );
                continue;
            };

            for stage in &node_run.stages {
                for run_job in &stage.run_jobs {
                    let name = naming::job_name(
                        &node.name,
                        &stage.name,
                        &run_job.action_name,
                        run_job.action_id,
                    );
                    projected.job_runs.entry(name).or_default().push(JobRun {
                        status: run_job.status.clone(),
                        sub_number: node_run.sub_number,
                    });
                }
            }
        }
    }

    for attempts in projected.job_runs.values_mut() {
        attempts.sort_by(|a, b| b.sub_number.cmp(&a.sub_number));
    }

    debug!(
        "Projected run {} onto {} jobs",
        run.number,
        projected.job_runs.len()
    );
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::source::{
        Action, Node, NodeContext, NodeRun, Pipeline, RunJob, SourceWorkflow, Stage, StageRun,
    };

    // Helper function to create a one-node workflow with a single action
    fn create_workflow() -> SourceWorkflow {
        SourceWorkflow {
            name: "demo".to_string(),
            root: Node {
                id: 1,
                name: "Build".to_string(),
                context: NodeContext {
                    pipeline_id: Some(10),
                    ..NodeContext::default()
                },
                ..Node::default()
            },
            pipelines: HashMap::from([(
                10,
                Pipeline {
                    name: "build".to_string(),
                    stages: vec![Stage {
                        name: "Compile".to_string(),
                        actions: vec![Action {
                            id: 7,
                            name: "Make All".to_string(),
                            enabled: true,
                            ..Action::default()
                        }],
                    }],
                },
            )]),
            ..SourceWorkflow::default()
        }
    }

    fn create_node_run(node_id: i64, sub_number: i64, status: &str) -> NodeRun {
        NodeRun {
            workflow_node_id: node_id,
            sub_number,
            stages: vec![StageRun {
                name: "Compile".to_string(),
                run_jobs: vec![RunJob {
                    status: status.to_string(),
                    action_id: 7,
                    action_name: "Make All".to_string(),
                }],
            }],
        }
    }

    fn create_run(node_runs: Vec<NodeRun>) -> SourceRun {
        SourceRun {
            number: 42,
            status: "Success".to_string(),
            workflow: create_workflow(),
            node_runs: HashMap::from([(1, node_runs)]),
        }
    }

    #[test]
    fn test_attempts_land_on_converted_job_name() {
        // Arrange
        let run = create_run(vec![create_node_run(1, 0, "Success")]);

        // Act
        let projected = project_run(&run, &ConvertConfig::default()).unwrap();

        // Assert: the run key matches the job key the converter produced
        assert_eq!(projected.number, 42);
        assert_eq!(projected.status, "Success");
        assert!(projected.workflow.jobs.contains_key("build-compile-make-all-7"));
        assert_eq!(
            projected.job_runs["build-compile-make-all-7"],
            vec![JobRun {
                status: "Success".to_string(),
                sub_number: 0
            }]
        );
    }

    #[test]
    fn test_attempts_are_sorted_most_recent_first() {
        let run = create_run(vec![
            create_node_run(1, 0, "Fail"),
            create_node_run(1, 2, "Success"),
            create_node_run(1, 1, "Fail"),
        ]);

        let projected = project_run(&run, &ConvertConfig::default()).unwrap();

        let sub_numbers: Vec<i64> = projected.job_runs["build-compile-make-all-7"]
            .iter()
            .map(|attempt| attempt.sub_number)
            .collect();
        assert_eq!(sub_numbers, vec![2, 1, 0]);
    }

    #[test]
    fn test_repeated_attempts_are_kept() {
        let run = create_run(vec![
            create_node_run(1, 1, "Fail"),
            create_node_run(1, 1, "Success"),
        ]);

        let projected = project_run(&run, &ConvertConfig::default()).unwrap();

        let statuses: Vec<&str> = projected.job_runs["build-compile-make-all-7"]
            .iter()
            .map(|attempt| attempt.status.as_str())
            .collect();
        assert_eq!(statuses, vec!["Fail", "Success"]);
    }

    #[test]
    fn test_unknown_node_is_skipped() {
        let run = create_run(vec![create_node_run(99, 0, "Success")]);

        let projected = project_run(&run, &ConvertConfig::default()).unwrap();

        assert!(projected.job_runs.is_empty());
        assert_eq!(projected.workflow.jobs.len(), 1);
    }
}
