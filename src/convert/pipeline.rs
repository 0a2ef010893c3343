use indexmap::IndexMap;

use crate::naming;
use crate::source::{Action, Pipeline};
use crate::workflow::{merge_conditions, Condition, Job, ScriptMerge};

/// Jobs produced by one pipeline node.
#[derive(Debug, Default)]
pub struct ConvertedNode {
    /// Every job of the node, in stage then action order
    pub jobs: IndexMap<String, Job>,
    /// Jobs with no predecessor inside the pipeline
    pub start_jobs: Vec<String>,
    /// Jobs nothing inside the pipeline waits on; the node's exposed surface
    pub end_job_names: Vec<String>,
    /// Job names produced more than once; the last one won
    pub collisions: Vec<String>,
}

impl ConvertedNode {
    /// Attaches ancestor dependencies and gating to the start jobs.
    pub fn inject(&mut self, depends_on: &[String], condition: Option<&Condition>, mode: ScriptMerge) {
        for name in &self.start_jobs {
            let Some(job) = self.jobs.get_mut(name) else {
                continue;
            };
            job.depends_on.extend(depends_on.iter().cloned());
            job.conditions = merge_conditions(job.conditions.take(), condition, mode);
        }
    }
}

/// Flattens a pipeline into jobs separated by stage barriers.
///
/// Every job of a stage depends on every job of the previous non-empty
/// stage. Stages without actions are skipped, so the barrier carries over
/// them.
pub fn flatten_pipeline(pipeline: &Pipeline, node_name: &str) -> ConvertedNode {
    let mut converted = ConvertedNode::default();
    let mut previous_stage: Vec<String> = Vec::new();

    for stage in &pipeline.stages {
        if stage.actions.is_empty() {
            continue;
        }

        let mut stage_job_names = Vec::with_capacity(stage.actions.len());
        for action in &stage.actions {
            let name = naming::job_name(node_name, &stage.name, &action.name, action.id);
            let mut job = convert_action(action);
            // A job repeated in a later stage must not wait on itself
            job.depends_on
                .extend(previous_stage.iter().filter(|prev| **prev != name).cloned());

            if converted.jobs.insert(name.clone(), job).is_some() {
                converted.collisions.push(name.clone());
            }
            if !stage_job_names.contains(&name) {
                stage_job_names.push(name);
            }
        }

        if converted.start_jobs.is_empty() {
            converted.start_jobs.clone_from(&stage_job_names);
        }
        previous_stage = stage_job_names;
    }

    converted.end_job_names = previous_stage;
    converted
}

fn convert_action(action: &Action) -> Job {
    Job {
        description: action.description.clone().filter(|d| !d.is_empty()),
        enabled: (!action.enabled).then_some(false),
        requirements: action.requirements.clone(),
        steps: action.steps.clone(),
        ..Job::default()
    }
}
