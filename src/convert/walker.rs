use log::debug;

use super::pipeline::{flatten_pipeline, ConvertedNode};
use super::Converter;
use crate::config::JoinResolution;
use crate::error::{JobGraphError, Result};
use crate::source::{Node, NodeType, Pipeline};
use crate::workflow::{merge_conditions, Check, Condition};

impl<'a> Converter<'a> {
    /// Walks `node` and its subtree.
    ///
    /// `depends_on` holds the end jobs of the closest completed pipeline
    /// above, `ancestor` the gating accumulated through forks since then.
    pub(crate) fn walk(
        &mut self,
        node: &'a Node,
        depends_on: &[String],
        ancestor: Option<&Condition>,
    ) {
        if node.node_type == NodeType::OutgoingHook {
            debug!("Skipping outgoing hook {}", node.id);
            return;
        }

        let condition = merge_conditions(node_condition(node), ancestor, self.options.script_merge);

        if node.node_type != NodeType::Pipeline {
            debug!("Crossing {:?} node {}", node.node_type, node.id);
            for child in &node.triggers {
                self.walk(child, depends_on, condition.as_ref());
            }
            return;
        }

        debug!("Converting pipeline node {} ({})", node.id, node.name);
        let mut converted = match self.pipeline_of(node) {
            Some(pipeline) => flatten_pipeline(pipeline, &node.name),
            None => ConvertedNode::default(),
        };
        for name in std::mem::take(&mut converted.collisions) {
            self.warn(format!(
                "job {name:?} of node {:?} is produced twice, keeping the last one",
                node.name
            ));
        }

        converted.inject(depends_on, condition.as_ref(), self.options.script_merge);
        if self.options.full_export {
            self.bind_context(node, &mut converted.jobs);
        }

        for (name, job) in converted.jobs {
            if self.workflow.jobs.insert(name.clone(), job).is_some() {
                self.warn(format!("job {name:?} overwrites a job of the same name"));
            }
        }
        self.converted.insert(node.id, converted.end_job_names.clone());

        // Gating does not cross a completed pipeline.
        for child in &node.triggers {
            self.walk(child, &converted.end_job_names, None);
        }
    }

    /// Resolves joins once the tree has been walked.
    ///
    /// Joins whose parents are all converted go first, lowest ID first.
    /// When none is ready, the lowest remaining ID is resolved with the
    /// parents available (lenient) or the conversion fails (strict).
    pub(crate) fn resolve_joins(&mut self) -> Result<()> {
        let mut pending: Vec<&'a Node> = self.source.joins.iter().collect();
        pending.sort_by_key(|join| join.id);

        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|join| self.missing_parent(join).is_none());

            let index = match (ready, self.options.join_resolution) {
                (Some(index), _) => index,
                (None, JoinResolution::Lenient) => 0,
                (None, JoinResolution::Strict) => {
                    let join = pending[0];
                    let parent_id = self.missing_parent(join).unwrap_or_default();
                    return Err(JobGraphError::UnresolvedJoinParent {
                        join_id: join.id,
                        parent_id,
                    });
                }
            };

            let join = pending.remove(index);
            let depends_on = self.join_dependencies(join);
            self.walk(join, &depends_on, None);
        }

        Ok(())
    }

    fn missing_parent(&self, join: &Node) -> Option<i64> {
        join.join_context
            .iter()
            .map(|parent| parent.parent_id)
            .find(|id| !self.converted.contains_key(id))
    }

    /// Union of the parents' end jobs, in declared parent order.
    fn join_dependencies(&mut self, join: &Node) -> Vec<String> {
        let mut depends_on = Vec::new();
        for parent in &join.join_context {
            match self.converted.get(&parent.parent_id) {
                Some(end_jobs) => depends_on.extend(end_jobs.iter().cloned()),
                None => self.warn(format!(
                    "join {} references parent {} which was not converted",
                    join.id, parent.parent_id
                )),
            }
        }
        depends_on
    }

    fn pipeline_of(&mut self, node: &Node) -> Option<&'a Pipeline> {
        let source = self.source;
        let found = node
            .context
            .pipeline_id
            .and_then(|id| source.pipelines.get(&id));
        if found.is_none() {
            self.warn(format!(
                "pipeline {:?} of node {:?} not found, node produces no jobs",
                node.context.pipeline_id, node.name
            ));
        }
        found
    }
}

/// The node's own gating, if it declares any.
fn node_condition(node: &Node) -> Option<Condition> {
    let conditions = &node.context.conditions;
    let checks = conditions
        .plain
        .iter()
        .map(|c| Check {
            variable: c.variable.clone(),
            operator: c.operator.clone(),
            value: c.value.clone(),
        })
        .collect();
    Condition::from_parts(conditions.script.clone(), checks)
}
