use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::convert::Conversion;
use crate::workflow::{compute_layers, Condition, Job};

use super::styling::{bright, bright_green, bright_yellow, cyan, dim};
use super::tables::{create_cyan_header, create_table, layer_cell, list_cell};

/// Prints a human-readable summary of a conversion to stderr.
///
/// Displays:
/// - Overview: workflow name and the size of every exported section
/// - Jobs: one row per job ordered by dependency layer, with its
///   dependencies, gating and context references
/// - Warnings: every non-fatal finding of the conversion
pub fn print_summary(conversion: &Conversion) {
    eprintln!("{}", render_summary(conversion));
}

// Helper functions

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn format_condition(condition: Option<&Condition>) -> Vec<String> {
    let Some(condition) = condition else {
        return Vec::new();
    };
    condition
        .script
        .iter()
        .cloned()
        .chain(
            condition
                .checks
                .iter()
                .map(|c| format!("{} {} {}", c.variable, c.operator, c.value)),
        )
        .collect()
}

fn format_context(job: &Job) -> Vec<String> {
    job.context.iter().map(ToString::to_string).collect()
}

#[allow(clippy::format_push_string)]
fn render_summary(conversion: &Conversion) -> String {
    let workflow = &conversion.workflow;
    let mut output = String::new();

    // Overview section
    add_section_header(&mut output, "📊", "Overview");

    let layers = compute_layers(&workflow.job_graph());

    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Workflow:"),
        cyan(workflow.name.as_deref().unwrap_or("(unnamed)")),
        dim("Jobs:"),
        bright_yellow(workflow.jobs.len()),
        dim("Layers:"),
        bright_yellow(layers.depth()),
        dim("Variable sets / secrets:"),
        bright_yellow(format!("{} / {}", workflow.variables.len(), workflow.secrets.len())),
        dim("Repositories / deployments:"),
        bright_yellow(format!(
            "{} / {}",
            workflow.repositories.len(),
            workflow.deployments.len()
        )),
        dim("Warnings:"),
        if conversion.warnings.is_empty() {
            bright_green(0)
        } else {
            bright_yellow(conversion.warnings.len())
        }
    ));

    if workflow.jobs.is_empty() {
        output.push_str(&format!("{}\n", bright_yellow("No jobs produced.")));
    } else {
        // Jobs
        add_section_header(&mut output, "🧱", "Jobs");

        let mut jobs: Vec<(&String, &Job, Option<usize>)> = workflow
            .jobs
            .iter()
            .map(|(name, job)| (name, job, layers.ranks.get(name).copied()))
            .collect();
        // Cyclic jobs last, then by name within a layer
        jobs.sort_by(|a, b| {
            (a.2.is_none(), a.2, a.0).cmp(&(b.2.is_none(), b.2, b.0))
        });

        let mut jobs_table = create_table();
        jobs_table.set_header(create_cyan_header(&[
            "Layer",
            "Job",
            "Depends On",
            "Conditions",
            "Context",
        ]));

        for (name, job, rank) in jobs {
            let name_cell = if job.enabled == Some(false) {
                Cell::new(format!("{name}\n(disabled)")).fg(TableColor::DarkGrey)
            } else {
                Cell::new(name)
            };
            jobs_table.add_row(vec![
                layer_cell(rank),
                name_cell,
                list_cell(&job.depends_on),
                list_cell(&format_condition(job.conditions.as_ref())),
                list_cell(&format_context(job)),
            ]);
        }

        output.push_str(&format!("{jobs_table}\n\n"));
    }

    if !conversion.warnings.is_empty() {
        add_section_header(&mut output, "⚠️", "Warnings");
        for warning in &conversion.warnings {
            output.push_str(&format!("  {} {warning}\n", cyan("•")));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Check, ContextRef, Workflow};

    fn create_job(depends_on: &[&str]) -> Job {
        Job {
            depends_on: depends_on.iter().map(ToString::to_string).collect(),
            ..Job::default()
        }
    }

    fn create_conversion(jobs: Vec<(&str, Job)>, warnings: Vec<&str>) -> Conversion {
        Conversion {
            workflow: Workflow {
                name: Some("demo".to_string()),
                jobs: jobs
                    .into_iter()
                    .map(|(name, job)| (name.to_string(), job))
                    .collect(),
                ..Workflow::default()
            },
            warnings: warnings.into_iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_render_summary_empty_workflow() {
        let output = render_summary(&create_conversion(vec![], vec![]));

        assert!(output.contains("Overview"));
        assert!(output.contains("demo"));
        assert!(output.contains("No jobs produced."));
    }

    #[test]
    fn test_render_summary_lists_jobs_with_dependencies() {
        let conversion = create_conversion(
            vec![
                ("build", create_job(&[])),
                ("deploy", create_job(&["build"])),
            ],
            vec![],
        );

        let output = render_summary(&conversion);

        assert!(output.contains("Jobs"));
        assert!(output.contains("build"));
        assert!(output.contains("deploy"));
        assert!(output.contains("Depends On"));
    }

    #[test]
    fn test_render_summary_shows_conditions_and_context() {
        let mut job = create_job(&[]);
        job.conditions = Condition::from_parts(
            Some("a == b".to_string()),
            vec![Check {
                variable: "git.branch".to_string(),
                operator: "eq".to_string(),
                value: "main".to_string(),
            }],
        );
        job.context = vec![ContextRef::Var("env-prod".to_string())];

        let output = render_summary(&create_conversion(vec![("gated", job)], vec![]));

        assert!(output.contains("a == b"));
        assert!(output.contains("git.branch eq main"));
        assert!(output.contains("var.env-prod"));
    }

    #[test]
    fn test_render_summary_flags_cycles() {
        let conversion = create_conversion(
            vec![("a", create_job(&["b"])), ("b", create_job(&["a"]))],
            vec![],
        );

        let output = render_summary(&conversion);

        assert!(output.contains("cycle"));
    }

    #[test]
    fn test_render_summary_lists_warnings() {
        let conversion = create_conversion(
            vec![("build", create_job(&[]))],
            vec!["job \"build\" overwrites a job of the same name"],
        );

        let output = render_summary(&conversion);

        assert!(output.contains("Warnings"));
        assert!(output.contains("overwrites a job"));
    }
}
