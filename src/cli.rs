use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConvertConfig, DocumentFormat, JoinResolution};
use crate::convert::convert;
use crate::output::print_summary;
use crate::run::project_run;
use crate::source::{SourceRun, SourceWorkflow};
use crate::workflow::ValidationReport;

#[derive(Parser)]
#[command(name = "jobgraph")]
#[command(author, version, about = "Workflow to job graph converter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, env = "JOBGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a source workflow into a declarative job graph
    Convert {
        #[arg(short, long)]
        input: PathBuf,

        /// Export applications, environments and deployments too
        #[arg(long, default_value_t = false)]
        full: bool,

        #[arg(short, long, value_enum)]
        format: Option<DocumentFormat>,

        /// Fail when a join parent was never converted
        #[arg(long, default_value_t = false)]
        strict_joins: bool,

        /// Print a job table to stderr
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Validate a declarative job graph
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Map a historical run onto converted job names
    ProjectRun {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value_t = false)]
        full: bool,

        #[arg(short, long, value_enum)]
        format: Option<DocumentFormat>,
    },
}

impl Cli {
    fn execute_convert(
        &self,
        config: &Config,
        input: &Path,
        options: &ConvertConfig,
        format: DocumentFormat,
        summary: bool,
    ) -> Result<()> {
        info!("Converting workflow from: {}", input.display());

        let source: SourceWorkflow = read_input(input)?;
        let conversion = convert(&source, options)?;

        if summary {
            print_summary(&conversion);
        }

        let rendered = format.render(&conversion.workflow, self.pretty || config.output.pretty)?;
        self.write_output(&rendered)
    }

    fn execute_validate(&self, input: &Path) -> Result<()> {
        info!("Validating workflow from: {}", input.display());

        let body = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let report = ValidationReport::from_input(&body, DocumentFormat::from_path(input));

        let json_output = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        self.write_output(&json_output)?;

        if !report.valid {
            bail!(report
                .error
                .unwrap_or_else(|| "invalid workflow".to_string()));
        }
        Ok(())
    }

    fn execute_project_run(
        &self,
        config: &Config,
        input: &Path,
        options: &ConvertConfig,
        format: DocumentFormat,
    ) -> Result<()> {
        info!("Projecting run from: {}", input.display());

        let run: SourceRun = read_input(input)?;
        let projected = project_run(&run, options)?;

        let rendered = format.render(&projected, self.pretty || config.output.pretty)?;
        self.write_output(&rendered)
    }

    fn write_output(&self, content: &str) -> Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, content)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{content}");
        }
        Ok(())
    }

    pub fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;

        match &self.command {
            Commands::Convert {
                input,
                full,
                format,
                strict_joins,
                summary,
            } => {
                let options = convert_options(&config, *full, *strict_joins);
                let format = format.unwrap_or(config.output.format);
                self.execute_convert(&config, input, &options, format, *summary)
            }
            Commands::Validate { input } => self.execute_validate(input),
            Commands::ProjectRun {
                input,
                full,
                format,
            } => {
                let options = convert_options(&config, *full, false);
                let format = format.unwrap_or(config.output.format);
                self.execute_project_run(&config, input, &options, format)
            }
        }
    }
}

/// Conversion options from the configuration file, with flags on top.
fn convert_options(config: &Config, full: bool, strict_joins: bool) -> ConvertConfig {
    let mut options = config.convert.clone();
    options.full_export |= full;
    if strict_joins {
        options.join_resolution = JoinResolution::Strict;
    }
    options
}

/// Reads a YAML or JSON document, by extension or else by content.
fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let format = DocumentFormat::from_path(path).unwrap_or_else(|| DocumentFormat::detect(&content));
    format
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
