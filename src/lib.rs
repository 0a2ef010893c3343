//! Conversion of tree-shaped continuous-delivery workflows into flat,
//! declarative job graphs, plus validation of the declarative form and
//! projection of historical runs onto converted job names.

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod naming;
pub mod output;
pub mod run;
pub mod source;
pub mod workflow;

pub use config::{Config, ConvertConfig};
pub use convert::{convert, Conversion};
pub use error::{JobGraphError, Result};
pub use run::{project_run, WorkflowRun};
pub use workflow::{ValidationReport, Workflow};
