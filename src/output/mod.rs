mod styling;
mod summary;
mod tables;

pub use styling::{dim, magenta_bold};
pub use summary::print_summary;

/// Prints the `jobgraph` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔀 jobgraph"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Workflow to job graph converter")
    );
}
