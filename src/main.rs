use anyhow::Result;
use clap::Parser;
use jobgraph::cli::Cli;
use jobgraph::output;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting jobgraph");
    cli.execute()?;

    Ok(())
}
