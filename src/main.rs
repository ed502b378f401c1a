use clap::Parser;
use robopost::cli::{run, Cli};
use robopost::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.log_json)?;

    run(&cli)
}
