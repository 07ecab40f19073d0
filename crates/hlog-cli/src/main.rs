//! hlog CLI binary entrypoint.
//!
//! This is the main entry point for the `hlog` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hlog_cli::cli::{Cli, Commands};
use hlog_cli::commands::{DemoCommand, FollowCommand, TreeCommand};
use hlog_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), hlog_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let config = cli.format_config()?;
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Tree(args) => {
            let cmd = TreeCommand::new(&config, cli.store_config())
                .with_levels(cli.level_filter());
            cmd.execute(&mut stdout, &format, args)?;
        }
        Commands::Follow(args) => {
            let cmd = FollowCommand::new(&config, cli.store_config())
                .with_levels(cli.level_filter());
            cmd.execute(&mut stdout, &format, args)?;
        }
        Commands::Demo(args) => {
            let cmd = DemoCommand::new(&config, cli.store_config());
            cmd.execute(&mut stdout, &format, args)?;
        }
    }

    Ok(())
}
