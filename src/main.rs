//! Codepulse CLI entry point.

use std::io::Write;

use clap::Parser;
use codepulse::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli::default_log_filter(cli.verbose)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args, &mut stdout),
        Commands::Report(args) => cli::run_report(args, &mut stdout),
        Commands::Metrics(args) => cli::run_metrics(args, &mut stdout),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    let _ = stdout.flush();
    std::process::exit(exit_code);
}
