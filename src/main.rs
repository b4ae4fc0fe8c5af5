//! Codedoc CLI entry point.

use clap::Parser;
use codedoc::cli::{self, Cli, Commands, EXIT_ERROR};
use codedoc::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args),
        Commands::Docs(args) => cli::run_docs(args),
        Commands::Fix(args) => cli::run_fix(args),
        Commands::Languages => cli::run_languages(),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
