//! Protolane CLI - extract schema archives, compile descriptor sets, and
//! relay payloads from the command line.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    logging::init(logging::level(cli.verbose, cli.quiet));
    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match &cli.command {
        cli::Commands::Extract(args) => commands::extract::execute(args, &*formatter),
        cli::Commands::Compile(args) => commands::compile::execute(args, &*formatter),
        cli::Commands::Relay(args) => commands::relay::execute(args, &*formatter),
        cli::Commands::Completion(args) => commands::completion::execute(args),
    }
}
