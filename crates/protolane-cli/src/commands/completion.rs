//! Shell completion generation.

use crate::cli::Cli;
use crate::cli::CompletionArgs;
use anyhow::Result;
use clap::CommandFactory;
use std::io;

pub fn execute(args: &CompletionArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
