// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstory run` - the current-run pointer.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::CliContext;

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Print the active run id
    Current,
    /// Set the active run id
    Set { run_id: String },
    /// Clear the active run id
    Clear,
}

pub fn handle(args: RunArgs, ctx: &CliContext) -> Result<()> {
    match args.command {
        RunCommand::Current => match ctx.current_run.get()? {
            Some(run_id) => println!("{}", run_id),
            None => println!("No active run"),
        },
        RunCommand::Set { run_id } => {
            ctx.current_run.set(&run_id)?;
            println!("Active run: {}", run_id);
        }
        RunCommand::Clear => {
            ctx.current_run.clear()?;
            println!("Cleared active run");
        }
    }
    Ok(())
}
