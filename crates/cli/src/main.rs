// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstory`, the CLI surface over the coordination stores.
//!
//! Worker agents are separate processes; every command operates directly on
//! the shared stores under `.overstory/`, never through the daemon.

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::context::CliContext;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "overstory", about = "Multi-agent orchestration for coding agents", version)]
struct Cli {
    /// Project root holding the .overstory state directory (defaults to cwd)
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inter-agent mail
    Mail(commands::mail::MailArgs),
    /// Agent session registry
    Session(commands::session::SessionArgs),
    /// Write a pending-nudge marker for an agent
    Nudge(commands::nudge::NudgeArgs),
    /// The current-run pointer
    Run(commands::run::RunArgs),
    /// Fleet summary
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let project_root = match &cli.project_root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let ctx = CliContext::open(&project_root)?;

    match cli.command {
        Command::Mail(args) => commands::mail::handle(args, &ctx, cli.format).await,
        Command::Session(args) => commands::session::handle(args, &ctx, cli.format),
        Command::Nudge(args) => commands::nudge::handle(args, &ctx).await,
        Command::Run(args) => commands::run::handle(args, &ctx),
        Command::Status => commands::status::handle(&ctx, cli.format),
    }
}
