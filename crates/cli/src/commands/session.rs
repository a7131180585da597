// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstory session` - session registry views.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::context::CliContext;
use crate::output::{format_time_ago, OutputFormat};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List sessions (all, or only active)
    List {
        #[arg(long)]
        active: bool,
        /// Restrict to one run
        #[arg(long)]
        run: Option<String>,
    },
    /// Show one session in full
    Show {
        /// Agent name
        name: String,
    },
}

pub fn handle(args: SessionArgs, ctx: &CliContext, format: OutputFormat) -> Result<()> {
    match args.command {
        SessionCommand::List { active, run } => {
            let sessions = match (&run, active) {
                (Some(run_id), _) => ctx.sessions.get_by_run(run_id)?,
                (None, true) => ctx.sessions.get_active()?,
                (None, false) => ctx.sessions.get_all()?,
            };

            match format {
                OutputFormat::Text => {
                    if sessions.is_empty() {
                        println!("No sessions");
                        return Ok(());
                    }
                    let name_width = sessions
                        .iter()
                        .map(|s| s.agent_name.len())
                        .max()
                        .unwrap_or(0)
                        .max("AGENT".len());
                    println!(
                        "{:<name_width$}  {:<11}  {:<9}  {:<5}  ACTIVITY",
                        "AGENT", "CAPABILITY", "STATE", "ESC"
                    );
                    for s in &sessions {
                        let escalation = if s.escalation_level > 0 {
                            format!("L{}", s.escalation_level)
                        } else {
                            "-".to_string()
                        };
                        println!(
                            "{:<name_width$}  {:<11}  {:<9}  {:<5}  {}",
                            s.agent_name,
                            s.capability.to_string(),
                            s.state.to_string(),
                            escalation,
                            format_time_ago(s.last_activity),
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sessions)?),
            }
        }

        SessionCommand::Show { name } => {
            let session = ctx
                .sessions
                .get_by_name(&name)?
                .with_context(|| format!("no session for agent {}", name))?;
            match format {
                OutputFormat::Text => {
                    println!("Agent:      {}", session.agent_name);
                    println!("Capability: {}", session.capability);
                    println!("State:      {}", session.state);
                    println!("Worktree:   {}", session.worktree_path.display());
                    println!("Branch:     {}", session.branch_name);
                    println!("Tmux:       {}", session.tmux_session);
                    if !session.bead_id.is_empty() {
                        println!("Bead:       {}", session.bead_id);
                    }
                    if let Some(run) = &session.run_id {
                        println!("Run:        {}", run);
                    }
                    if let Some(parent) = &session.parent_agent {
                        println!("Parent:     {} (depth {})", parent, session.depth);
                    }
                    println!("Activity:   {} ago", format_time_ago(session.last_activity));
                    if let Some(since) = session.stalled_since {
                        println!(
                            "Stalled:    since {} ago (escalation L{})",
                            format_time_ago(since),
                            session.escalation_level
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
            }
        }
    }

    Ok(())
}
