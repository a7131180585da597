// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstory nudge` - write a pending-nudge marker.

use anyhow::Result;
use clap::Args;

use ovs_adapters::{NudgeRequest, NudgeSender};

use crate::context::CliContext;

#[derive(Args)]
pub struct NudgeArgs {
    /// Recipient agent
    pub agent: String,

    #[arg(long, default_value = "operator")]
    pub from: String,

    #[arg(long, default_value = "attention")]
    pub reason: String,

    #[arg(long, default_value = "")]
    pub subject: String,

    /// Bypass the recipient's mail-check debounce window
    #[arg(long)]
    pub force: bool,
}

pub async fn handle(args: NudgeArgs, ctx: &CliContext) -> Result<()> {
    let outcome = ctx
        .nudge_sender
        .deliver(&NudgeRequest {
            recipient: args.agent.clone(),
            from: args.from,
            reason: args.reason,
            subject: args.subject,
            message_id: None,
            force: args.force,
        })
        .await?;

    if outcome.delivered {
        println!("Nudged {}", args.agent);
    } else {
        println!(
            "Not delivered: {} (use --force to override)",
            outcome.reason.as_deref().unwrap_or("skipped")
        );
    }
    Ok(())
}
