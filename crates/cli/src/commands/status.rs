// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstory status` - one-screen fleet summary.

use std::collections::BTreeMap;

use anyhow::Result;

use ovs_storage::MergeStatus;

use crate::context::CliContext;
use crate::output::OutputFormat;

pub fn handle(ctx: &CliContext, format: OutputFormat) -> Result<()> {
    let sessions = ctx.sessions.get_all()?;
    let current_run = ctx.current_run.get()?;

    let mut by_state: BTreeMap<&'static str, usize> = BTreeMap::new();
    for session in &sessions {
        *by_state.entry(session.state.as_str()).or_default() += 1;
    }

    let mut unread: BTreeMap<String, usize> = BTreeMap::new();
    for session in &sessions {
        let count = ctx.broker.unread_count(&session.agent_name)?;
        if count > 0 {
            unread.insert(session.agent_name.clone(), count);
        }
    }

    let queued_merges = ctx.merge_queue.list(Some(MergeStatus::Queued))?.len();

    match format {
        OutputFormat::Text => {
            match &current_run {
                Some(run_id) => println!("Run: {}", run_id),
                None => println!("Run: -"),
            }

            if sessions.is_empty() {
                println!("Sessions: none");
            } else {
                let states = by_state
                    .iter()
                    .map(|(state, n)| format!("{state}: {n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("Sessions: {} ({states})", sessions.len());
            }

            if unread.is_empty() {
                println!("Unread mail: none");
            } else {
                let pending = unread
                    .iter()
                    .map(|(agent, n)| format!("{agent}: {n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("Unread mail: {pending}");
            }

            println!("Merge queue: {} queued", queued_merges);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "run": current_run,
                    "sessions": by_state,
                    "unread": unread,
                    "merge_queue_queued": queued_merges,
                })
            );
        }
    }

    Ok(())
}
