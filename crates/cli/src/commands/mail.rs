// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstory mail` - inter-agent mail commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use ovs_core::{MailId, MessageType, Priority};
use ovs_engine::{wait_for_mail, MailWaitOptions, MailWaitOutcome, SendRequest};
use ovs_storage::MailFilter;

use crate::context::CliContext;
use crate::output::{format_message_full, format_message_line, OutputFormat};

#[derive(Args)]
pub struct MailArgs {
    #[command(subcommand)]
    pub command: MailCommand,
}

#[derive(Subcommand)]
pub enum MailCommand {
    /// Send a message to an agent or @group
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Message type (status, question, result, error, worker_done, ...)
        #[arg(long = "type", default_value = "status")]
        mail_type: String,
        #[arg(long, default_value = "normal")]
        priority: String,
        /// Opaque JSON payload
        #[arg(long)]
        payload: Option<String>,
        /// Thread to attach this message to
        #[arg(long)]
        thread: Option<String>,
        /// Bypass the recipient's mail-check debounce window
        #[arg(long)]
        force: bool,
    },
    /// Read (and mark read) unread messages for an agent
    Check {
        #[arg(long)]
        agent: String,
    },
    /// List messages without changing read state
    List {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Match either endpoint of the conversation
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one message
    Get { id: String },
    /// Reply to a message (recipient, subject, and thread are derived)
    Reply {
        id: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        body: String,
    },
    /// Delete messages
    Purge {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        older_than_secs: Option<u64>,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Long-poll for mail (used by coordination agents instead of busy-polling)
    Wait {
        #[arg(long)]
        agent: String,
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
        #[arg(long, default_value_t = 1000)]
        initial_poll_ms: u64,
        #[arg(long, default_value_t = 10_000)]
        max_poll_ms: u64,
        #[arg(long, default_value_t = 1.5)]
        backoff: f64,
        /// Return early when this file appears
        #[arg(long)]
        cancel_file: Option<PathBuf>,
    },
}

pub async fn handle(args: MailArgs, ctx: &CliContext, format: OutputFormat) -> Result<()> {
    match args.command {
        MailCommand::Send {
            from,
            to,
            subject,
            body,
            mail_type,
            priority,
            payload,
            thread,
            force,
        } => {
            let mail_type: MessageType =
                mail_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let priority: Priority = priority.parse().map_err(|e: String| anyhow::anyhow!(e))?;

            let mut request = SendRequest::new(from, to)
                .subject(subject)
                .body(body)
                .mail_type(mail_type)
                .priority(priority);
            if let Some(payload) = payload {
                request = request.payload(payload);
            }
            if let Some(thread) = thread {
                request = request.thread(MailId::from_string(thread));
            }
            if force {
                request = request.force();
            }

            let ids = ctx.broker.send(request).await?;
            match format {
                OutputFormat::Text => {
                    if ids.is_empty() {
                        println!("No recipients resolved; nothing sent");
                    } else {
                        for id in &ids {
                            println!("Sent {}", id);
                        }
                    }
                }
                OutputFormat::Json => {
                    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
                    println!("{}", serde_json::json!({ "ids": ids }));
                }
            }
        }

        MailCommand::Check { agent } => {
            // Surface the out-of-band attention signal before the inbox.
            let nudge = ctx.nudges.read_and_clear(&agent)?;
            let messages = ctx.broker.check(&agent).await?;

            match format {
                OutputFormat::Text => {
                    if let Some(nudge) = &nudge {
                        println!(
                            "NUDGE from {}: {}{}",
                            nudge.from,
                            nudge.reason,
                            if nudge.subject.is_empty() {
                                String::new()
                            } else {
                                format!(" ({})", nudge.subject)
                            }
                        );
                        println!();
                    }
                    if messages.is_empty() {
                        println!("No new mail for {}", agent);
                    } else {
                        for message in &messages {
                            print!("{}", format_message_full(message));
                            println!("---");
                        }
                    }
                }
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({ "nudge": nudge, "messages": messages })
                    );
                }
            }
        }

        MailCommand::List { from, to, agent, unread, limit } => {
            let messages = ctx.broker.list(&MailFilter {
                from,
                to,
                agent,
                unread_only: unread,
                limit,
            })?;
            match format {
                OutputFormat::Text => {
                    if messages.is_empty() {
                        println!("No messages");
                    } else {
                        for message in &messages {
                            println!("{}", format_message_line(message));
                        }
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&messages)?),
            }
        }

        MailCommand::Get { id } => {
            let id = MailId::from_string(&id);
            let message =
                ctx.broker.get(&id)?.with_context(|| format!("no message with id {}", id))?;
            match format {
                OutputFormat::Text => print!("{}", format_message_full(&message)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&message)?),
            }
        }

        MailCommand::Reply { id, from, body } => {
            let reply_id = ctx.broker.reply(&MailId::from_string(&id), &body, &from).await?;
            match format {
                OutputFormat::Text => println!("Sent {}", reply_id),
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "id": reply_id.as_str() }))
                }
            }
        }

        MailCommand::Purge { all, older_than_secs, agent } => {
            let deleted = ctx.broker.purge(all, older_than_secs.map(|s| s * 1000), agent)?;
            match format {
                OutputFormat::Text => println!("Purged {} message(s)", deleted),
                OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": deleted })),
            }
        }

        MailCommand::Wait { agent, timeout_secs, initial_poll_ms, max_poll_ms, backoff, cancel_file } => {
            let wake_on_pending_nudge = ctx
                .sessions
                .get_by_name(&agent)?
                .map(|s| s.capability.wakes_on_nudge())
                .unwrap_or(false);
            let options = MailWaitOptions {
                timeout_ms: timeout_secs * 1000,
                initial_poll_ms,
                max_poll_ms,
                backoff,
                cancel_file,
                wake_on_pending_nudge,
            };

            let outcome = wait_for_mail(&ctx.broker, &ctx.nudges, &agent, &options).await?;
            print_wait_outcome(&agent, outcome, format)?;
        }
    }

    Ok(())
}

fn print_wait_outcome(agent: &str, outcome: MailWaitOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => match outcome {
            MailWaitOutcome::Message { messages, nudge } => {
                if let Some(nudge) = nudge {
                    println!("NUDGE from {}: {}", nudge.from, nudge.reason);
                }
                for message in &messages {
                    print!("{}", format_message_full(message));
                    println!("---");
                }
            }
            MailWaitOutcome::Nudged { nudge } => {
                println!("NUDGE from {}: {} ({})", nudge.from, nudge.reason, nudge.subject);
            }
            MailWaitOutcome::Timeout => println!("No mail for {} (timeout)", agent),
            MailWaitOutcome::Cancelled => println!("Wait cancelled"),
        },
        OutputFormat::Json => {
            let value = match outcome {
                MailWaitOutcome::Message { messages, nudge } => {
                    serde_json::json!({ "status": "message", "messages": messages, "nudge": nudge })
                }
                MailWaitOutcome::Nudged { nudge } => {
                    serde_json::json!({ "status": "nudged", "nudge": nudge })
                }
                MailWaitOutcome::Timeout => serde_json::json!({ "status": "timeout" }),
                MailWaitOutcome::Cancelled => serde_json::json!({ "status": "cancelled" }),
            };
            println!("{}", value);
        }
    }
    Ok(())
}
