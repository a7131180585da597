// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `overstoryd`, the Overstory watchdog supervisor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use ovs_adapters::{
    BeadsTracker, CommandTriage, MarkerNudgeSender, MulchAdapter, TmuxAdapter,
};
use ovs_core::SystemClock;
use ovs_daemon::{run_scheduler, LockFile, TracingHealthSink};
use ovs_engine::{MailBroker, Watchdog, WatchdogThresholds};
use ovs_storage::{
    CurrentRun, EventStore, MailCheckState, MailStore, MetricsStore, PendingNudges,
    RunCompleteMarker, SessionStore, StatePaths,
};

#[derive(Parser)]
#[command(name = "overstoryd", about = "Overstory watchdog supervisor", version)]
struct Args {
    /// Project root holding the .overstory state directory (defaults to cwd)
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Seconds between watchdog ticks
    #[arg(long, default_value_t = 30)]
    interval_secs: u64,

    /// Activity age (seconds) at which a session counts as stalled
    #[arg(long, default_value_t = 300)]
    stale_secs: u64,

    /// Activity age (seconds) marking a deep stall
    #[arg(long, default_value_t = 1200)]
    zombie_secs: u64,

    /// Seconds per escalation-ladder step
    #[arg(long, default_value_t = 60)]
    nudge_interval_secs: u64,

    /// Command to consult for AI triage at escalation level 2
    #[arg(long)]
    triage_command: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let project_root = match args.project_root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine working directory")?,
    };
    let paths = StatePaths::new(&project_root);
    std::fs::create_dir_all(paths.root())
        .with_context(|| format!("cannot create state dir {}", paths.root().display()))?;

    let _lock = LockFile::acquire(paths.watchdog_lock_path())?;

    let thresholds = WatchdogThresholds {
        stale_ms: args.stale_secs * 1000,
        zombie_ms: args.zombie_secs * 1000,
        nudge_interval_ms: args.nudge_interval_secs * 1000,
        triage_enabled: args.triage_command.is_some(),
    };
    thresholds.validate()?;

    let clock = SystemClock;
    let sessions = SessionStore::open(paths.sessions_dir())?;
    let mail = MailStore::open(paths.mail_dir())?;
    let events = EventStore::open(paths.events_dir())?;
    let metrics = MetricsStore::open(paths.metrics_dir())?;
    let current_run = CurrentRun::new(paths.current_run_path());
    let run_marker = RunCompleteMarker::new(paths.run_complete_path());
    let nudges = PendingNudges::new(paths.pending_nudges_dir());
    let check_state = MailCheckState::new(paths.mail_check_state_path());

    let nudge_sender = MarkerNudgeSender::new(nudges, check_state.clone(), clock);
    let broker = MailBroker::new(
        mail,
        sessions.clone(),
        events.clone(),
        check_state,
        nudge_sender.clone(),
        clock,
    );
    let triage = args.triage_command.map(CommandTriage::new);

    let watchdog = Watchdog::new(
        sessions,
        broker,
        events,
        metrics,
        current_run,
        run_marker,
        TmuxAdapter::new(),
        BeadsTracker::new(paths.beads_dir()),
        MulchAdapter::new(),
        nudge_sender,
        triage,
        clock,
        thresholds,
        project_root.clone(),
    )
    .with_health_sink(Arc::new(TracingHealthSink));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received; finishing in-flight tick");
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(
        project_root = %project_root.display(),
        interval_secs = args.interval_secs,
        "watchdog started"
    );
    run_scheduler(Duration::from_secs(args.interval_secs), shutdown_rx, || watchdog.tick()).await;
    tracing::info!("watchdog stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
