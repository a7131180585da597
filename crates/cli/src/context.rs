// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handles for CLI commands: the stores and the broker, opened once
//! per invocation.

use std::path::Path;

use anyhow::Result;

use ovs_adapters::MarkerNudgeSender;
use ovs_core::SystemClock;
use ovs_engine::MailBroker;
use ovs_storage::{
    CurrentRun, EventStore, MailCheckState, MailStore, MergeQueueStore, PendingNudges,
    SessionStore, StatePaths,
};

pub struct CliContext {
    pub paths: StatePaths,
    pub sessions: SessionStore,
    pub broker: MailBroker<SystemClock, MarkerNudgeSender<SystemClock>>,
    pub nudges: PendingNudges,
    pub nudge_sender: MarkerNudgeSender<SystemClock>,
    pub current_run: CurrentRun,
    pub merge_queue: MergeQueueStore,
    pub clock: SystemClock,
}

impl CliContext {
    pub fn open(project_root: &Path) -> Result<Self> {
        let paths = StatePaths::new(project_root);
        std::fs::create_dir_all(paths.root())?;

        let clock = SystemClock;
        let sessions = SessionStore::open(paths.sessions_dir())?;
        let mail = MailStore::open(paths.mail_dir())?;
        let events = EventStore::open(paths.events_dir())?;
        let check_state = MailCheckState::new(paths.mail_check_state_path());
        let nudges = PendingNudges::new(paths.pending_nudges_dir());
        let nudge_sender = MarkerNudgeSender::new(nudges.clone(), check_state.clone(), clock);
        let broker = MailBroker::new(
            mail,
            sessions.clone(),
            events,
            check_state,
            nudge_sender.clone(),
            clock,
        );
        let merge_queue = MergeQueueStore::open(paths.merge_queue_dir())?;

        Ok(Self {
            current_run: CurrentRun::new(paths.current_run_path()),
            paths,
            sessions,
            broker,
            nudges,
            nudge_sender,
            merge_queue,
            clock,
        })
    }
}
