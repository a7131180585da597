// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn sample(agent: &str, run: Option<&str>, outcome: SessionOutcome) -> SessionMetrics {
    SessionMetrics {
        agent_name: agent.to_string(),
        capability: Capability::Builder,
        run_id: run.map(str::to_string),
        started_at: 1_000,
        ended_at: 2_000,
        outcome,
        tokens: None,
        cost_usd: None,
    }
}

#[test]
fn record_and_list() {
    let dir = tempdir().unwrap();
    let store = MetricsStore::open(dir.path().join("metrics")).unwrap();

    store.record(&sample("builder-1", Some("run-a"), SessionOutcome::Completed)).unwrap();
    store.record(&sample("scout-1", Some("run-b"), SessionOutcome::Terminated)).unwrap();

    let all = store.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].capability, Capability::Builder);

    let run_a = store.for_run("run-a").unwrap();
    assert_eq!(run_a.len(), 1);
    assert_eq!(run_a[0].agent_name, "builder-1");
    assert_eq!(run_a[0].outcome, SessionOutcome::Completed);
}

#[test]
fn outcome_roundtrip() {
    for o in [SessionOutcome::Completed, SessionOutcome::Zombie, SessionOutcome::Terminated] {
        assert_eq!(o.as_str().parse::<SessionOutcome>().unwrap(), o);
    }
    assert!("vanished".parse::<SessionOutcome>().is_err());
}
