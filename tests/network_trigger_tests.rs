// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::Utc;
use journey_tracker::models::{ChangeAction, EventEntry};
use journey_tracker::services::SaveOutcome;
use std::time::Duration;
use uuid::Uuid;

mod common;
use common::{test_sync, MockGateway};

fn event(title: &str) -> EventEntry {
    EventEntry {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        journey_id: None,
        title: title.to_string(),
        description: None,
        latitude: None,
        longitude: None,
        occurred_at: Utc::now(),
        created_at: Utc::now(),
    }
}

/// Poll `check` until it holds or two seconds pass.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn test_reconnect_drains_queue() {
    let t = test_sync(MockGateway::new(), false);
    let _trigger = t.network.spawn_sync_trigger(t.sync.clone());

    for title in ["Bridge", "Lookout"] {
        let outcome = t
            .sync
            .upsert_entity(&event(title), ChangeAction::Create)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Queued);
    }

    t.network.report(true);

    assert!(eventually(|| t.sync.pending_count() == 0).await);
    assert_eq!(t.gateway.rows("events").len(), 2);
    assert!(t.sync.state().is_online);
}

#[tokio::test]
async fn test_one_pass_per_offline_to_online_transition() {
    let t = test_sync(MockGateway::new(), false);
    let _trigger = t.network.spawn_sync_trigger(t.sync.clone());

    let stuck = event("Waterfall");
    t.gateway.fail_id(stuck.id);
    t.sync
        .upsert_entity(&stuck, ChangeAction::Create)
        .await
        .unwrap();

    t.network.report(true);
    assert!(eventually(|| t.gateway.calls() == 1).await);

    // Repeated "online" reports are not transitions
    t.network.report(true);
    t.network.report(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(t.gateway.calls(), 1);

    t.network.report(false);
    assert!(eventually(|| !t.sync.state().is_online).await);

    t.network.report(true);
    assert!(eventually(|| t.gateway.calls() == 2).await);
    assert_eq!(t.sync.pending_count(), 1);
}

#[tokio::test]
async fn test_trigger_stops_with_monitor() {
    let t = test_sync(MockGateway::new(), false);
    let trigger = t.network.spawn_sync_trigger(t.sync.clone());

    drop(t.network);

    tokio::time::timeout(Duration::from_secs(2), trigger)
        .await
        .expect("Trigger did not stop")
        .expect("Trigger panicked");
}
