//! Integration tests for the presence engine.

mod helpers;

use chrono::Duration;

use plaza_core::error::ErrorKind;
use plaza_core::traits::store::PresenceStore;
use plaza_core::types::{Collection, Identity};
use plaza_entity::GreetingResult;
use plaza_entity::presence::LivenessState;
use plaza_entity::profile::ProfileDocument;

use helpers::TestApp;

#[tokio::test]
async fn test_save_then_subscribe_is_active() {
    let app = TestApp::new();
    let kai = app.join("kai", "Kai").await;

    let (_sub, mut stream) = app.watch().await;
    let roster = stream.next().await;
    assert_eq!(roster.get(&kai).map(|e| e.state), Some(LivenessState::Active));
}

#[tokio::test]
async fn test_roster_ages_out_without_heartbeats() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;

    let (_sub, mut stream) = app.watch().await;
    assert_eq!(
        stream.next().await.get(&a).map(|e| e.state),
        Some(LivenessState::Active)
    );

    app.advance_minutes(20);
    app.engine.touch(&Identity::from("c")).await.unwrap();
    let roster = stream.next().await;
    assert_eq!(roster.get(&a).map(|e| e.state), Some(LivenessState::Sleeping));

    app.advance_minutes(20);
    app.engine.touch(&Identity::from("c")).await.unwrap();
    let roster = stream.next().await;
    assert!(!roster.contains(&a));
}

#[tokio::test]
async fn test_threshold_boundaries() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;

    app.advance_minutes(15);
    let roster = app.engine.roster().await.unwrap();
    assert_eq!(roster.get(&a).map(|e| e.state), Some(LivenessState::Active));

    app.clock.advance(Duration::seconds(1));
    let roster = app.engine.roster().await.unwrap();
    assert_eq!(roster.get(&a).map(|e| e.state), Some(LivenessState::Sleeping));

    app.clock.advance(Duration::minutes(15) - Duration::seconds(1));
    let roster = app.engine.roster().await.unwrap();
    assert_eq!(roster.get(&a).map(|e| e.state), Some(LivenessState::Sleeping));

    app.clock.advance(Duration::seconds(1));
    assert!(app.engine.roster().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_heartbeat_revives_exited_identity() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;

    app.advance_minutes(45);
    assert!(!app.engine.roster().await.unwrap().contains(&a));

    app.engine.touch(&a).await.unwrap();
    let roster = app.engine.roster().await.unwrap();
    assert_eq!(roster.get(&a).map(|e| e.state), Some(LivenessState::Active));
}

#[tokio::test]
async fn test_greeting_scenario_across_days() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;
    let b = app.join("b", "Mio").await;

    let first = app.engine.greet(&a, &b).await.unwrap();
    assert_eq!(first, Some(GreetingResult { exp: 120, level: 1 }));

    assert_eq!(app.engine.greet(&a, &b).await.unwrap(), None);
    assert_eq!(app.engine.load(&a).await.unwrap().unwrap().exp, 120);

    app.clock.advance(Duration::days(1));
    let next_day = app.engine.greet(&a, &b).await.unwrap();
    assert_eq!(next_day, Some(GreetingResult { exp: 240, level: 1 }));

    // Greetings are directional.
    let back = app.engine.greet(&b, &a).await.unwrap();
    assert_eq!(back, Some(GreetingResult { exp: 120, level: 1 }));
}

#[tokio::test]
async fn test_leveling_through_greetings() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;

    let mut last = None;
    for i in 0..3 {
        last = app
            .engine
            .greet(&a, &Identity::from(format!("friend{i}")))
            .await
            .unwrap();
    }
    assert_eq!(last, Some(GreetingResult { exp: 360, level: 2 }));

    let stored = app.engine.load(&a).await.unwrap().unwrap();
    assert_eq!((stored.exp, stored.level), (360, 2));
}

#[tokio::test]
async fn test_self_greeting_awards_nothing() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;
    assert_eq!(app.engine.greet(&a, &a).await.unwrap(), None);
    assert_eq!(app.engine.load(&a).await.unwrap().unwrap().exp, 0);
}

#[tokio::test]
async fn test_greeting_before_joining_is_noop() {
    let app = TestApp::new();
    let result = app
        .engine
        .greet(&Identity::from("ghost"), &Identity::from("b"))
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_unsubscribe_is_per_subscriber() {
    let app = TestApp::new();
    app.join("a", "Kai").await;

    let (first, mut first_stream) = app.watch().await;
    let (_second, mut second_stream) = app.watch().await;
    first_stream.next().await;
    second_stream.next().await;

    first.unsubscribe();
    first.unsubscribe();

    let b = app.join("b", "Mio").await;
    second_stream.next_matching(|r| r.contains(&b)).await;
    assert!(first_stream.is_quiet_for(200).await);
}

#[tokio::test]
async fn test_roster_never_contains_exited() {
    let app = TestApp::new();
    app.join("old", "Old").await;
    app.advance_minutes(31);
    app.join("new", "New").await;

    let (_sub, mut stream) = app.watch().await;
    let roster = stream.next().await;
    assert_eq!(roster.len(), 1);
    assert!(roster.entries.iter().all(|e| e.state != LivenessState::Exited));
}

#[tokio::test]
async fn test_profile_without_session_is_hidden() {
    let app = TestApp::new();

    // A profile written straight to the store has no session yet.
    app.engine
        .store()
        .put_json(
            Collection::Users,
            &Identity::from("lurker"),
            &ProfileDocument::from(&helpers::profile("Lurker")),
        )
        .await
        .unwrap();
    assert!(app.engine.roster().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_backend_failure_surfaces_and_changes_nothing() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;
    let b = Identity::from("b");

    app.store.set_offline(true);
    let err = app.engine.greet(&a, &b).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
    assert!(err.is_backend());
    assert!(app.engine.touch(&a).await.is_err());
    assert!(!app.engine.health_check().await.unwrap());

    app.store.set_offline(false);
    assert_eq!(app.engine.load(&a).await.unwrap().unwrap().exp, 0);
    assert_eq!(
        app.engine.greet(&a, &b).await.unwrap(),
        Some(GreetingResult { exp: 120, level: 1 })
    );
}

#[tokio::test]
async fn test_failed_profile_write_keeps_greeting_retryable() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;
    let b = app.join("b", "Mio").await;

    app.store.set_failing_user_writes(true);
    let err = app.engine.greet(&a, &b).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
    // Neither document moved.
    assert!(!app.engine.session(&a).await.unwrap().unwrap().has_greeted(&b));
    assert_eq!(app.engine.load(&a).await.unwrap().unwrap().exp, 0);

    app.store.set_failing_user_writes(false);
    assert_eq!(
        app.engine.greet(&a, &b).await.unwrap(),
        Some(GreetingResult { exp: 120, level: 1 })
    );
    assert_eq!(app.engine.load(&a).await.unwrap().unwrap().exp, 120);
}

#[tokio::test]
async fn test_greeted_list_clears_at_midnight_utc() {
    let app = TestApp::new();
    let a = app.join("a", "Kai").await;
    let b = Identity::from("b");
    app.engine.greet(&a, &b).await.unwrap();

    // 2024-05-01 23:50
    app.advance_minutes(14 * 60 + 50);
    app.engine.touch(&a).await.unwrap();
    let evening = app.engine.roster().await.unwrap();
    assert_eq!(evening.get(&a).unwrap().greeted_today, vec![b.clone()]);

    // 2024-05-02 00:05, no heartbeat since yesterday
    app.advance_minutes(15);
    let roster = app.engine.roster().await.unwrap();
    let entry = roster.get(&a).unwrap();
    assert!(entry.greeted_today.is_empty());
    assert_eq!(entry.state, LivenessState::Active);
    assert!(app.engine.session(&a).await.unwrap().unwrap().greeted_today.is_empty());
}
