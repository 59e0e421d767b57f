//! Integration tests for the session host protocol.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use plaza_core::config::host::HostConfig;
use plaza_host::{HostInbound, HostOutbound, IdentityStore, SessionHost};

use helpers::TestApp;

struct HostFixture {
    app: TestApp,
    host: Arc<SessionHost>,
    rx: mpsc::Receiver<HostOutbound>,
    dir: tempfile::TempDir,
}

async fn host_fixture() -> HostFixture {
    let app = TestApp::new();
    let dir = tempfile::tempdir().unwrap();
    let local = IdentityStore::open(dir.path()).await.unwrap();
    let (tx, rx) = mpsc::channel(128);
    let host = SessionHost::new(app.engine.clone(), local, &HostConfig::default(), tx)
        .await
        .unwrap();
    HostFixture {
        app,
        host: Arc::new(host),
        rx,
        dir,
    }
}

fn intent(value: serde_json::Value) -> HostInbound {
    serde_json::from_value(value).expect("valid intent")
}

async fn next_json(rx: &mut mpsc::Receiver<HostOutbound>) -> serde_json::Value {
    let message = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    serde_json::to_value(message).unwrap()
}

/// Skip roster emissions and return the next other message
async fn next_non_roster(rx: &mut mpsc::Receiver<HostOutbound>) -> serde_json::Value {
    loop {
        let value = next_json(rx).await;
        if value["type"] != "sessions" {
            return value;
        }
    }
}

#[tokio::test]
async fn test_first_run_flow() {
    let mut f = host_fixture().await;

    f.host.handle(intent(json!({"type": "ready"}))).await;
    assert_eq!(
        next_json(&mut f.rx).await,
        json!({"type": "profile", "payload": null})
    );

    f.host
        .handle(intent(json!({
            "type": "saveProfile",
            "payload": {"name": " Kai ", "avatarCode": "cat", "message": "  ", "exp": 9000}
        })))
        .await;

    let saved = next_json(&mut f.rx).await;
    assert_eq!(saved["type"], "profileSaved");
    assert_eq!(
        saved["payload"],
        json!({"name": "Kai", "avatarCode": "cat", "exp": 0, "level": 1})
    );
    assert_eq!(next_json(&mut f.rx).await["type"], "profile");

    let sessions = next_json(&mut f.rx).await;
    assert_eq!(sessions["type"], "sessions");
    let uid = f.host.identity().to_string();
    assert_eq!(sessions["payload"]["selfUid"], uid.as_str());
    assert_eq!(
        sessions["payload"]["sessions"],
        json!([{
            "uid": uid,
            "name": "Kai",
            "avatarCode": "cat",
            "level": 1,
            "exp": 0,
            "state": "active"
        }])
    );

    // The profile is cached for the next run.
    let cached = IdentityStore::open(f.dir.path())
        .await
        .unwrap()
        .load_profile()
        .await
        .unwrap();
    assert_eq!(cached.map(|p| p.name), Some("Kai".to_string()));

    f.host.stop().await;
}

#[tokio::test]
async fn test_greet_and_join_flow() {
    let mut f = host_fixture().await;
    f.host
        .handle(intent(json!({"type": "saveProfile", "payload": {"name": "Kai", "avatarCode": "dog"}})))
        .await;

    let mio = f.app.join("mio", "Mio").await;
    assert_eq!(
        next_non_roster(&mut f.rx).await,
        json!({"type": "profileSaved", "payload": {"name": "Kai", "avatarCode": "dog", "exp": 0, "level": 1}})
    );
    assert_eq!(next_non_roster(&mut f.rx).await["type"], "profile");
    assert_eq!(
        next_non_roster(&mut f.rx).await,
        json!({"type": "userJoined", "payload": {"uid": "mio", "name": "Mio"}})
    );

    let greet = json!({"type": "greet", "payload": {"greetedUid": mio.as_str()}});
    f.host.handle(intent(greet.clone())).await;
    assert_eq!(
        next_non_roster(&mut f.rx).await,
        json!({"type": "greetingRecorded", "payload": {"exp": 120, "level": 1}})
    );

    f.host.handle(intent(greet)).await;
    f.host.handle(intent(json!({"type": "heartbeat"}))).await;
    let profile = f.app.engine.load(f.host.identity()).await.unwrap().unwrap();
    assert_eq!(profile.exp, 120);
    assert_eq!(f.host.profile().await.map(|p| p.exp), Some(120));

    f.host.stop().await;
}

#[tokio::test]
async fn test_returning_user_starts_session_on_ready() {
    let mut f = host_fixture().await;
    let me = f.host.identity().clone();
    f.app.engine.save(&me, &helpers::profile("Kai")).await.unwrap();

    f.host.handle(intent(json!({"type": "ready"}))).await;
    let profile = next_json(&mut f.rx).await;
    assert_eq!(profile["type"], "profile");
    assert_eq!(profile["payload"]["name"], "Kai");
    assert!(f.host.is_session_active().await);

    // Requesting again reuses the existing subscription.
    f.host.handle(intent(json!({"type": "requestSessions"}))).await;
    assert!(f.host.is_session_active().await);

    f.host.handle(intent(json!({"type": "editProfile"}))).await;
    assert!(!f.host.is_session_active().await);
}

#[tokio::test]
async fn test_backend_outage_reports_error() {
    let mut f = host_fixture().await;
    f.app.store.set_offline(true);

    f.host
        .handle(intent(json!({"type": "saveProfile", "payload": {"name": "Kai", "avatarCode": "cat"}})))
        .await;
    let error = next_json(&mut f.rx).await;
    assert_eq!(error["type"], "error");
    assert!(
        error["payload"]
            .as_str()
            .unwrap()
            .contains("Check your network connection")
    );
    assert!(f.host.profile().await.is_none());
    assert!(!f.host.is_session_active().await);
}

#[tokio::test]
async fn test_unknown_avatar_rejected() {
    let mut f = host_fixture().await;
    f.host
        .handle(intent(json!({"type": "saveProfile", "payload": {"name": "Kai", "avatarCode": "unicorn"}})))
        .await;
    assert_eq!(
        next_json(&mut f.rx).await,
        json!({"type": "error", "payload": "Unknown avatar 'unicorn'"})
    );
}

#[tokio::test]
async fn test_save_profile_keeps_progression_when_read_fails() {
    let mut f = host_fixture().await;
    let identity = f.host.identity().clone();
    let mut stored = helpers::profile("Kai");
    stored.exp = 240;
    f.app.engine.save(&identity, &stored).await.unwrap();

    f.app.store.set_failing_reads(true);
    f.host
        .handle(intent(json!({"type": "saveProfile", "payload": {"name": "Kai", "avatarCode": "dog"}})))
        .await;
    let error = next_json(&mut f.rx).await;
    assert_eq!(error["type"], "error");
    assert!(f.host.profile().await.is_none());

    f.app.store.set_failing_reads(false);
    let kept = f.app.engine.load(&identity).await.unwrap().unwrap();
    assert_eq!((kept.exp, kept.avatar_code.as_str()), (240, "cat"));
}
