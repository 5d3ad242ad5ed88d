use madifa_progress::{
    Config, ContentId, DeviceId, ReportOutcome, ResumePoint, SessionIdentity, SubjectKey, UserId,
    WatchProgressSync,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn sync_against(server: &ServerGuard, dir: &TempDir) -> WatchProgressSync {
    let mut config = Config::default();
    config.remote.base_url = Some(server.url());
    config.remote.request_timeout_secs = 5;
    config.remote.max_retries = 1;
    config.storage.database_path = Some(dir.path().join("progress.db"));

    WatchProgressSync::from_config(&config, Arc::new(SessionIdentity::signed_in("u1", "secret")))
        .await
        .unwrap()
}

fn user() -> SubjectKey {
    SubjectKey::User(UserId::new("u1"))
}

#[tokio::test]
async fn test_report_and_resume_over_http() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let put = server
        .mock("PUT", "/progress/42")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::Json(json!({
            "position": 58.0,
            "durationHint": 120.0,
            "deviceId": "device_a"
        })))
        .with_status(204)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/progress/42")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "position": 58.0,
                "durationHint": 120.0,
                "updatedAt": "2026-10-01T12:00:00Z",
                "deviceId": "device_a"
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let sync = sync_against(&server, &dir).await;
    let content = ContentId::new("42");

    let outcome = sync
        .report_progress(&user(), &content, 58.0, Some(120.0), &DeviceId::new("device_a"))
        .await;
    assert_eq!(outcome, ReportOutcome::Remote);

    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(58.0)
    );
    assert!(
        sync.is_different_device_than_last_write(&user(), &content, &DeviceId::new("device_b"))
            .await
    );

    put.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_authoritative() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    server
        .mock("PUT", "/progress/42")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("GET", "/progress/42")
        .with_status(404)
        .create_async()
        .await;

    let sync = sync_against(&server, &dir).await;
    let content = ContentId::new("42");
    sync.report_progress(&user(), &content, 30.0, Some(100.0), &DeviceId::new("a"))
        .await;

    // The local mirror has 30s, but the server says there is nothing
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::NoRecord
    );
}

#[tokio::test]
async fn test_unauthorized_falls_back_to_local() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let rejected = server
        .mock("PUT", "/progress/42")
        .with_status(401)
        .with_body("token expired")
        .expect(1)
        .create_async()
        .await;

    let sync = sync_against(&server, &dir).await;
    let content = ContentId::new("42");

    let outcome = sync
        .report_progress(&user(), &content, 30.0, Some(100.0), &DeviceId::new("a"))
        .await;
    assert_eq!(outcome, ReportOutcome::LocalOnly);

    // No further HTTP traffic with the rejected token
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(30.0)
    );
    rejected.assert_async().await;
}

#[tokio::test]
async fn test_in_progress_list_over_http() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    server
        .mock("GET", "/progress")
        .match_query(Matcher::UrlEncoded("status".into(), "in-progress".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "contentId": "old",
                    "position": 10.0,
                    "durationHint": 100.0,
                    "updatedAt": "2026-10-01T10:00:00Z",
                    "deviceId": "a"
                },
                {
                    "contentId": "new",
                    "position": 20.0,
                    "durationHint": 100.0,
                    "updatedAt": "2026-10-01T12:00:00Z",
                    "deviceId": "b"
                },
                {
                    "contentId": "unknown-length",
                    "position": 20.0,
                    "updatedAt": "2026-10-01T13:00:00Z",
                    "deviceId": "b"
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let sync = sync_against(&server, &dir).await;
    let ids: Vec<String> = sync
        .continue_watching(&user())
        .await
        .into_iter()
        .map(|record| record.content_id.to_string())
        .collect();
    assert_eq!(ids, vec!["new", "old"]);
}
