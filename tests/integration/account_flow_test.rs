use crate::common::mocks::MockRemote;
use crate::common::{TestDevice, tick};
use madifa_progress::{
    ContentId, DeviceId, ProgressApiError, RemoteProgressStore, ReportOutcome, ResumePoint,
    SessionIdentity, SubjectKey, UserId,
};
use std::sync::Arc;

fn user() -> SubjectKey {
    SubjectKey::User(UserId::new("u1"))
}

#[tokio::test]
async fn test_resume_follows_account_across_devices() {
    let remote = Arc::new(MockRemote::new());
    let shared: Arc<dyn RemoteProgressStore> = remote.clone();
    let content = ContentId::new("42");
    let device_a = DeviceId::new("A");
    let device_b = DeviceId::new("B");

    let install_a = TestDevice::new();
    let install_b = TestDevice::new();

    {
        let sync_a = install_a
            .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "token-a")), shared.clone())
            .await;
        let outcome = sync_a
            .report_progress(&user(), &content, 58.0, Some(120.0), &device_a)
            .await;
        assert_eq!(outcome, ReportOutcome::Remote);
    }

    // Reopened on A
    let sync_a = install_a
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "token-a")), shared.clone())
        .await;
    assert_eq!(
        sync_a.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(58.0)
    );
    assert!(
        !sync_a
            .is_different_device_than_last_write(&user(), &content, &device_a)
            .await
    );

    // Opened on B with an empty local store
    let sync_b = install_b
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "token-b")), shared)
        .await;
    assert!(
        sync_b
            .is_different_device_than_last_write(&user(), &content, &device_b)
            .await
    );
    assert_eq!(
        sync_b.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(58.0)
    );
    assert_eq!(remote.record_count(), 1);
}

#[tokio::test]
async fn test_user_reports_upsert_remotely() {
    let remote = Arc::new(MockRemote::new());
    let install = TestDevice::new();
    let sync = install
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "t")), remote.clone())
        .await;
    let content = ContentId::new("42");

    for position in [10.0, 20.0, 30.0] {
        sync.report_progress(&user(), &content, position, Some(100.0), &DeviceId::new("A"))
            .await;
    }

    assert_eq!(remote.record_count(), 1);
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(30.0)
    );
}

#[tokio::test]
async fn test_remote_outage_uses_local_mirror() {
    let remote = Arc::new(MockRemote::new());
    let install = TestDevice::new();
    let sync = install
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "t")), remote.clone())
        .await;
    let content = ContentId::new("42");

    sync.report_progress(&user(), &content, 40.0, Some(100.0), &DeviceId::new("A"))
        .await;

    remote.inject_error(ProgressApiError::ServerError {
        status: 503,
        message: "Service Unavailable".into(),
    });
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(40.0)
    );

    // Writes during the outage land locally and are still readable
    let outcome = sync
        .report_progress(&user(), &content, 50.0, Some(100.0), &DeviceId::new("A"))
        .await;
    assert_eq!(outcome, ReportOutcome::LocalOnly);
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(50.0)
    );
    assert_eq!(sync.continue_watching(&user()).await.len(), 1);

    remote.clear_error();
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(40.0)
    );
}

#[tokio::test]
async fn test_auth_loss_degrades_until_reauthentication() {
    let remote = Arc::new(MockRemote::new());
    let identity = Arc::new(SessionIdentity::signed_in("u1", "stale"));
    let install = TestDevice::new();
    let sync = install.sync_with_remote(identity.clone(), remote.clone()).await;
    let content = ContentId::new("42");

    remote.inject_error(ProgressApiError::Authentication {
        status: 401,
        message: "token expired".into(),
    });
    let outcome = sync
        .report_progress(&user(), &content, 15.0, Some(100.0), &DeviceId::new("A"))
        .await;
    assert_eq!(outcome, ReportOutcome::LocalOnly);

    let calls = remote.calls();
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(15.0)
    );
    assert_eq!(remote.calls(), calls);

    remote.clear_error();
    identity.refresh_token("fresh");
    let outcome = sync
        .report_progress(&user(), &content, 25.0, Some(100.0), &DeviceId::new("A"))
        .await;
    assert_eq!(outcome, ReportOutcome::Remote);
    assert_eq!(remote.record_count(), 1);
}

#[tokio::test]
async fn test_account_continue_watching_ordering() {
    let remote = Arc::new(MockRemote::new());
    let install = TestDevice::new();
    let sync = install
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "t")), remote)
        .await;

    for (id, position) in [("t1", 5.0), ("t2", 50.0), ("finished", 118.0), ("t3", 80.0)] {
        sync.report_progress(&user(), &ContentId::new(id), position, Some(120.0), &DeviceId::new("A"))
            .await;
        tick().await;
    }

    let ids: Vec<String> = sync
        .continue_watching(&user())
        .await
        .into_iter()
        .map(|record| record.content_id.to_string())
        .collect();
    assert_eq!(ids, vec!["t3", "t2", "t1"]);
}

#[tokio::test]
async fn test_without_remote_users_stay_local() {
    let install = TestDevice::new();
    let sync = install
        .sync(Arc::new(SessionIdentity::signed_in("u1", "t")))
        .await;
    let content = ContentId::new("42");

    let outcome = sync
        .report_progress(&user(), &content, 12.0, Some(100.0), &DeviceId::new("A"))
        .await;
    assert_eq!(outcome, ReportOutcome::LocalOnly);
    assert_eq!(
        sync.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(12.0)
    );
}

#[tokio::test]
async fn test_remote_reads_refresh_last_seen_device() {
    let remote = Arc::new(MockRemote::new());
    let content = ContentId::new("42");
    let install_a = TestDevice::new();
    let install_b = TestDevice::new();

    let sync_a = install_a
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "token-a")), remote.clone())
        .await;
    sync_a
        .report_progress(&user(), &content, 58.0, Some(120.0), &DeviceId::new("A"))
        .await;

    let sync_b = install_b
        .sync_with_remote(Arc::new(SessionIdentity::signed_in("u1", "token-b")), remote.clone())
        .await;
    assert!(!sync_b.last_seen_device_differs(&DeviceId::new("B")).await);

    assert_eq!(
        sync_b.get_resume_position(&user(), &content).await,
        ResumePoint::Resume(58.0)
    );
    assert!(sync_b.last_seen_device_differs(&DeviceId::new("B")).await);
    assert!(!sync_b.last_seen_device_differs(&DeviceId::new("A")).await);

    // B takes over; A learns about it from the continue-watching list
    sync_b
        .report_progress(&user(), &content, 70.0, Some(120.0), &DeviceId::new("B"))
        .await;
    assert!(!sync_a.last_seen_device_differs(&DeviceId::new("A")).await);
    assert_eq!(sync_a.continue_watching(&user()).await.len(), 1);
    assert!(sync_a.last_seen_device_differs(&DeviceId::new("A")).await);
}
