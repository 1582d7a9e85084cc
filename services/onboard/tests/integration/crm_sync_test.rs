use std::sync::Arc;
use std::time::Duration;

use onboard::domain::repository::CrmSyncScheduler;
use onboard::error::{CrmError, CrmSyncError};
use onboard::usecase::crm_sync::{CrmClient, CrmTokenCache, SpawnedCrmSync, SyncUserToCrmUseCase};

use crate::helpers::{MockCrmApi, MockUserRepo, test_user};

fn transport_error() -> CrmError {
    CrmError::Transport("connection reset".to_owned())
}

fn sync_usecase(users: MockUserRepo, api: MockCrmApi) -> SyncUserToCrmUseCase<MockUserRepo, MockCrmApi> {
    SyncUserToCrmUseCase {
        users,
        crm: CrmClient::new(api, Arc::new(CrmTokenCache::new())),
    }
}

#[tokio::test(start_paused = true)]
async fn should_retry_after_one_and_three_seconds_then_record_lead_id() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let stored = users.handle();
    let api = MockCrmApi::scripted(vec![
        Err(transport_error()),
        Err(CrmError::Timeout),
        Ok("5725767000000524157".to_owned()),
    ]);

    sync_usecase(users, api.clone()).execute(&user).await;

    let calls = api.calls();
    assert_eq!(calls.len(), 3);
    let first_gap = calls[1].at - calls[0].at;
    let second_gap = calls[2].at - calls[1].at;
    assert!(
        first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1100),
        "first backoff was {first_gap:?}"
    );
    assert!(
        second_gap >= Duration::from_secs(3) && second_gap < Duration::from_millis(3100),
        "second backoff was {second_gap:?}"
    );
    assert_eq!(calls[0].lead.first_name, "Asha");
    assert_eq!(calls[0].lead.last_name, "Rao");

    let stored = stored.lock().unwrap();
    assert!(stored[0].crm_synced);
    assert_eq!(stored[0].crm_id.as_deref(), Some("5725767000000524157"));
}

#[tokio::test(start_paused = true)]
async fn should_leave_user_unsynced_after_three_failures() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let stored = users.handle();
    let api = MockCrmApi::scripted(vec![
        Err(transport_error()),
        Err(transport_error()),
        Err(CrmError::Rejected("MANDATORY_NOT_FOUND".to_owned())),
        Ok("never-reached".to_owned()),
    ]);

    sync_usecase(users, api.clone()).execute(&user).await;

    assert_eq!(api.calls().len(), 3, "no fourth attempt");
    let stored = stored.lock().unwrap();
    assert!(!stored[0].crm_synced);
    assert!(stored[0].crm_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn should_keep_confirmed_lead_when_overlapping_sync_fails() {
    let mut user = test_user();
    user.crm_synced = true;
    user.crm_id = Some("L-confirmed".to_owned());
    let users = MockUserRepo::new(vec![user.clone()]);
    let stored = users.handle();
    let api = MockCrmApi::scripted(vec![
        Err(CrmError::Timeout),
        Err(CrmError::Timeout),
        Err(CrmError::Timeout),
    ]);

    sync_usecase(users, api.clone()).execute(&user).await;

    assert_eq!(api.calls().len(), 3);
    let stored = stored.lock().unwrap();
    assert!(stored[0].crm_synced);
    assert_eq!(stored[0].crm_id.as_deref(), Some("L-confirmed"));
}

#[tokio::test(start_paused = true)]
async fn should_report_exhaustion_with_last_error() {
    let api = MockCrmApi::scripted(vec![
        Err(transport_error()),
        Err(transport_error()),
        Err(CrmError::Rejected("DUPLICATE_DATA".to_owned())),
    ]);
    let client = CrmClient::new(api, Arc::new(CrmTokenCache::new()));
    let lead = onboard::domain::types::Lead::from_user(&test_user());

    let result = client.create_lead(&lead).await;

    match result {
        Err(CrmSyncError::Exhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("DUPLICATE_DATA"), "{last_error}");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn should_abort_without_creating_lead_when_token_refresh_fails() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let stored = users.handle();
    let api = MockCrmApi::refresh_failing();

    let client = CrmClient::new(api.clone(), Arc::new(CrmTokenCache::new()));
    let result = client.create_lead(&onboard::domain::types::Lead::from_user(&user)).await;
    assert!(
        matches!(result, Err(CrmSyncError::AuthFailed(_))),
        "expected AuthFailed, got {result:?}"
    );

    sync_usecase(users, api.clone()).execute(&user).await;

    assert!(api.calls().is_empty(), "no lead call without a token");
    assert_eq!(api.refresh_count(), 2, "one refresh per sync, never retried");
    assert!(!stored.lock().unwrap()[0].crm_synced);
}

#[tokio::test]
async fn should_reuse_cached_token_across_syncs() {
    let first = test_user();
    let second = test_user();
    let users = MockUserRepo::new(vec![first.clone(), second.clone()]);
    let api = MockCrmApi::scripted(vec![Ok("L1".to_owned()), Ok("L2".to_owned())]);
    let uc = sync_usecase(users, api.clone());

    uc.execute(&first).await;
    uc.execute(&second).await;

    assert_eq!(api.refresh_count(), 1);
    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].access_token, calls[1].access_token);
}

#[tokio::test(start_paused = true)]
async fn should_refresh_token_after_crm_rejects_it() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let stored = users.handle();
    let api = MockCrmApi::scripted(vec![
        Err(CrmError::AuthFailed("INVALID_TOKEN".to_owned())),
        Ok("L1".to_owned()),
    ]);

    sync_usecase(users, api.clone()).execute(&user).await;

    assert_eq!(api.refresh_count(), 2);
    let calls = api.calls();
    assert_eq!(calls[0].access_token, "token-1");
    assert_eq!(calls[1].access_token, "token-2");
    assert!(stored.lock().unwrap()[0].crm_synced);
}

#[tokio::test]
async fn should_run_scheduled_sync_in_background() {
    let user = test_user();
    let users = MockUserRepo::new(vec![user.clone()]);
    let stored = users.handle();
    let scheduler = SpawnedCrmSync {
        usecase: Arc::new(sync_usecase(users, MockCrmApi::scripted(vec![Ok("L1".to_owned())]))),
    };

    scheduler.schedule(user);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !stored.lock().unwrap()[0].crm_synced {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("background sync did not finish");
    assert_eq!(stored.lock().unwrap()[0].crm_id.as_deref(), Some("L1"));
}
