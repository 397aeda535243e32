use chrono::Duration;

use vigil_domain::purpose::OtpPurpose;
use vigil_otp::domain::types::OtpStatus;
use vigil_otp::error::OtpServiceError;
use vigil_otp::usecase::issue::{IssueOtpInput, IssueOtpUseCase};

use crate::helpers::{
    ManualClock, MockOtpStore, MockUserDirectory, t0, test_hasher, test_policy, test_spec,
    test_user,
};

fn usecase(store: MockOtpStore, clock: ManualClock) -> IssueOtpUseCase<MockUserDirectory, MockOtpStore, ManualClock> {
    IssueOtpUseCase {
        users: MockUserDirectory::new(vec![test_user()]),
        store,
        clock,
        hasher: test_hasher(),
        policy: test_policy(),
    }
}

fn input(ttl_secs: i64) -> IssueOtpInput {
    IssueOtpInput {
        user_id: test_user(),
        purpose: OtpPurpose::TwoFactor,
        spec: test_spec(ttl_secs),
    }
}

#[tokio::test]
async fn should_issue_code_and_store_only_its_hash() {
    let store = MockOtpStore::default();
    let uc = usecase(store.clone(), ManualClock::at(t0()));

    let issued = uc.execute(input(300)).await.unwrap();

    assert_eq!(issued.code.len(), 8);
    assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(issued.record.expires_at, t0() + Duration::seconds(300));

    let records = store.snapshot();
    assert_eq!(records.len(), 1);
    let stored = &records[0];
    assert_eq!(stored.status, OtpStatus::Active);
    assert_eq!(stored.attempts, 0);
    assert_ne!(stored.code_hash, issued.code.as_bytes());
    assert_eq!(
        stored.code_hash,
        test_hasher().hash(test_user(), OtpPurpose::TwoFactor, &issued.code)
    );
}

#[tokio::test]
async fn should_keep_exactly_one_active_code_per_pair() {
    let store = MockOtpStore::default();
    let clock = ManualClock::at(t0());
    let uc = usecase(store.clone(), clock.clone());

    let mut last = None;
    for ttl_secs in [300, 120, 600, 90] {
        last = Some(uc.execute(input(ttl_secs)).await.unwrap());
        clock.advance(Duration::seconds(1));
    }

    let active = store.active_for(test_user(), OtpPurpose::TwoFactor);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, last.unwrap().record.id);
    assert_eq!(active[0].expires_at - active[0].created_at, Duration::seconds(90));

    let superseded = store
        .snapshot()
        .into_iter()
        .filter(|r| r.status == OtpStatus::Superseded)
        .count();
    assert_eq!(superseded, 3);
}

#[tokio::test]
async fn should_not_supersede_other_purposes() {
    let store = MockOtpStore::default();
    let uc = usecase(store.clone(), ManualClock::at(t0()));

    uc.execute(input(300)).await.unwrap();
    uc.execute(IssueOtpInput {
        purpose: OtpPurpose::PasswordReset,
        ..input(300)
    })
    .await
    .unwrap();

    assert_eq!(store.active_for(test_user(), OtpPurpose::TwoFactor).len(), 1);
    assert_eq!(store.active_for(test_user(), OtpPurpose::PasswordReset).len(), 1);
}

#[tokio::test]
async fn should_return_user_not_found_for_unknown_user() {
    let store = MockOtpStore::default();
    let uc = IssueOtpUseCase {
        users: MockUserDirectory::empty(),
        store: store.clone(),
        clock: ManualClock::at(t0()),
        hasher: test_hasher(),
        policy: test_policy(),
    };

    let result = uc.execute(input(300)).await;

    assert!(
        matches!(result, Err(OtpServiceError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn should_rate_limit_issues_within_window() {
    let store = MockOtpStore::default();
    let clock = ManualClock::at(t0());
    let uc = usecase(store.clone(), clock.clone());

    for _ in 0..5 {
        uc.execute(input(300)).await.unwrap();
        clock.advance(Duration::seconds(10));
    }
    let result = uc.execute(input(300)).await;
    assert!(
        matches!(result, Err(OtpServiceError::RateLimited)),
        "expected RateLimited, got {result:?}"
    );

    // Window slides past the first issues.
    clock.advance(Duration::minutes(15));
    uc.execute(input(300)).await.unwrap();
}

#[tokio::test]
async fn should_not_rate_limit_when_limit_disabled() {
    let store = MockOtpStore::default();
    let mut uc = usecase(store.clone(), ManualClock::at(t0()));
    uc.policy.issue_limit = 0;

    for _ in 0..8 {
        uc.execute(input(300)).await.unwrap();
    }
    assert_eq!(store.snapshot().len(), 8);
}

#[tokio::test]
async fn should_reject_invalid_code_spec() {
    let uc = usecase(MockOtpStore::default(), ManualClock::at(t0()));

    let result = uc.execute(input(0)).await;
    assert!(
        matches!(result, Err(OtpServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn should_fail_with_storage_error_when_store_is_slow() {
    let store = MockOtpStore::with_delay(std::time::Duration::from_secs(5));
    let uc = usecase(store.clone(), ManualClock::at(t0()));

    let result = uc.execute(input(300)).await;

    assert!(
        matches!(result, Err(OtpServiceError::Storage(_))),
        "expected Storage, got {result:?}"
    );
    assert!(store.snapshot().is_empty());
}
