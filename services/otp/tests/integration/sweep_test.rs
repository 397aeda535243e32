use chrono::Duration;
use uuid::Uuid;

use vigil_domain::id::UserId;
use vigil_otp::domain::types::OtpStatus;
use vigil_otp::error::OtpServiceError;
use vigil_otp::usecase::purge::PurgeUserOtpsUseCase;
use vigil_otp::usecase::sweep::SweepOtpsUseCase;

use crate::helpers::{ManualClock, MockOtpStore, t0, test_record, test_user};

#[tokio::test]
async fn should_sweep_only_records_past_retention() {
    let mut consumed = test_record(test_user(), "111111", t0(), 300);
    consumed.status = OtpStatus::Consumed;
    consumed.consumed_at = Some(t0());
    consumed.closed_at = Some(t0());

    let other = UserId(Uuid::new_v4());
    let live = test_record(other, "222222", t0() + Duration::days(1), 300);
    let stale = test_record(UserId(Uuid::new_v4()), "333333", t0() - Duration::days(2), 300);

    let store = MockOtpStore::new(vec![consumed, live.clone(), stale]);
    let uc = SweepOtpsUseCase {
        store: store.clone(),
        clock: ManualClock::at(t0() + Duration::days(1) + Duration::seconds(1)),
    };

    let deleted = uc.execute(Duration::days(1)).await.unwrap();

    assert_eq!(deleted, 2);
    let remaining = store.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, live.id);
}

#[tokio::test]
async fn should_keep_recently_closed_records() {
    let mut locked = test_record(test_user(), "111111", t0(), 300);
    locked.status = OtpStatus::Locked;
    locked.closed_at = Some(t0() + Duration::seconds(30));

    let store = MockOtpStore::new(vec![locked]);
    let uc = SweepOtpsUseCase {
        store: store.clone(),
        clock: ManualClock::at(t0() + Duration::hours(1)),
    };

    assert_eq!(uc.execute(Duration::days(1)).await.unwrap(), 0);
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn should_reject_negative_retention() {
    let uc = SweepOtpsUseCase {
        store: MockOtpStore::default(),
        clock: ManualClock::at(t0()),
    };

    let result = uc.execute(Duration::seconds(-1)).await;
    assert!(matches!(result, Err(OtpServiceError::Validation(_))), "got {result:?}");
}

#[tokio::test]
async fn should_reject_retention_reaching_before_representable_time() {
    let store = MockOtpStore::new(vec![test_record(test_user(), "111111", t0(), 300)]);
    let uc = SweepOtpsUseCase {
        store: store.clone(),
        clock: ManualClock::at(t0()),
    };

    let result = uc.execute(Duration::days(365 * 300_000)).await;
    assert!(matches!(result, Err(OtpServiceError::Validation(_))), "got {result:?}");
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn should_purge_every_record_of_one_user() {
    let other = UserId(Uuid::new_v4());
    let store = MockOtpStore::new(vec![
        test_record(test_user(), "111111", t0(), 300),
        test_record(test_user(), "222222", t0() + Duration::seconds(1), 300),
        test_record(other, "333333", t0(), 300),
    ]);
    let uc = PurgeUserOtpsUseCase {
        store: store.clone(),
    };

    let deleted = uc.execute(test_user()).await.unwrap();

    assert_eq!(deleted, 2);
    let remaining = store.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, other);

    assert_eq!(uc.execute(test_user()).await.unwrap(), 0);
}
