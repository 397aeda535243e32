#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use vigil_domain::id::{OtpId, UserId};
use vigil_domain::purpose::OtpPurpose;
use vigil_otp::domain::code::CodeHasher;
use vigil_otp::domain::repository::{Clock, OtpStore, UserDirectory};
use vigil_otp::domain::types::{CodeSpec, OtpPolicy, OtpRecord, OtpStatus};
use vigil_otp::error::OtpServiceError;

// ── MockOtpStore ─────────────────────────────────────────────────────────────

/// In-memory store with the same supersede and compare-and-swap rules as the
/// database. Every call yields once so concurrent futures interleave.
#[derive(Clone, Default)]
pub struct MockOtpStore {
    pub records: Arc<Mutex<Vec<OtpRecord>>>,
    /// Added to every call, for timeout tests.
    pub delay: Option<std::time::Duration>,
}

impl MockOtpStore {
    pub fn new(records: Vec<OtpRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            delay: None,
        }
    }

    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<OtpRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn active_for(&self, user_id: UserId, purpose: OtpPurpose) -> Vec<OtpRecord> {
        self.snapshot()
            .into_iter()
            .filter(|r| r.user_id == user_id && r.purpose == purpose)
            .filter(|r| r.status == OtpStatus::Active)
            .collect()
    }

    async fn pause(&self) {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
}

impl OtpStore for MockOtpStore {
    async fn count_issued_since(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
        since: DateTime<Utc>,
    ) -> Result<u64, OtpServiceError> {
        self.pause().await;
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.purpose == purpose && r.created_at >= since)
            .count() as u64)
    }

    async fn supersede_and_insert(&self, record: &OtpRecord) -> Result<u64, OtpServiceError> {
        self.pause().await;
        let mut records = self.records.lock().unwrap();
        let mut superseded = 0;
        for r in records.iter_mut().filter(|r| {
            r.user_id == record.user_id
                && r.purpose == record.purpose
                && r.status == OtpStatus::Active
        }) {
            r.status = OtpStatus::Superseded;
            r.closed_at = Some(record.created_at);
            r.version += 1;
            superseded += 1;
        }
        records.push(record.clone());
        Ok(superseded)
    }

    async fn find_current(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, OtpServiceError> {
        self.pause().await;
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.purpose == purpose)
            .filter(|r| r.status != OtpStatus::Superseded)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: OtpId) -> Result<Option<OtpRecord>, OtpServiceError> {
        self.pause().await;
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        next: &OtpRecord,
    ) -> Result<bool, OtpServiceError> {
        self.pause().await;
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == next.id) {
            Some(r) if r.status == OtpStatus::Active && r.version == expected_version => {
                *r = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OtpServiceError> {
        self.pause().await;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !(r.closed_at.is_some_and(|c| c < cutoff) || r.expires_at < cutoff));
        Ok((before - records.len()) as u64)
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<u64, OtpServiceError> {
        self.pause().await;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}

// ── MockUserDirectory ────────────────────────────────────────────────────────

pub struct MockUserDirectory {
    pub users: Vec<UserId>,
}

impl MockUserDirectory {
    pub fn new(users: Vec<UserId>) -> Self {
        Self { users }
    }

    pub fn empty() -> Self {
        Self { users: vec![] }
    }
}

impl UserDirectory for MockUserDirectory {
    async fn exists(&self, id: UserId) -> Result<bool, OtpServiceError> {
        Ok(self.users.contains(&id))
    }
}

// ── ManualClock ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub const TEST_SECRET: &[u8] = b"integration-test-secret-integration";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
}

pub fn test_user() -> UserId {
    UserId(Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap())
}

pub fn test_hasher() -> CodeHasher {
    CodeHasher::new(TEST_SECRET).unwrap()
}

pub fn test_policy() -> OtpPolicy {
    OtpPolicy {
        max_attempts: 3,
        issue_limit: 5,
        issue_window: Duration::minutes(15),
        storage_timeout: std::time::Duration::from_secs(1),
    }
}

pub fn test_spec(ttl_secs: i64) -> CodeSpec {
    CodeSpec::numeric(8, Duration::seconds(ttl_secs))
}

/// An active record for `user_id` holding the hash of `code`, created at `created_at`.
pub fn test_record(user_id: UserId, code: &str, created_at: DateTime<Utc>, ttl_secs: i64) -> OtpRecord {
    OtpRecord::issue(
        user_id,
        OtpPurpose::TwoFactor,
        test_hasher().hash(user_id, OtpPurpose::TwoFactor, code),
        created_at,
        Duration::seconds(ttl_secs),
    )
}
