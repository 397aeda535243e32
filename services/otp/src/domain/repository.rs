#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use vigil_domain::id::{OtpId, UserId};
use vigil_domain::purpose::OtpPurpose;

use crate::domain::types::OtpRecord;
use crate::error::OtpServiceError;

/// Durable store of OTP records.
///
/// Implementations must keep at most one `Active` record per `(user_id, purpose)`
/// and must never modify a record that is no longer `Active`.
pub trait OtpStore: Send + Sync {
    /// Count records created for the pair at or after `since`, in any status.
    async fn count_issued_since(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
        since: DateTime<Utc>,
    ) -> Result<u64, OtpServiceError>;

    /// Mark the pair's active record (if any) `Superseded` and insert `record`,
    /// as one atomic step. Returns the number of records superseded.
    async fn supersede_and_insert(&self, record: &OtpRecord) -> Result<u64, OtpServiceError>;

    /// Most recent record for the pair that has not been superseded.
    async fn find_current(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, OtpServiceError>;

    async fn find_by_id(&self, id: OtpId) -> Result<Option<OtpRecord>, OtpServiceError>;

    /// Replace the stored record with `next` only if it is still `Active` at
    /// `expected_version`. Returns `false` when another writer got there first.
    async fn compare_and_swap(
        &self,
        expected_version: i64,
        next: &OtpRecord,
    ) -> Result<bool, OtpServiceError>;

    /// Delete records whose `closed_at` or `expires_at` is before `cutoff`.
    async fn delete_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OtpServiceError>;

    /// Delete every record owned by `user_id`.
    async fn delete_by_user(&self, user_id: UserId) -> Result<u64, OtpServiceError>;
}

/// Read-only view of user accounts owned by another service.
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, id: UserId) -> Result<bool, OtpServiceError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
