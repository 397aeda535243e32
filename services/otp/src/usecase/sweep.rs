use chrono::Duration;
use tracing::info;

use crate::domain::repository::{Clock, OtpStore};
use crate::error::OtpServiceError;

pub struct SweepOtpsUseCase<S, C>
where
    S: OtpStore,
    C: Clock,
{
    pub store: S,
    pub clock: C,
}

impl<S, C> SweepOtpsUseCase<S, C>
where
    S: OtpStore,
    C: Clock,
{
    /// Delete records that closed or expired more than `retention` ago.
    /// Returns the number deleted.
    pub async fn execute(&self, retention: Duration) -> Result<u64, OtpServiceError> {
        if retention < Duration::zero() {
            return Err(OtpServiceError::Validation(
                "retention must not be negative".to_owned(),
            ));
        }
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(retention)
            .ok_or_else(|| OtpServiceError::Validation("retention is out of range".to_owned()))?;
        let deleted = self.store.delete_closed_before(cutoff).await?;
        info!(deleted, %cutoff, "otp sweep finished");
        Ok(deleted)
    }
}
