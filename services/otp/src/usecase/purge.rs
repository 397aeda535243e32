use tracing::info;

use vigil_domain::id::UserId;

use crate::domain::repository::OtpStore;
use crate::error::OtpServiceError;

/// Drops every record a user owns, e.g. after account deletion upstream.
pub struct PurgeUserOtpsUseCase<S: OtpStore> {
    pub store: S,
}

impl<S: OtpStore> PurgeUserOtpsUseCase<S> {
    pub async fn execute(&self, user_id: UserId) -> Result<u64, OtpServiceError> {
        let deleted = self.store.delete_by_user(user_id).await?;
        info!(%user_id, deleted, "user otps purged");
        Ok(deleted)
    }
}
