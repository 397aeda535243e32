use chrono::{DateTime, Utc};
use tracing::info;

use vigil_domain::id::UserId;
use vigil_domain::purpose::OtpPurpose;

use crate::domain::code::{CodeHasher, generate_code};
use crate::domain::repository::{Clock, OtpStore, UserDirectory};
use crate::domain::types::{CodeSpec, IssuedOtp, OtpPolicy, OtpRecord};
use crate::error::OtpServiceError;
use crate::usecase::bounded;

pub struct IssueOtpInput {
    pub user_id: UserId,
    pub purpose: OtpPurpose,
    pub spec: CodeSpec,
}

pub struct IssueOtpUseCase<U, S, C>
where
    U: UserDirectory,
    S: OtpStore,
    C: Clock,
{
    pub users: U,
    pub store: S,
    pub clock: C,
    pub hasher: CodeHasher,
    pub policy: OtpPolicy,
}

impl<U, S, C> IssueOtpUseCase<U, S, C>
where
    U: UserDirectory,
    S: OtpStore,
    C: Clock,
{
    /// Issue a new code for `(user, purpose)`, superseding any active one.
    /// The plaintext code in the result is never stored or logged.
    pub async fn execute(&self, input: IssueOtpInput) -> Result<IssuedOtp, OtpServiceError> {
        input.spec.validate()?;
        let timeout = self.policy.storage_timeout;

        // 1. Owner must exist → 404
        let known = bounded(timeout, "user lookup", self.users.exists(input.user_id)).await?;
        if !known {
            return Err(OtpServiceError::UserNotFound);
        }

        // 2. Per-pair issue budget → 429. Counted outside the insert transaction,
        //    so concurrent issues for one pair may overshoot by the number of racers.
        let now = self.clock.now();
        if self.policy.issue_limit > 0 {
            let since = now
                .checked_sub_signed(self.policy.issue_window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let issued = bounded(
                timeout,
                "count issued otps",
                self.store
                    .count_issued_since(input.user_id, input.purpose, since),
            )
            .await?;
            if issued >= u64::from(self.policy.issue_limit) {
                info!(
                    user_id = %input.user_id,
                    purpose = %input.purpose,
                    issued,
                    "otp issue rate limit reached"
                );
                return Err(OtpServiceError::RateLimited);
            }
        }

        // 3. Generate + hash; only the hash leaves this function besides the return value
        let code = generate_code(&input.spec);
        let code_hash = self.hasher.hash(input.user_id, input.purpose, &code);
        let record = OtpRecord::issue(
            input.user_id,
            input.purpose,
            code_hash,
            now,
            input.spec.ttl,
        );

        // 4. Supersede predecessor + insert atomically
        let superseded = bounded(
            timeout,
            "supersede and insert otp",
            self.store.supersede_and_insert(&record),
        )
        .await?;

        info!(
            otp_id = %record.id,
            user_id = %record.user_id,
            purpose = %record.purpose,
            superseded,
            expires_at = %record.expires_at,
            "otp issued"
        );
        Ok(IssuedOtp { record, code })
    }
}
