use tracing::{debug, info, warn};

use vigil_domain::id::UserId;
use vigil_domain::purpose::OtpPurpose;

use crate::domain::code::CodeHasher;
use crate::domain::repository::{Clock, OtpStore};
use crate::domain::types::{AttemptOutcome, OtpPolicy, OtpRecord, VerificationResult};
use crate::error::OtpServiceError;
use crate::usecase::bounded;

/// Longest submitted code accepted before hashing.
const MAX_SUBMITTED_CODE_LEN: usize = 64;

pub struct VerifyOtpInput {
    pub user_id: UserId,
    pub purpose: OtpPurpose,
    pub code: String,
}

pub struct VerifyOtpUseCase<S, C>
where
    S: OtpStore,
    C: Clock,
{
    pub store: S,
    pub clock: C,
    pub hasher: CodeHasher,
    pub policy: OtpPolicy,
}

impl<S, C> VerifyOtpUseCase<S, C>
where
    S: OtpStore,
    C: Clock,
{
    /// Check a submitted code against the pair's current record.
    ///
    /// At most one call ever succeeds for a given record: the consuming write is
    /// a compare-and-swap on the record version, and every loser re-reads and
    /// observes the terminal state.
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<VerificationResult, OtpServiceError> {
        if input.code.is_empty() || input.code.len() > MAX_SUBMITTED_CODE_LEN {
            return Err(OtpServiceError::Validation(format!(
                "code must be 1 to {MAX_SUBMITTED_CODE_LEN} bytes"
            )));
        }
        let timeout = self.policy.storage_timeout;

        let Some(mut record) = bounded(
            timeout,
            "find current otp",
            self.store.find_current(input.user_id, input.purpose),
        )
        .await?
        else {
            debug!(user_id = %input.user_id, purpose = %input.purpose, "no otp to verify");
            return Err(OtpServiceError::NotFound);
        };

        // The hash never changes for a record, so one comparison serves every round.
        let code_matches = self.hasher.matches(
            input.user_id,
            input.purpose,
            &input.code,
            &record.code_hash,
        );

        // An active record takes at most `max_attempts` writes before it is
        // terminal, and every lost swap means one of them landed. One round past
        // that always sees a terminal record or wins its own swap.
        let rounds = self.policy.max_attempts.saturating_add(1);
        let mut round = 1;
        loop {
            let now = self.clock.now();
            let attempt = record.attempt(now, code_matches, self.policy.max_attempts);
            let Some(next) = attempt.next else {
                return settle(&record, attempt.outcome);
            };

            let swapped = bounded(
                timeout,
                "compare-and-swap otp",
                self.store.compare_and_swap(record.version, &next),
            )
            .await?;
            if swapped {
                return settle(&next, attempt.outcome);
            }
            if round >= rounds {
                warn!(otp_id = %record.id, rounds, "otp verification lost every compare-and-swap round");
                return Err(OtpServiceError::Storage(anyhow::anyhow!(
                    "otp {} under contention",
                    record.id
                )));
            }

            debug!(otp_id = %record.id, round, "otp changed underneath verification, re-reading");
            record = match bounded(timeout, "find otp by id", self.store.find_by_id(record.id)).await? {
                Some(fresh) => fresh,
                // Purged between read and write.
                None => return Err(OtpServiceError::NotFound),
            };
            round += 1;
        }
    }
}

/// Turn an attempt outcome into the caller-facing result. `record` is the
/// state the outcome was decided against (or written as).
fn settle(record: &OtpRecord, outcome: AttemptOutcome) -> Result<VerificationResult, OtpServiceError> {
    match outcome {
        AttemptOutcome::Consumed { at } => {
            info!(
                otp_id = %record.id,
                user_id = %record.user_id,
                purpose = %record.purpose,
                "otp verified"
            );
            Ok(VerificationResult {
                otp_id: record.id,
                user_id: record.user_id,
                purpose: record.purpose,
                consumed_at: at,
            })
        }
        AttemptOutcome::Mismatch { remaining_attempts } => {
            info!(otp_id = %record.id, remaining_attempts, "otp mismatch");
            Err(OtpServiceError::Mismatch { remaining_attempts })
        }
        AttemptOutcome::Locked => {
            info!(otp_id = %record.id, attempts = record.attempts, "otp locked");
            Err(OtpServiceError::Locked)
        }
        AttemptOutcome::Expired => {
            debug!(otp_id = %record.id, "otp expired");
            Err(OtpServiceError::Expired)
        }
        AttemptOutcome::AlreadyConsumed => {
            info!(otp_id = %record.id, "otp replayed after consumption");
            Err(OtpServiceError::AlreadyConsumed)
        }
        AttemptOutcome::NotFound => Err(OtpServiceError::NotFound),
    }
}
