use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use vigil_domain::id::{OtpId, UserId};
use vigil_domain::purpose::OtpPurpose;

use crate::error::OtpServiceError;

/// Where a record is in its lifecycle. Everything but `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStatus {
    Active,
    Consumed,
    Expired,
    Locked,
    /// Replaced by a newer code for the same `(user, purpose)`.
    Superseded,
}

impl OtpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Consumed => "consumed",
            Self::Expired => "expired",
            Self::Locked => "locked",
            Self::Superseded => "superseded",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }
}

impl fmt::Display for OtpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown otp status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OtpStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "consumed" => Ok(Self::Consumed),
            "expired" => Ok(Self::Expired),
            "locked" => Ok(Self::Locked),
            "superseded" => Ok(Self::Superseded),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Persisted one-time password. Holds only the keyed hash of the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: OtpId,
    pub user_id: UserId,
    pub purpose: OtpPurpose,
    pub code_hash: Vec<u8>,
    /// Failed verification attempts.
    pub attempts: u32,
    pub status: OtpStatus,
    /// Optimistic-concurrency counter; every write bumps it by one.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    /// When the record left `Active`, for any reason.
    pub closed_at: Option<DateTime<Utc>>,
}

impl OtpRecord {
    /// A fresh active record. `ttl` must be positive.
    pub fn issue(
        user_id: UserId,
        purpose: OtpPurpose,
        code_hash: Vec<u8>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: OtpId::new(),
            user_id,
            purpose,
            code_hash,
            attempts: 0,
            status: OtpStatus::Active,
            version: 0,
            created_at: now,
            expires_at: now + ttl,
            consumed_at: None,
            closed_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Neither consumed, expired, locked nor superseded.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == OtpStatus::Active && !self.is_expired_at(now)
    }

    pub fn remaining_attempts(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.attempts)
    }

    /// Decide what one verification attempt does to this record.
    ///
    /// Pure: the caller persists `Attempt::next` with a compare-and-swap on
    /// `self.version` and re-evaluates against a fresh read if that fails.
    pub fn attempt(&self, now: DateTime<Utc>, code_matches: bool, max_attempts: u32) -> Attempt {
        match self.status {
            OtpStatus::Active => {}
            OtpStatus::Consumed => return Attempt::settled(AttemptOutcome::AlreadyConsumed),
            OtpStatus::Expired => return Attempt::settled(AttemptOutcome::Expired),
            OtpStatus::Locked => return Attempt::settled(AttemptOutcome::Locked),
            OtpStatus::Superseded => return Attempt::settled(AttemptOutcome::NotFound),
        }

        if self.is_expired_at(now) {
            return Attempt::write(
                AttemptOutcome::Expired,
                self.closed(OtpStatus::Expired, now),
            );
        }

        // Only reachable if the cap was lowered after this record was issued.
        if self.attempts >= max_attempts {
            return Attempt::write(AttemptOutcome::Locked, self.closed(OtpStatus::Locked, now));
        }

        if code_matches {
            let mut next = self.closed(OtpStatus::Consumed, now);
            next.consumed_at = Some(now);
            return Attempt::write(AttemptOutcome::Consumed { at: now }, next);
        }

        let mut next = self.bumped();
        next.attempts = self.attempts + 1;
        if next.attempts >= max_attempts {
            next.status = OtpStatus::Locked;
            next.closed_at = Some(now);
            Attempt::write(AttemptOutcome::Locked, next)
        } else {
            let remaining_attempts = next.remaining_attempts(max_attempts);
            Attempt::write(AttemptOutcome::Mismatch { remaining_attempts }, next)
        }
    }

    fn bumped(&self) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next
    }

    fn closed(&self, status: OtpStatus, now: DateTime<Utc>) -> Self {
        let mut next = self.bumped();
        next.status = status;
        next.closed_at = Some(now);
        next
    }
}

/// Result of evaluating one verification attempt against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub outcome: AttemptOutcome,
    /// State to persist, or `None` when the record is already terminal.
    pub next: Option<OtpRecord>,
}

impl Attempt {
    fn settled(outcome: AttemptOutcome) -> Self {
        Self {
            outcome,
            next: None,
        }
    }

    fn write(outcome: AttemptOutcome, next: OtpRecord) -> Self {
        Self {
            outcome,
            next: Some(next),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Consumed { at: DateTime<Utc> },
    Mismatch { remaining_attempts: u32 },
    Locked,
    Expired,
    AlreadyConsumed,
    NotFound,
}

/// Shape of a code to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpec {
    pub length: usize,
    /// Distinct printable ASCII characters the code is drawn from.
    pub alphabet: String,
    pub ttl: Duration,
}

pub const MIN_CODE_LEN: usize = 4;
pub const MAX_CODE_LEN: usize = 16;
/// Longest code lifetime, in days.
pub const MAX_TTL_DAYS: i64 = 3650;

impl CodeSpec {
    pub fn numeric(length: usize, ttl: Duration) -> Self {
        Self {
            length,
            alphabet: "0123456789".to_owned(),
            ttl,
        }
    }

    pub fn with_ttl(&self, ttl: Duration) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), OtpServiceError> {
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&self.length) {
            return Err(OtpServiceError::Validation(format!(
                "code length must be between {MIN_CODE_LEN} and {MAX_CODE_LEN}"
            )));
        }
        let bytes = self.alphabet.as_bytes();
        if bytes.len() < 2 || !bytes.iter().all(u8::is_ascii_graphic) {
            return Err(OtpServiceError::Validation(
                "alphabet must hold at least two printable ASCII characters".to_owned(),
            ));
        }
        let mut seen = [false; 128];
        for &b in bytes {
            if std::mem::replace(&mut seen[usize::from(b)], true) {
                return Err(OtpServiceError::Validation(
                    "alphabet must not repeat characters".to_owned(),
                ));
            }
        }
        if self.ttl <= Duration::zero() || self.ttl > Duration::days(MAX_TTL_DAYS) {
            return Err(OtpServiceError::Validation(format!(
                "ttl must be positive and at most {MAX_TTL_DAYS} days"
            )));
        }
        Ok(())
    }
}

/// Limits applied by the lifecycle use cases.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    /// Failed attempts after which a record locks. At least 1.
    pub max_attempts: u32,
    /// Codes that may be issued per `(user, purpose)` within `issue_window`. 0 disables the limit.
    ///
    /// Best-effort: the count is read before the insert transaction, so issues
    /// racing on one pair can each pass the check and overshoot by their number.
    pub issue_limit: u32,
    pub issue_window: Duration,
    /// Upper bound on each storage round trip made by issue and verify.
    pub storage_timeout: std::time::Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            issue_limit: 5,
            issue_window: Duration::minutes(15),
            storage_timeout: std::time::Duration::from_secs(2),
        }
    }
}

/// A freshly issued code. The plaintext `code` exists only here and is handed
/// to the caller once for delivery.
#[derive(Clone)]
pub struct IssuedOtp {
    pub record: OtpRecord,
    pub code: String,
}

impl fmt::Debug for IssuedOtp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedOtp")
            .field("record", &self.record)
            .field("code", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub otp_id: OtpId,
    pub user_id: UserId,
    pub purpose: OtpPurpose,
    pub consumed_at: DateTime<Utc>,
}
