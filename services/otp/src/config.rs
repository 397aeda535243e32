use std::fmt;

use anyhow::{Context as _, bail, ensure};
use chrono::Duration;

use vigil_core::config::{parsed_or, required, string_or};

use crate::domain::types::{CodeSpec, OtpPolicy};

/// Minimum length of `OTP_HASH_SECRET`, in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Upper bound for every duration setting: ten years, in seconds.
const MAX_DURATION_SECS: i64 = 10 * 365 * 86_400;

fn seconds(var: &str, secs: i64) -> anyhow::Result<Duration> {
    Duration::try_seconds(secs).with_context(|| format!("{var} is out of range"))
}

/// OTP service configuration loaded from environment variables.
pub struct OtpConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Key for the code HMAC. Env var: `OTP_HASH_SECRET`.
    pub hash_secret: String,
    /// TCP port to listen on (default 3114). Env var: `OTP_PORT`.
    pub port: u16,
    pub code_length: usize,
    pub code_alphabet: String,
    /// Lifetime of a code when the request names none.
    pub ttl_secs: i64,
    /// Longest lifetime a request may ask for.
    pub max_ttl_secs: i64,
    pub max_attempts: u32,
    /// Codes per `(user, purpose)` per window; 0 disables.
    pub issue_limit: u32,
    pub issue_window_secs: i64,
    pub storage_timeout_ms: u64,
    /// How long closed records are kept before sweeping.
    pub retention_secs: i64,
    /// Background sweep period; 0 disables the sweeper.
    pub sweep_interval_secs: u64,
}

impl OtpConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            hash_secret: required("OTP_HASH_SECRET")?,
            port: parsed_or("OTP_PORT", 3114)?,
            code_length: parsed_or("OTP_CODE_LENGTH", 6)?,
            code_alphabet: string_or("OTP_CODE_ALPHABET", "0123456789"),
            ttl_secs: parsed_or("OTP_TTL_SECS", 300)?,
            max_ttl_secs: parsed_or("OTP_MAX_TTL_SECS", 3600)?,
            max_attempts: parsed_or("OTP_MAX_ATTEMPTS", 5)?,
            issue_limit: parsed_or("OTP_ISSUE_LIMIT", 5)?,
            issue_window_secs: parsed_or("OTP_ISSUE_WINDOW_SECS", 900)?,
            storage_timeout_ms: parsed_or("OTP_STORAGE_TIMEOUT_MS", 2000)?,
            retention_secs: parsed_or("OTP_RETENTION_SECS", 86_400)?,
            sweep_interval_secs: parsed_or("OTP_SWEEP_INTERVAL_SECS", 600)?,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.hash_secret.len() >= MIN_SECRET_LEN,
            "OTP_HASH_SECRET must be at least {MIN_SECRET_LEN} bytes"
        );
        ensure!(self.max_attempts >= 1, "OTP_MAX_ATTEMPTS must be at least 1");
        ensure!(
            self.max_ttl_secs <= MAX_DURATION_SECS,
            "OTP_MAX_TTL_SECS must be at most {MAX_DURATION_SECS}"
        );
        ensure!(
            self.ttl_secs > 0 && self.ttl_secs <= self.max_ttl_secs,
            "OTP_TTL_SECS must be in 1..=OTP_MAX_TTL_SECS"
        );
        ensure!(
            self.issue_window_secs > 0 && self.issue_window_secs <= MAX_DURATION_SECS,
            "OTP_ISSUE_WINDOW_SECS must be in 1..={MAX_DURATION_SECS}"
        );
        ensure!(self.storage_timeout_ms > 0, "OTP_STORAGE_TIMEOUT_MS must be positive");
        ensure!(
            self.retention_secs >= 0 && self.retention_secs <= MAX_DURATION_SECS,
            "OTP_RETENTION_SECS must be in 0..={MAX_DURATION_SECS}"
        );
        if let Err(e) = self.default_code_spec()?.validate() {
            bail!("OTP_CODE_LENGTH/OTP_CODE_ALPHABET: {e}");
        }
        Ok(())
    }

    pub fn policy(&self) -> anyhow::Result<OtpPolicy> {
        Ok(OtpPolicy {
            max_attempts: self.max_attempts,
            issue_limit: self.issue_limit,
            issue_window: seconds("OTP_ISSUE_WINDOW_SECS", self.issue_window_secs)?,
            storage_timeout: std::time::Duration::from_millis(self.storage_timeout_ms),
        })
    }

    pub fn default_code_spec(&self) -> anyhow::Result<CodeSpec> {
        Ok(CodeSpec {
            length: self.code_length,
            alphabet: self.code_alphabet.clone(),
            ttl: seconds("OTP_TTL_SECS", self.ttl_secs)?,
        })
    }

    pub fn max_ttl(&self) -> anyhow::Result<Duration> {
        seconds("OTP_MAX_TTL_SECS", self.max_ttl_secs)
    }

    pub fn retention(&self) -> anyhow::Result<Duration> {
        seconds("OTP_RETENTION_SECS", self.retention_secs)
    }
}

impl fmt::Debug for OtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpConfig")
            .field("port", &self.port)
            .field("code_length", &self.code_length)
            .field("code_alphabet", &self.code_alphabet)
            .field("ttl_secs", &self.ttl_secs)
            .field("max_ttl_secs", &self.max_ttl_secs)
            .field("max_attempts", &self.max_attempts)
            .field("issue_limit", &self.issue_limit)
            .field("issue_window_secs", &self.issue_window_secs)
            .field("storage_timeout_ms", &self.storage_timeout_ms)
            .field("retention_secs", &self.retention_secs)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .finish_non_exhaustive()
    }
}
