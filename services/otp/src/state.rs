use anyhow::anyhow;
use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::config::OtpConfig;
use crate::domain::code::CodeHasher;
use crate::domain::types::{CodeSpec, OtpPolicy};
use crate::infra::clock::SystemClock;
use crate::infra::db::{DbOtpStore, DbUserDirectory};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub hasher: CodeHasher,
    pub policy: OtpPolicy,
    /// Shape of issued codes; requests may only override the ttl.
    pub code_spec: CodeSpec,
    pub max_ttl: Duration,
    pub retention: Duration,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &OtpConfig) -> anyhow::Result<Self> {
        let hasher = CodeHasher::new(config.hash_secret.as_bytes())
            .map_err(|_| anyhow!("OTP_HASH_SECRET is not a usable HMAC key"))?;
        Ok(Self {
            db,
            hasher,
            policy: config.policy()?,
            code_spec: config.default_code_spec()?,
            max_ttl: config.max_ttl()?,
            retention: config.retention()?,
        })
    }

    pub fn otp_store(&self) -> DbOtpStore {
        DbOtpStore {
            db: self.db.clone(),
        }
    }

    pub fn user_directory(&self) -> DbUserDirectory {
        DbUserDirectory {
            db: self.db.clone(),
        }
    }

    pub fn clock(&self) -> SystemClock {
        SystemClock
    }
}
