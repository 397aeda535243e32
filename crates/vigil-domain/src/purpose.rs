//! The closed set of reasons an OTP can be issued for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What an OTP proves once verified. Immutable for the lifetime of a record.
///
/// Wire and storage format: kebab-case string (`"email-verification"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    EmailVerification,
    PhoneVerification,
    TwoFactor,
    PasswordReset,
}

impl OtpPurpose {
    pub const ALL: [OtpPurpose; 4] = [
        Self::EmailVerification,
        Self::PhoneVerification,
        Self::TwoFactor,
        Self::PasswordReset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email-verification",
            Self::PhoneVerification => "phone-verification",
            Self::TwoFactor => "two-factor",
            Self::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown otp purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl FromStr for OtpPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPurpose(s.to_owned()))
    }
}
