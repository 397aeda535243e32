use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// OTP service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum OtpServiceError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("forbidden")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("no otp issued")]
    NotFound,
    #[error("otp expired")]
    Expired,
    #[error("otp mismatch, {remaining_attempts} attempt(s) remaining")]
    Mismatch { remaining_attempts: u32 },
    #[error("otp locked after too many failed attempts")]
    Locked,
    #[error("otp already consumed")]
    AlreadyConsumed,
    #[error("too many otps issued")]
    RateLimited,
    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

/// Message returned for every verification failure.
const INVALID_OTP_MESSAGE: &str = "invalid or expired code";

impl OtpServiceError {
    /// Precise machine-readable kind, for logs and internal callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NotFound => "OTP_NOT_FOUND",
            Self::Expired => "OTP_EXPIRED",
            Self::Mismatch { .. } => "OTP_MISMATCH",
            Self::Locked => "OTP_LOCKED",
            Self::AlreadyConsumed => "OTP_ALREADY_CONSUMED",
            Self::RateLimited => "RATE_LIMITED",
            Self::Storage(_) => "STORAGE",
        }
    }

    /// True for the failures a code submission can produce.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::Expired
                | Self::Mismatch { .. }
                | Self::Locked
                | Self::AlreadyConsumed
        )
    }

    /// Kind exposed over HTTP. Verification failures collapse into one kind so a
    /// client cannot tell a wrong code from an expired or unknown one.
    pub fn public_kind(&self) -> &'static str {
        if self.is_verification_failure() {
            "INVALID_OTP"
        } else {
            self.kind()
        }
    }

    fn public_message(&self) -> String {
        match self {
            e if e.is_verification_failure() => INVALID_OTP_MESSAGE.to_owned(),
            Self::Storage(_) => "storage unavailable".to_owned(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for OtpServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::NotFound
            | Self::Expired
            | Self::Mismatch { .. }
            | Self::Locked
            | Self::AlreadyConsumed => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        // TraceLayer records method/uri/status for every request; only storage
        // failures need the anyhow chain logged here.
        if let Self::Storage(ref e) = self {
            tracing::error!(error = ?e, kind = "STORAGE", "storage error");
        }
        let body = serde_json::json!({
            "kind": self.public_kind(),
            "message": self.public_message(),
        });
        (status, axum::Json(body)).into_response()
    }
}
