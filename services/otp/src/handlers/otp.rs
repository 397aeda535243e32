use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_core::serde::to_rfc3339_ms;
use vigil_domain::id::UserId;
use vigil_domain::purpose::OtpPurpose;

use crate::error::OtpServiceError;
use crate::state::AppState;
use crate::usecase::issue::{IssueOtpInput, IssueOtpUseCase};
use crate::usecase::verify::{VerifyOtpInput, VerifyOtpUseCase};

#[derive(Deserialize)]
pub struct IssueOtpRequest {
    pub user_id: Uuid,
    pub purpose: String,
    /// Overrides the configured lifetime; capped by `OTP_MAX_TTL_SECS`.
    pub ttl_secs: Option<i64>,
}

#[derive(Serialize)]
pub struct IssueOtpResponse {
    pub id: Uuid,
    pub code: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub user_id: Uuid,
    pub purpose: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: OtpPurpose,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub consumed_at: DateTime<Utc>,
}

fn parse_purpose(raw: &str) -> Result<OtpPurpose, OtpServiceError> {
    raw.parse::<OtpPurpose>()
        .map_err(|e| OtpServiceError::Validation(e.to_string()))
}

pub async fn issue_otp(
    State(state): State<AppState>,
    Json(body): Json<IssueOtpRequest>,
) -> Result<(StatusCode, Json<IssueOtpResponse>), OtpServiceError> {
    let purpose = parse_purpose(&body.purpose)?;
    let spec = match body.ttl_secs {
        None => state.code_spec.clone(),
        Some(secs) => {
            let max_secs = state.max_ttl.num_seconds();
            let ttl = Duration::try_seconds(secs)
                .filter(|_| secs > 0 && secs <= max_secs)
                .ok_or_else(|| {
                    OtpServiceError::Validation(format!("ttl_secs must be between 1 and {max_secs}"))
                })?;
            state.code_spec.with_ttl(ttl)
        }
    };

    let usecase = IssueOtpUseCase {
        users: state.user_directory(),
        store: state.otp_store(),
        clock: state.clock(),
        hasher: state.hasher.clone(),
        policy: state.policy,
    };
    let issued = usecase
        .execute(IssueOtpInput {
            user_id: UserId(body.user_id),
            purpose,
            spec,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueOtpResponse {
            id: issued.record.id.0,
            code: issued.code,
            expires_at: issued.record.expires_at,
        }),
    ))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, OtpServiceError> {
    let purpose = parse_purpose(&body.purpose)?;
    let usecase = VerifyOtpUseCase {
        store: state.otp_store(),
        clock: state.clock(),
        hasher: state.hasher.clone(),
        policy: state.policy,
    };
    let verified = usecase
        .execute(VerifyOtpInput {
            user_id: UserId(body.user_id),
            purpose,
            code: body.code,
        })
        .await?;

    Ok(Json(VerifyOtpResponse {
        id: verified.otp_id.0,
        user_id: verified.user_id.0,
        purpose: verified.purpose,
        consumed_at: verified.consumed_at,
    }))
}
