use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_auth_types::identity::IdentityHeaders;
use vigil_domain::id::UserId;

use crate::error::OtpServiceError;
use crate::state::AppState;
use crate::usecase::purge::PurgeUserOtpsUseCase;
use crate::usecase::sweep::SweepOtpsUseCase;

#[derive(Deserialize)]
pub struct SweepParams {
    /// Overrides `OTP_RETENTION_SECS` for this run.
    pub retention_secs: Option<i64>,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

fn require_admin(identity: &IdentityHeaders) -> Result<(), OtpServiceError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(OtpServiceError::Forbidden)
    }
}

pub async fn sweep_otps(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Query(params): Query<SweepParams>,
) -> Result<Json<DeletedResponse>, OtpServiceError> {
    require_admin(&identity)?;
    let retention = match params.retention_secs {
        None => state.retention,
        Some(secs) => Duration::try_seconds(secs).ok_or_else(|| {
            OtpServiceError::Validation("retention_secs is out of range".to_owned())
        })?,
    };

    let usecase = SweepOtpsUseCase {
        store: state.otp_store(),
        clock: state.clock(),
    };
    let deleted = usecase.execute(retention).await?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn purge_user_otps(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, OtpServiceError> {
    require_admin(&identity)?;
    let usecase = PurgeUserOtpsUseCase {
        store: state.otp_store(),
    };
    let deleted = usecase.execute(UserId(user_id)).await?;
    Ok(Json(DeletedResponse { deleted }))
}
