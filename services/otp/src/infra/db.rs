use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
    TransactionError, TransactionTrait,
};

use vigil_domain::id::{OtpId, UserId};
use vigil_domain::purpose::OtpPurpose;
use vigil_otp_schema::{otp_records, users};

use crate::domain::repository::{OtpStore, UserDirectory};
use crate::domain::types::{OtpRecord, OtpStatus};
use crate::error::OtpServiceError;

/// A concurrent issue for the same pair can trip the active-pair unique index;
/// the losing transaction is retried this many times in total.
const ISSUE_TX_ATTEMPTS: u32 = 3;

// ── OtpRecord store ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpStore {
    pub db: DatabaseConnection,
}

impl OtpStore for DbOtpStore {
    async fn count_issued_since(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
        since: DateTime<Utc>,
    ) -> Result<u64, OtpServiceError> {
        let count = otp_records::Entity::find()
            .filter(otp_records::Column::UserId.eq(user_id.0))
            .filter(otp_records::Column::Purpose.eq(purpose.as_str()))
            .filter(otp_records::Column::CreatedAt.gte(since))
            .count(&self.db)
            .await
            .context("count issued otps")?;
        Ok(count)
    }

    async fn supersede_and_insert(&self, record: &OtpRecord) -> Result<u64, OtpServiceError> {
        let mut attempt = 1;
        loop {
            let result = self
                .db
                .transaction::<_, u64, DbErr>(|txn| {
                    let record = record.clone();
                    Box::pin(async move {
                        let superseded = supersede_active(txn, &record).await?;
                        insert_record(txn, &record).await?;
                        Ok(superseded)
                    })
                })
                .await;
            match result {
                Ok(superseded) => return Ok(superseded),
                Err(TransactionError::Transaction(ref e))
                    if attempt < ISSUE_TX_ATTEMPTS && is_unique_violation(e) =>
                {
                    tracing::debug!(
                        user_id = %record.user_id,
                        purpose = %record.purpose,
                        attempt,
                        "concurrent issue for pair, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context("supersede and insert otp")
                        .into());
                }
            }
        }
    }

    async fn find_current(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, OtpServiceError> {
        let model = otp_records::Entity::find()
            .filter(otp_records::Column::UserId.eq(user_id.0))
            .filter(otp_records::Column::Purpose.eq(purpose.as_str()))
            .filter(otp_records::Column::Status.ne(OtpStatus::Superseded.as_str()))
            .order_by_desc(otp_records::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find current otp")?;
        model.map(record_from_model).transpose()
    }

    async fn find_by_id(&self, id: OtpId) -> Result<Option<OtpRecord>, OtpServiceError> {
        let model = otp_records::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find otp by id")?;
        model.map(record_from_model).transpose()
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        next: &OtpRecord,
    ) -> Result<bool, OtpServiceError> {
        let attempts = i32::try_from(next.attempts).context("attempts out of range")?;
        let result = otp_records::Entity::update_many()
            .col_expr(otp_records::Column::Attempts, Expr::value(attempts))
            .col_expr(otp_records::Column::Status, Expr::value(next.status.as_str()))
            .col_expr(otp_records::Column::Version, Expr::value(next.version))
            .col_expr(otp_records::Column::ConsumedAt, Expr::value(next.consumed_at))
            .col_expr(otp_records::Column::ClosedAt, Expr::value(next.closed_at))
            .filter(otp_records::Column::Id.eq(next.id.0))
            .filter(otp_records::Column::Version.eq(expected_version))
            .filter(otp_records::Column::Status.eq(OtpStatus::Active.as_str()))
            .exec(&self.db)
            .await
            .context("compare-and-swap otp")?;
        Ok(result.rows_affected == 1)
    }

    async fn delete_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OtpServiceError> {
        let result = otp_records::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(otp_records::Column::ClosedAt.lt(cutoff))
                    .add(otp_records::Column::ExpiresAt.lt(cutoff)),
            )
            .exec(&self.db)
            .await
            .context("delete closed otps")?;
        Ok(result.rows_affected)
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<u64, OtpServiceError> {
        let result = otp_records::Entity::delete_many()
            .filter(otp_records::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .context("delete otps by user")?;
        Ok(result.rows_affected)
    }
}

async fn supersede_active(txn: &DatabaseTransaction, record: &OtpRecord) -> Result<u64, DbErr> {
    let result = otp_records::Entity::update_many()
        .col_expr(
            otp_records::Column::Status,
            Expr::value(OtpStatus::Superseded.as_str()),
        )
        .col_expr(otp_records::Column::ClosedAt, Expr::value(record.created_at))
        .col_expr(
            otp_records::Column::Version,
            Expr::col(otp_records::Column::Version).add(1),
        )
        .filter(otp_records::Column::UserId.eq(record.user_id.0))
        .filter(otp_records::Column::Purpose.eq(record.purpose.as_str()))
        .filter(otp_records::Column::Status.eq(OtpStatus::Active.as_str()))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}

async fn insert_record(txn: &DatabaseTransaction, record: &OtpRecord) -> Result<(), DbErr> {
    otp_records::ActiveModel {
        id: Set(record.id.0),
        user_id: Set(record.user_id.0),
        purpose: Set(record.purpose.as_str().to_owned()),
        code_hash: Set(record.code_hash.clone()),
        attempts: Set(0),
        status: Set(OtpStatus::Active.as_str().to_owned()),
        version: Set(record.version),
        created_at: Set(record.created_at),
        expires_at: Set(record.expires_at),
        consumed_at: Set(None),
        closed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn record_from_model(model: otp_records::Model) -> Result<OtpRecord, OtpServiceError> {
    let purpose = model
        .purpose
        .parse::<OtpPurpose>()
        .with_context(|| format!("otp {} has a corrupt purpose", model.id))?;
    let status = model
        .status
        .parse::<OtpStatus>()
        .with_context(|| format!("otp {} has a corrupt status", model.id))?;
    let attempts = u32::try_from(model.attempts)
        .with_context(|| format!("otp {} has negative attempts", model.id))?;
    Ok(OtpRecord {
        id: OtpId(model.id),
        user_id: UserId(model.user_id),
        purpose,
        code_hash: model.code_hash,
        attempts,
        status,
        version: model.version,
        created_at: model.created_at,
        expires_at: model.expires_at,
        consumed_at: model.consumed_at,
        closed_at: model.closed_at,
    })
}

// ── User directory ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserDirectory {
    pub db: DatabaseConnection,
}

impl UserDirectory for DbUserDirectory {
    async fn exists(&self, id: UserId) -> Result<bool, OtpServiceError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.is_some())
    }
}
