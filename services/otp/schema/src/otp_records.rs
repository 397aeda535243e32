use sea_orm::entity::prelude::*;

/// One issued one-time password. Only the keyed hash of the code is stored.
///
/// `status` is one of `active`, `consumed`, `expired`, `locked`, `superseded`.
/// A partial unique index keeps at most one `active` row per `(user_id, purpose)`.
/// `version` is bumped by every conditional update.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub code_hash: Vec<u8>,
    pub attempts: i32,
    pub status: String,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub consumed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
