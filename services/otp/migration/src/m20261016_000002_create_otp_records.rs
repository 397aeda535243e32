use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

// At most one active code per (user_id, purpose). Written as raw SQL because
// the index carries a predicate.
const CREATE_ACTIVE_PAIR_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     uq_otp_records_active_pair ON otp_records (user_id, purpose) \
     WHERE status = 'active'";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to users: deleting a user must not touch OTP rows.
        manager
            .create_table(
                Table::create()
                    .table(OtpRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpRecords::UserId).uuid().not_null())
                    .col(ColumnDef::new(OtpRecords::Purpose).string_len(32).not_null())
                    .col(ColumnDef::new(OtpRecords::CodeHash).binary().not_null())
                    .col(
                        ColumnDef::new(OtpRecords::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(OtpRecords::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(OtpRecords::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OtpRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OtpRecords::ConsumedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OtpRecords::ClosedAt).timestamp_with_time_zone())
                    .check(Expr::col(OtpRecords::ExpiresAt).gt(Expr::col(OtpRecords::CreatedAt)))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::UserId)
                    .col(OtpRecords::Purpose)
                    .col(OtpRecords::CreatedAt)
                    .name("idx_otp_records_pair_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::ClosedAt)
                    .name("idx_otp_records_closed_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::ExpiresAt)
                    .name("idx_otp_records_expires_at")
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(CREATE_ACTIVE_PAIR_INDEX)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OtpRecords {
    Table,
    Id,
    UserId,
    Purpose,
    CodeHash,
    Attempts,
    Status,
    Version,
    CreatedAt,
    ExpiresAt,
    ConsumedAt,
    ClosedAt,
}
