use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpChallenges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpChallenges::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpChallenges::Phone).string_len(16).not_null())
                    .col(ColumnDef::new(OtpChallenges::Name).string_len(100).not_null())
                    .col(ColumnDef::new(OtpChallenges::Email).string().not_null())
                    .col(ColumnDef::new(OtpChallenges::SecretHash).string().not_null())
                    .col(
                        ColumnDef::new(OtpChallenges::IsUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Cooldown lookups: latest challenge per phone.
        manager
            .create_index(
                Index::create()
                    .table(OtpChallenges::Table)
                    .col(OtpChallenges::Phone)
                    .col(OtpChallenges::CreatedAt)
                    .name("idx_otp_challenges_phone_created_at")
                    .to_owned(),
            )
            .await?;

        // Expiry sweep.
        manager
            .create_index(
                Index::create()
                    .table(OtpChallenges::Table)
                    .col(OtpChallenges::ExpiresAt)
                    .name("idx_otp_challenges_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpChallenges::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OtpChallenges {
    Table,
    Id,
    Phone,
    Name,
    Email,
    SecretHash,
    IsUsed,
    Attempts,
    ExpiresAt,
    CreatedAt,
}
