use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use onboard_schema::{otp_challenges, users};

use crate::domain::repository::{OtpChallengeRepository, UserRepository};
use crate::domain::types::{OtpChallenge, User, VerifiedProfile};
use crate::error::OnboardServiceError;

// ── OTP challenge repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpChallengeRepository {
    pub db: DatabaseConnection,
}

impl OtpChallengeRepository for DbOtpChallengeRepository {
    async fn create(&self, challenge: &OtpChallenge) -> Result<(), OnboardServiceError> {
        otp_challenges::ActiveModel {
            id: Set(challenge.id),
            phone: Set(challenge.phone.clone()),
            name: Set(challenge.name.clone()),
            email: Set(challenge.email.clone()),
            secret_hash: Set(challenge.secret_hash.clone()),
            is_used: Set(challenge.is_used),
            attempts: Set(challenge.attempts),
            expires_at: Set(challenge.expires_at),
            created_at: Set(challenge.created_at),
        }
        .insert(&self.db)
        .await
        .context("create otp challenge")?;
        Ok(())
    }

    async fn find_by_id_and_phone(
        &self,
        id: Uuid,
        phone: &str,
    ) -> Result<Option<OtpChallenge>, OnboardServiceError> {
        let model = otp_challenges::Entity::find_by_id(id)
            .filter(otp_challenges::Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .context("find otp challenge by id and phone")?;
        Ok(model.map(challenge_from_model))
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<Option<i32>, OnboardServiceError> {
        // UPDATE ... SET attempts = attempts + 1 RETURNING *: concurrent verifies never lose
        // an increment.
        let rows = otp_challenges::Entity::update_many()
            .col_expr(
                otp_challenges::Column::Attempts,
                Expr::col(otp_challenges::Column::Attempts).add(1),
            )
            .filter(otp_challenges::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await
            .context("increment otp attempts")?;
        Ok(rows.into_iter().next().map(|m| m.attempts))
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, OnboardServiceError> {
        let result = otp_challenges::Entity::update_many()
            .col_expr(otp_challenges::Column::IsUsed, Expr::value(true))
            .filter(otp_challenges::Column::Id.eq(id))
            .filter(otp_challenges::Column::IsUsed.eq(false))
            .exec(&self.db)
            .await
            .context("mark otp challenge used")?;
        Ok(result.rows_affected == 1)
    }

    async fn delete(&self, id: Uuid) -> Result<(), OnboardServiceError> {
        otp_challenges::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete otp challenge")?;
        Ok(())
    }

    async fn has_recent_for_phone(
        &self,
        phone: &str,
        within_secs: i64,
    ) -> Result<bool, OnboardServiceError> {
        let since = Utc::now() - Duration::seconds(within_secs);
        let count = otp_challenges::Entity::find()
            .filter(otp_challenges::Column::Phone.eq(phone))
            .filter(otp_challenges::Column::CreatedAt.gte(since))
            .count(&self.db)
            .await
            .context("count recent otp challenges")?;
        Ok(count > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, OnboardServiceError> {
        let result = otp_challenges::Entity::delete_many()
            .filter(otp_challenges::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .context("delete expired otp challenges")?;
        Ok(result.rows_affected)
    }
}

fn challenge_from_model(model: otp_challenges::Model) -> OtpChallenge {
    OtpChallenge {
        id: model.id,
        phone: model.phone,
        name: model.name,
        email: model.email,
        secret_hash: model.secret_hash,
        is_used: model.is_used,
        attempts: model.attempts,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, OnboardServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .context("find user by phone")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, OnboardServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn upsert_verified(&self, profile: &VerifiedProfile) -> Result<User, OnboardServiceError> {
        let now = profile.verified_at;
        let model = users::Entity::insert(users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(profile.name.clone()),
            email: Set(profile.email.clone()),
            phone: Set(profile.phone.clone()),
            is_verified: Set(true),
            crm_synced: Set(false),
            crm_id: Set(None),
            last_login: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(users::Column::Phone)
                .update_columns([
                    users::Column::Name,
                    users::Column::Email,
                    users::Column::IsVerified,
                    users::Column::LastLogin,
                    users::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_with_returning(&self.db)
        .await
        .context("upsert verified user")?;
        Ok(user_from_model(model))
    }

    async fn mark_crm_synced(&self, id: Uuid, crm_id: &str) -> Result<(), OnboardServiceError> {
        users::ActiveModel {
            id: Set(id),
            crm_synced: Set(true),
            crm_id: Set(Some(crm_id.to_owned())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark user crm synced")?;
        Ok(())
    }

    async fn mark_crm_failed(&self, id: Uuid) -> Result<(), OnboardServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::CrmSynced, Expr::value(false))
            .col_expr(users::Column::CrmId, Expr::value(Option::<String>::None))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::CrmSynced.eq(false))
            .exec(&self.db)
            .await
            .context("mark user crm sync failed")?;
        if result.rows_affected == 0 {
            tracing::debug!(user_id = %id, "user already synced, keeping crm id");
        }
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        is_verified: model.is_verified,
        crm_synced: model.crm_synced,
        crm_id: model.crm_id,
        last_login: model.last_login,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
