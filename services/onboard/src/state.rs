use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::domain::types::OtpSettings;
use crate::infra::cache::RedisRateLimiter;
use crate::infra::db::{DbOtpChallengeRepository, DbUserRepository};
use crate::infra::hash::Argon2OtpHasher;
use crate::infra::whatsapp::WhatsAppChannel;
use crate::infra::zoho::ZohoCrmApi;
use crate::usecase::crm_sync::{CrmClient, SpawnedCrmSync, SyncUserToCrmUseCase};

/// Rate-limit budgets applied by the handlers before any use case runs.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub window_secs: u64,
    pub max_requests: u64,
    pub max_verify_attempts: u64,
    /// Per client IP, across every API route.
    pub max_general: u64,
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
    pub otp: OtpSettings,
    pub default_country_code: String,
    pub rate_limits: RateLimits,
    pub whatsapp: WhatsAppChannel,
    pub crm: CrmClient<ZohoCrmApi>,
}

impl AppState {
    pub fn challenge_repo(&self) -> DbOtpChallengeRepository {
        DbOtpChallengeRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn hasher(&self) -> Argon2OtpHasher {
        Argon2OtpHasher
    }

    pub fn rate_limiter(&self) -> RedisRateLimiter {
        RedisRateLimiter {
            pool: self.redis.clone(),
            window_secs: self.rate_limits.window_secs,
        }
    }

    pub fn crm_sync(&self) -> SpawnedCrmSync<DbUserRepository, ZohoCrmApi> {
        SpawnedCrmSync {
            usecase: Arc::new(SyncUserToCrmUseCase {
                users: self.user_repo(),
                crm: self.crm.clone(),
            }),
        }
    }
}
