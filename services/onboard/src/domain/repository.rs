//! Ports between the use cases and the outside world.
//!
//! Async methods are declared as `fn -> impl Future + Send` so use cases stay spawnable on the
//! multi-threaded runtime when they are generic over these traits. Implementations write
//! plain `async fn`.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use onboard_domain::phone::Phone;

use crate::domain::types::{
    CrmTokenGrant, DeliveryReceipt, Lead, OtpChallenge, User, VerifiedProfile,
};
use crate::error::{CrmError, DeliveryError, OnboardServiceError};

/// Durable store of OTP challenges. Every mutation is a single-row atomic statement.
pub trait OtpChallengeRepository: Send + Sync {
    fn create(
        &self,
        challenge: &OtpChallenge,
    ) -> impl Future<Output = Result<(), OnboardServiceError>> + Send;

    /// Both id and phone must match.
    fn find_by_id_and_phone(
        &self,
        id: Uuid,
        phone: &str,
    ) -> impl Future<Output = Result<Option<OtpChallenge>, OnboardServiceError>> + Send;

    /// Atomically increment `attempts` and return the new value.
    /// `None` if the challenge disappeared in the meantime.
    fn increment_attempts(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<i32>, OnboardServiceError>> + Send;

    /// Flip `is_used` false → true. Returns `false` if it was already used (or gone),
    /// so at most one caller ever consumes a challenge.
    fn mark_used(&self, id: Uuid)
    -> impl Future<Output = Result<bool, OnboardServiceError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), OnboardServiceError>> + Send;

    /// Whether any challenge for `phone` was created within the last `within_secs` seconds.
    fn has_recent_for_phone(
        &self,
        phone: &str,
        within_secs: i64,
    ) -> impl Future<Output = Result<bool, OnboardServiceError>> + Send;

    /// Housekeeping: remove challenges whose `expires_at` is at or before `now`.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, OnboardServiceError>> + Send;
}

/// Durable store of verified users, keyed by phone.
pub trait UserRepository: Send + Sync {
    fn find_by_phone(
        &self,
        phone: &str,
    ) -> impl Future<Output = Result<Option<User>, OnboardServiceError>> + Send;

    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<User>, OnboardServiceError>> + Send;

    /// Insert or update by phone in one statement: overwrite name/email, set
    /// `is_verified`, refresh `last_login`. CRM fields of an existing row are untouched.
    fn upsert_verified(
        &self,
        profile: &VerifiedProfile,
    ) -> impl Future<Output = Result<User, OnboardServiceError>> + Send;

    /// Record a confirmed lead: `crm_synced = true` with its external id.
    fn mark_crm_synced(
        &self,
        id: Uuid,
        crm_id: &str,
    ) -> impl Future<Output = Result<(), OnboardServiceError>> + Send;

    /// Record a failed sync. Only touches rows still unsynced, so a lead confirmed by an
    /// overlapping sync is never reverted.
    fn mark_crm_failed(&self, id: Uuid)
    -> impl Future<Output = Result<(), OnboardServiceError>> + Send;
}

/// Out-of-band OTP delivery. One request, no retries.
pub trait DeliveryChannel: Send + Sync {
    fn send_otp(
        &self,
        phone: &Phone,
        otp: &str,
    ) -> impl Future<Output = Result<DeliveryReceipt, DeliveryError>> + Send;
}

/// Raw CRM API surface. Token caching and retries live in the use case layer.
pub trait CrmApi: Send + Sync {
    fn refresh_token(&self) -> impl Future<Output = Result<CrmTokenGrant, CrmError>> + Send;

    /// Create one lead and return its external id.
    fn create_lead(
        &self,
        access_token: &str,
        lead: &Lead,
    ) -> impl Future<Output = Result<String, CrmError>> + Send;
}

/// One-way salted hash for OTP secrets.
pub trait OtpHasher: Send + Sync {
    fn hash(&self, otp: &str) -> Result<String, OnboardServiceError>;

    /// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable.
    fn verify(&self, otp: &str, hash: &str) -> Result<bool, OnboardServiceError>;
}

/// Fires the CRM sync for a freshly verified user without waiting for it.
pub trait CrmSyncScheduler: Send + Sync {
    fn schedule(&self, user: User);
}

/// Fixed-window request counter used in front of the use cases.
pub trait RateLimiter: Send + Sync {
    /// Count one hit for `key`; `Ok(false)` when the window's budget is spent.
    fn check(
        &self,
        scope: &str,
        key: &str,
        max: u64,
    ) -> impl Future<Output = Result<bool, OnboardServiceError>> + Send;
}
