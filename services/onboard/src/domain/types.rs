use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use onboard_domain::lead::LeadName;

/// Server-side record of one outstanding OTP issuance.
///
/// Lifecycle: `Created` → `Used` | `Expired` (time) | `AttemptsExhausted` (count).
/// Failed verifications loop back to `Created` while attempts stay within the limit.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub id: Uuid,
    /// Canonical E.164.
    pub phone: String,
    pub name: String,
    pub email: String,
    pub secret_hash: String,
    pub is_used: bool,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Unusable at or after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Verified identity. `phone` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_verified: bool,
    pub crm_synced: bool,
    pub crm_id: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile carried from a consumed challenge into the user store.
/// Existing users get name/email overwritten (last writer wins).
#[derive(Debug, Clone)]
pub struct VerifiedProfile {
    pub phone: String,
    pub name: String,
    pub email: String,
    pub verified_at: DateTime<Utc>,
}

/// CRM lead payload derived from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl Lead {
    pub fn from_user(user: &User) -> Self {
        let LeadName { first, last } = LeadName::split(&user.name);
        Self {
            first_name: first,
            last_name: last,
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Access token returned by the CRM's OAuth refresh endpoint.
#[derive(Debug, Clone)]
pub struct CrmTokenGrant {
    pub access_token: String,
    pub expires_in_secs: i64,
}

/// Provider acknowledgement for a delivered OTP message.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

/// Tunables for OTP generation.
#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    /// Number of decimal digits in the secret.
    pub length: u32,
    pub expiry: Duration,
}

impl OtpSettings {
    pub fn new(length: u32, expiry_minutes: i64) -> Self {
        Self {
            length: length.clamp(MIN_OTP_LENGTH, MAX_OTP_LENGTH),
            expiry: Duration::minutes(expiry_minutes.max(1)),
        }
    }

    pub fn expiry_minutes(&self) -> i64 {
        self.expiry.num_minutes()
    }
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_LENGTH, DEFAULT_OTP_EXPIRY_MINUTES)
    }
}

/// Verification attempts allowed per challenge. The attempt that pushes the
/// counter past this value is rejected regardless of the code.
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;

/// Per-phone cooldown between issuances, in seconds.
pub const ISSUE_COOLDOWN_SECS: i64 = 60;

pub const DEFAULT_OTP_LENGTH: u32 = 6;
pub const MIN_OTP_LENGTH: u32 = 4;
pub const MAX_OTP_LENGTH: u32 = 10;
pub const DEFAULT_OTP_EXPIRY_MINUTES: i64 = 5;

/// A cached CRM token is refreshed once it is within this many seconds of expiry.
pub const CRM_TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lead creation attempts per sync, token resolution included.
pub const CRM_MAX_ATTEMPTS: usize = 3;

/// Wait after failed attempt `i` before attempt `i + 1`. Nothing is awaited after the last
/// attempt, so with three attempts only the first two entries are ever slept.
pub const CRM_RETRY_DELAYS_SECS: [u64; 3] = [1, 3, 9];
