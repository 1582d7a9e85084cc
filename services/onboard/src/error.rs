use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use onboard_core::error::error_response;
use onboard_domain::contact::{EmailError, NameError};
use onboard_domain::phone::PhoneError;

/// Onboarding service error variants returned to HTTP callers.
///
/// Messages are user-facing; they never include hashes or identifiers other than what the
/// caller already sent.
#[derive(Debug, thiserror::Error)]
pub enum OnboardServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("please wait 1 minute before requesting another OTP")]
    RateLimited,
    #[error("too many requests, please try again later")]
    TooManyRequests,
    #[error("failed to send OTP, please check your phone number and try again")]
    DeliveryFailed,
    #[error("invalid OTP request, please request a new OTP")]
    ChallengeNotFound,
    #[error("OTP already used, please request a new OTP")]
    AlreadyUsed,
    #[error("OTP expired, please request a new OTP")]
    Expired,
    #[error("too many failed attempts, please request a new OTP")]
    TooManyAttempts,
    #[error("invalid OTP, please try again")]
    InvalidOtp { attempts_remaining: u32 },
    #[error("invalid token")]
    InvalidToken,
    #[error("user not found")]
    UserNotFound,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl OnboardServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::RateLimited => "RATE_LIMITED",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::ChallengeNotFound => "CHALLENGE_NOT_FOUND",
            Self::AlreadyUsed => "OTP_ALREADY_USED",
            Self::Expired => "OTP_EXPIRED",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::InvalidOtp { .. } => "INVALID_OTP",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<PhoneError> for OnboardServiceError {
    fn from(e: PhoneError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<EmailError> for OnboardServiceError {
    fn from(e: EmailError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<NameError> for OnboardServiceError {
    fn from(e: NameError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for OnboardServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_)
            | Self::AlreadyUsed
            | Self::Expired
            | Self::TooManyAttempts
            | Self::InvalidOtp { .. } => StatusCode::BAD_REQUEST,
            Self::RateLimited | Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
            Self::ChallengeNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx already show up in the TraceLayer span; only the internal cause is logged.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let extra = match &self {
            Self::InvalidOtp { attempts_remaining } => {
                Some(json!({ "attempts_remaining": attempts_remaining }))
            }
            _ => None,
        };
        error_response(status, self.kind(), &self.to_string(), extra)
    }
}

/// Failure of the out-of-band delivery channel. Always triggers challenge rollback.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("delivery timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of a single CRM API call.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("crm authentication failed: {0}")]
    AuthFailed(String),
    #[error("crm rejected lead: {0}")]
    Rejected(String),
    #[error("crm request timed out")]
    Timeout,
    #[error("crm transport error: {0}")]
    Transport(String),
}

/// Terminal outcome of a failed sync. Absorbed by the sync orchestrator, never sent to clients.
#[derive(Debug, thiserror::Error)]
pub enum CrmSyncError {
    #[error("crm auth failed: {0}")]
    AuthFailed(String),
    #[error("crm sync failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<reqwest::Error> for CrmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}
