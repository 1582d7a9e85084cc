use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use onboard_auth_types::token::issue_session_token;
use onboard_domain::id::ChallengeId;
use onboard_domain::phone::Phone;

use crate::domain::types::User;
use crate::error::OnboardServiceError;
use crate::middleware::enforce_rate_limit;
use crate::state::AppState;
use crate::usecase::otp::{RequestOtpInput, RequestOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};

const REQUEST_OTP_SCOPE: &str = "request_otp";
const VERIFY_OTP_SCOPE: &str = "verify_otp";

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, OnboardServiceError> {
    body.map(|Json(b)| b)
        .map_err(|rejection| OnboardServiceError::Validation(rejection.body_text()))
}

// ── POST /api/auth/request-otp ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RequestOtpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct RequestOtpResponse {
    pub otp_id: ChallengeId,
    /// Minutes until the code expires.
    pub expires_in: i64,
}

pub async fn request_otp(
    State(state): State<AppState>,
    body: Result<Json<RequestOtpRequest>, JsonRejection>,
) -> Result<Json<RequestOtpResponse>, OnboardServiceError> {
    let body = json_body(body)?;

    // Unparseable phones are left for the use case to reject as a validation error.
    if let Ok(phone) = Phone::normalize(&body.phone, &state.default_country_code) {
        enforce_rate_limit(
            &state,
            REQUEST_OTP_SCOPE,
            phone.as_str(),
            state.rate_limits.max_requests,
        )
        .await?;
    }

    let usecase = RequestOtpUseCase {
        challenges: state.challenge_repo(),
        delivery: state.whatsapp.clone(),
        hasher: state.hasher(),
        settings: state.otp,
        default_country_code: state.default_country_code.clone(),
    };
    let output = usecase
        .execute(RequestOtpInput {
            name: body.name,
            phone: body.phone,
            email: body.email,
        })
        .await?;

    Ok(Json(RequestOtpResponse {
        otp_id: output.challenge_id,
        expires_in: output.expires_in_minutes,
    }))
}

// ── POST /api/auth/verify-otp ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub otp_id: String,
    #[serde(default)]
    pub otp: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_verified: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            is_verified: user.is_verified,
        }
    }
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub user: UserSummary,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    body: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>, OnboardServiceError> {
    let body = json_body(body)?;

    let otp_id = body.otp_id.trim();
    if !otp_id.is_empty() {
        enforce_rate_limit(
            &state,
            VERIFY_OTP_SCOPE,
            otp_id,
            state.rate_limits.max_verify_attempts,
        )
        .await?;
    }

    let usecase = VerifyOtpUseCase {
        challenges: state.challenge_repo(),
        users: state.user_repo(),
        hasher: state.hasher(),
        crm_sync: state.crm_sync(),
        default_country_code: state.default_country_code.clone(),
    };
    let output = usecase
        .execute(VerifyOtpInput {
            challenge_id: body.otp_id,
            otp: body.otp,
            phone: body.phone,
        })
        .await?;

    let user = output.user;
    let (token, _exp) = issue_session_token(
        user.id,
        &user.phone,
        &user.email,
        &state.jwt_secret,
        state.jwt_expiry_secs,
    )
    .map_err(|e| OnboardServiceError::Internal(e.into()))?;

    Ok(Json(VerifyOtpResponse {
        token,
        user: user.into(),
    }))
}
