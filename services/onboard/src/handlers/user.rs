use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use onboard_auth_types::{bearer::BearerToken, token::validate_session_token};
use onboard_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};
use onboard_domain::id::UserId;

use crate::domain::types::User;
use crate::error::OnboardServiceError;
use crate::state::AppState;
use crate::usecase::user::GetUserUseCase;

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_verified: bool,
    pub crm_synced: bool,
    pub crm_id: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            is_verified: user.is_verified,
            crm_synced: user.crm_synced,
            crm_id: user.crm_id,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub async fn get_me(
    State(state): State<AppState>,
    bearer: Result<BearerToken, StatusCode>,
) -> Result<Json<MeResponse>, OnboardServiceError> {
    let BearerToken(token) = bearer.map_err(|_| OnboardServiceError::InvalidToken)?;
    let session = validate_session_token(&token, &state.jwt_secret)
        .map_err(|_| OnboardServiceError::InvalidToken)?;

    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(UserId(session.user_id)).await?;
    Ok(Json(user.into()))
}
