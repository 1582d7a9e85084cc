//! Best-effort synchronization of verified users to the CRM.
//!
//! Sync runs detached from the verify request. Its only observable effects are the user's
//! `crm_synced`/`crm_id` columns and log lines.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::Instrument as _;

use crate::domain::repository::{CrmApi, CrmSyncScheduler, UserRepository};
use crate::domain::types::{
    CRM_MAX_ATTEMPTS, CRM_RETRY_DELAYS_SECS, CRM_TOKEN_REFRESH_MARGIN_SECS, CrmTokenGrant, Lead,
    User,
};
use crate::error::{CrmError, CrmSyncError};

// ── Token cache ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn from_grant(grant: CrmTokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            access_token: grant.access_token,
            expires_at: now + chrono::Duration::seconds(grant.expires_in_secs),
        }
    }

    fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - chrono::Duration::seconds(CRM_TOKEN_REFRESH_MARGIN_SECS)
    }
}

/// Process-wide CRM bearer token. Shared by every in-flight sync through an `Arc`.
///
/// Concurrent callers that all find the token stale each refresh; the last write wins.
#[derive(Debug, Default)]
pub struct CrmTokenCache {
    token: RwLock<Option<CachedToken>>,
}

impl CrmTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, refreshing it first when absent or within the refresh margin.
    pub async fn access_token<A: CrmApi>(&self, api: &A) -> Result<String, CrmError> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.is_fresh_at(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let grant = api.refresh_token().await?;
        let fresh = CachedToken::from_grant(grant, Utc::now());
        let access_token = fresh.access_token.clone();
        *self.token.write().await = Some(fresh);
        tracing::info!("crm access token refreshed");
        Ok(access_token)
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }
}

// ── Retry policy ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    /// `delays[i]` is awaited after failed attempt `i` (0-based). Past the end, the last
    /// entry repeats.
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt_index: usize) -> Duration {
        self.delays
            .get(attempt_index)
            .or(self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: CRM_MAX_ATTEMPTS,
            delays: CRM_RETRY_DELAYS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }
}

// ── CRM client ───────────────────────────────────────────────────────────────

/// Lead creation with lazy token refresh and bounded retries.
#[derive(Clone)]
pub struct CrmClient<A: CrmApi> {
    pub api: A,
    pub tokens: Arc<CrmTokenCache>,
    pub retry: RetryPolicy,
}

impl<A: CrmApi> CrmClient<A> {
    pub fn new(api: A, tokens: Arc<CrmTokenCache>) -> Self {
        Self {
            api,
            tokens,
            retry: RetryPolicy::default(),
        }
    }

    /// Create a lead, returning the CRM's lead id.
    ///
    /// Every attempt re-resolves the access token. A failed token refresh ends the whole
    /// call with [`CrmSyncError::AuthFailed`]; any other failure is retried per policy.
    pub async fn create_lead(&self, lead: &Lead) -> Result<String, CrmSyncError> {
        let max_attempts = self.retry.max_attempts;
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=max_attempts {
            let token = self.tokens.access_token(&self.api).await.map_err(|e| {
                tracing::error!(error = %e, "crm token refresh failed");
                CrmSyncError::AuthFailed(e.to_string())
            })?;

            match self.api.create_lead(&token, lead).await {
                Ok(lead_id) => return Ok(lead_id),
                Err(e) => {
                    tracing::warn!(attempt, max_attempts, error = %e, "crm lead attempt failed");
                    if matches!(e, CrmError::AuthFailed(_)) {
                        // Token revoked server-side before its advertised expiry.
                        self.tokens.invalidate().await;
                    }
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.retry.delay_after(attempt - 1)).await;
            }
        }

        Err(CrmSyncError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}

// ── Sync use case ────────────────────────────────────────────────────────────

pub struct SyncUserToCrmUseCase<U, A>
where
    U: UserRepository,
    A: CrmApi,
{
    pub users: U,
    pub crm: CrmClient<A>,
}

impl<U, A> SyncUserToCrmUseCase<U, A>
where
    U: UserRepository,
    A: CrmApi,
{
    /// Push `user` to the CRM and record the outcome on the user row.
    /// Every failure ends here as a log line; nothing is returned to the caller.
    pub async fn execute(&self, user: &User) {
        let lead = Lead::from_user(user);
        let persisted = match self.crm.create_lead(&lead).await {
            Ok(lead_id) => {
                tracing::info!(user_id = %user.id, crm_id = %lead_id, "user synced to crm");
                self.users.mark_crm_synced(user.id, &lead_id).await
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "crm sync failed");
                self.users.mark_crm_failed(user.id).await
            }
        };

        if let Err(e) = persisted {
            tracing::error!(user_id = %user.id, error = %e, "failed to persist crm sync status");
        }
    }
}

/// Runs each sync on its own tokio task; `schedule` returns immediately.
pub struct SpawnedCrmSync<U, A>
where
    U: UserRepository,
    A: CrmApi,
{
    pub usecase: Arc<SyncUserToCrmUseCase<U, A>>,
}

impl<U, A> Clone for SpawnedCrmSync<U, A>
where
    U: UserRepository,
    A: CrmApi,
{
    fn clone(&self) -> Self {
        Self {
            usecase: Arc::clone(&self.usecase),
        }
    }
}

impl<U, A> CrmSyncScheduler for SpawnedCrmSync<U, A>
where
    U: UserRepository + 'static,
    A: CrmApi + 'static,
{
    fn schedule(&self, user: User) {
        let usecase = Arc::clone(&self.usecase);
        let span = tracing::info_span!("crm_sync", user_id = %user.id);
        tokio::spawn(async move { usecase.execute(&user).await }.instrument(span));
    }
}
