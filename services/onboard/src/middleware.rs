use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::domain::repository::RateLimiter;
use crate::error::OnboardServiceError;
use crate::state::AppState;

pub const GENERAL_SCOPE: &str = "general";

/// Count one hit against `scope`/`key`; 429 once the window's budget is spent.
pub async fn enforce_rate_limit(
    state: &AppState,
    scope: &str,
    key: &str,
    max: u64,
) -> Result<(), OnboardServiceError> {
    if state.rate_limiter().check(scope, key, max).await? {
        Ok(())
    } else {
        tracing::warn!(scope, key, "rate limit exceeded");
        Err(OnboardServiceError::TooManyRequests)
    }
}

/// Client address in priority order: first `X-Forwarded-For` entry, `X-Real-IP`, then the
/// socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        return forwarded
            .to_str()
            .ok()
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse().ok());
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        return real_ip.to_str().ok().and_then(|s| s.trim().parse().ok());
    }
    peer.map(|addr| addr.ip())
}

/// Per-IP budget shared by every API route. Requests with no resolvable address pass through.
pub async fn general_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, OnboardServiceError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    if let Some(ip) = client_ip(request.headers(), peer) {
        enforce_rate_limit(
            &state,
            GENERAL_SCOPE,
            &ip.to_string(),
            state.rate_limits.max_general,
        )
        .await?;
    }
    Ok(next.run(request).await)
}
