//! Zoho CRM adapter: OAuth refresh-token grant and lead creation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::repository::CrmApi;
use crate::domain::types::{CrmTokenGrant, Lead};
use crate::error::CrmError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const LEAD_SOURCE: &str = "OTP Onboarding";
const LEAD_STATUS: &str = "Verified";

#[derive(Debug, Clone)]
pub struct ZohoConfig {
    pub accounts_url: String,
    pub api_domain: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct ZohoCrmApi {
    client: reqwest::Client,
    config: Arc<ZohoConfig>,
}

/// Zoho answers a bad refresh token with 200 and an `error` field.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct LeadsResponse {
    #[serde(default)]
    data: Vec<LeadResult>,
}

#[derive(Deserialize)]
struct LeadResult {
    code: String,
    message: Option<String>,
    details: Option<LeadDetails>,
}

#[derive(Deserialize)]
struct LeadDetails {
    id: Option<String>,
}

impl ZohoCrmApi {
    pub fn new(config: ZohoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

fn lead_payload(lead: &Lead, now: DateTime<Utc>) -> Value {
    json!({
        "data": [{
            "First_Name": lead.first_name,
            "Last_Name": lead.last_name,
            "Email": lead.email,
            "Phone": lead.phone,
            "Lead_Source": LEAD_SOURCE,
            "Lead_Status": LEAD_STATUS,
            "Description": format!("Verified via WhatsApp OTP on {}", now.to_rfc3339()),
        }],
        "trigger": ["approval", "workflow", "blueprint"],
    })
}

fn lead_id_from_body(body: &str) -> Result<String, CrmError> {
    let parsed: LeadsResponse = serde_json::from_str(body)
        .map_err(|e| CrmError::Rejected(format!("unreadable response: {e}")))?;
    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| CrmError::Rejected("empty response".to_owned()))?;
    if first.code != "SUCCESS" {
        return Err(CrmError::Rejected(first.message.unwrap_or(first.code)));
    }
    first
        .details
        .and_then(|d| d.id)
        .ok_or_else(|| CrmError::Rejected("missing lead id".to_owned()))
}

impl CrmApi for ZohoCrmApi {
    async fn refresh_token(&self) -> Result<CrmTokenGrant, CrmError> {
        let url = format!(
            "{}/oauth/v2/token",
            self.config.accounts_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(url)
            .form(&[
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CrmError::AuthFailed(format!("token endpoint status {status}")));
        }

        let body: TokenResponse = resp.json().await?;
        match body.access_token {
            Some(access_token) => Ok(CrmTokenGrant {
                access_token,
                expires_in_secs: body.expires_in.unwrap_or(3600),
            }),
            None => Err(CrmError::AuthFailed(
                body.error.unwrap_or_else(|| "missing access_token".to_owned()),
            )),
        }
    }

    async fn create_lead(&self, access_token: &str, lead: &Lead) -> Result<String, CrmError> {
        let url = format!(
            "{}/crm/v3/Leads",
            self.config.api_domain.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Zoho-oauthtoken {access_token}"),
            )
            .json(&lead_payload(lead, Utc::now()))
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CrmError::AuthFailed("access token rejected".to_owned()));
        }

        let body = resp.text().await?;
        lead_id_from_body(&body)
    }
}
