use serde::Deserialize;

use onboard_core::config::Config;

use crate::domain::types::{DEFAULT_OTP_EXPIRY_MINUTES, DEFAULT_OTP_LENGTH, OtpSettings};
use crate::infra::whatsapp::WhatsAppConfig;
use crate::infra::zoho::ZohoConfig;

/// Onboarding service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_secs")]
    pub jwt_expiry_secs: u64,
    /// TCP port to listen on (default 5000). Env var: `ONBOARD_PORT`.
    #[serde(default = "default_port")]
    pub onboard_port: u16,

    #[serde(default = "default_otp_length")]
    pub otp_length: u32,
    #[serde(default = "default_otp_expiry_minutes")]
    pub otp_expiry_minutes: i64,
    /// Prefixed to phone numbers entered without `+`.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    #[serde(default = "default_meta_graph_url")]
    pub meta_graph_url: String,
    #[serde(default = "default_meta_api_version")]
    pub meta_api_version: String,
    pub meta_phone_number_id: String,
    pub meta_access_token: String,
    #[serde(default = "default_meta_template_name")]
    pub meta_template_name: String,
    #[serde(default = "default_meta_template_language")]
    pub meta_template_language: String,

    #[serde(default = "default_zoho_accounts_url")]
    pub zoho_accounts_url: String,
    pub zoho_api_domain: String,
    pub zoho_client_id: String,
    pub zoho_client_secret: String,
    pub zoho_refresh_token: String,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u64,
    #[serde(default = "default_rate_limit_max_verify_attempts")]
    pub rate_limit_max_verify_attempts: u64,
    #[serde(default = "default_rate_limit_max_general")]
    pub rate_limit_max_general: u64,

    #[serde(default = "default_otp_sweep_interval_secs")]
    pub otp_sweep_interval_secs: u64,
}

impl Config for OnboardConfig {}

impl OnboardConfig {
    pub fn otp_settings(&self) -> OtpSettings {
        OtpSettings::new(self.otp_length, self.otp_expiry_minutes)
    }

    pub fn whatsapp(&self) -> WhatsAppConfig {
        WhatsAppConfig {
            graph_url: self.meta_graph_url.clone(),
            api_version: self.meta_api_version.clone(),
            phone_number_id: self.meta_phone_number_id.clone(),
            access_token: self.meta_access_token.clone(),
            template_name: self.meta_template_name.clone(),
            template_language: self.meta_template_language.clone(),
        }
    }

    pub fn zoho(&self) -> ZohoConfig {
        ZohoConfig {
            accounts_url: self.zoho_accounts_url.clone(),
            api_domain: self.zoho_api_domain.clone(),
            client_id: self.zoho_client_id.clone(),
            client_secret: self.zoho_client_secret.clone(),
            refresh_token: self.zoho_refresh_token.clone(),
        }
    }
}

fn default_jwt_expiry_secs() -> u64 {
    onboard_auth_types::token::SESSION_TOKEN_EXP
}

fn default_port() -> u16 {
    5000
}

fn default_otp_length() -> u32 {
    DEFAULT_OTP_LENGTH
}

fn default_otp_expiry_minutes() -> i64 {
    DEFAULT_OTP_EXPIRY_MINUTES
}

fn default_country_code() -> String {
    "91".to_owned()
}

fn default_meta_graph_url() -> String {
    "https://graph.facebook.com".to_owned()
}

fn default_meta_api_version() -> String {
    "v18.0".to_owned()
}

fn default_meta_template_name() -> String {
    "otp_verification".to_owned()
}

fn default_meta_template_language() -> String {
    "en".to_owned()
}

fn default_zoho_accounts_url() -> String {
    "https://accounts.zoho.com".to_owned()
}

fn default_rate_limit_window_secs() -> u64 {
    900
}

fn default_rate_limit_max_requests() -> u64 {
    3
}

fn default_rate_limit_max_verify_attempts() -> u64 {
    5
}

fn default_rate_limit_max_general() -> u64 {
    100
}

fn default_otp_sweep_interval_secs() -> u64 {
    60
}
