//! WhatsApp Cloud API delivery channel.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use onboard_domain::phone::Phone;

use crate::domain::repository::DeliveryChannel;
use crate::domain::types::DeliveryReceipt;
use crate::error::DeliveryError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub graph_url: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: String,
    pub template_name: String,
    pub template_language: String,
}

#[derive(Clone)]
pub struct WhatsAppChannel {
    client: reqwest::Client,
    config: Arc<WhatsAppConfig>,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Deserialize)]
struct GraphError {
    message: Option<String>,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.config.graph_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        )
    }

    /// Probe the phone number id with the configured token. Logged at startup only.
    pub async fn verify_config(&self) -> bool {
        let url = format!(
            "{}/{}/{}",
            self.config.graph_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        );
        match self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "whatsapp config probe rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "whatsapp config probe failed");
                false
            }
        }
    }
}

/// Template message carrying the code as its single body parameter.
fn template_payload(to: &str, otp: &str, template: &str, language: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "template",
        "template": {
            "name": template,
            "language": { "code": language },
            "components": [
                {
                    "type": "body",
                    "parameters": [{ "type": "text", "text": otp }]
                }
            ]
        }
    })
}

impl DeliveryChannel for WhatsAppChannel {
    async fn send_otp(&self, phone: &Phone, otp: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let payload = template_payload(
            phone.digits(),
            otp,
            &self.config.template_name,
            &self.config.template_language,
        );

        let resp = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GraphErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("status {status}"));
            return Err(DeliveryError::Provider(message));
        }

        let message_id = serde_json::from_str::<SendMessageResponse>(&body)
            .ok()
            .and_then(|r| r.messages.into_iter().next())
            .map(|m| m.id);
        Ok(DeliveryReceipt { message_id })
    }
}
