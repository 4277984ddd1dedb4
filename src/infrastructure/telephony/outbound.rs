//! Outbound call and SMS actions
//!
//! Thin request issuers against the telephony backend's REST surface.
//! Unlike call-record persistence these are caller-initiated, so
//! failures propagate to the invoker.

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize)]
struct OutboundCallRequest<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct OutboundSmsRequest<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

/// Backend acknowledgment of an outbound action
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundReceipt {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Client for outbound telephony actions
pub struct TelephonyClient {
    http: reqwest::Client,
    base_url: String,
    /// Configured originating number, always supplied as sender
    from_number: String,
}

impl TelephonyClient {
    pub fn new(base_url: &str, from_number: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            from_number: from_number.into(),
        })
    }

    /// Initiate an outbound call that speaks `message` when answered
    pub async fn make_call(&self, to_number: &str, message: &str) -> Result<OutboundReceipt> {
        let request = OutboundCallRequest {
            to: to_number,
            from: &self.from_number,
            message,
        };

        let receipt = self
            .post(&format!("{}/calls/outbound", self.base_url), &request)
            .await?;
        info!(to = %to_number, "outbound call requested");
        Ok(receipt)
    }

    /// Send a text message
    pub async fn send_sms(&self, to_number: &str, body: &str) -> Result<OutboundReceipt> {
        let request = OutboundSmsRequest {
            to: to_number,
            from: &self.from_number,
            body,
        };

        let receipt = self
            .post(&format!("{}/sms/send", self.base_url), &request)
            .await?;
        info!(to = %to_number, "outbound SMS requested");
        Ok(receipt)
    }

    async fn post<T: Serialize>(&self, url: &str, payload: &T) -> Result<OutboundReceipt> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DomainError::Upstream(format!("outbound request: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::Upstream(format!(
                "outbound endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("outbound response: {}", e)))
    }
}
