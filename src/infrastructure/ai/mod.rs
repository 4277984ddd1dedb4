//! External text-generation client
//!
//! HTTP adapter for the [`ReplyGenerator`] port. Requests carry the
//! utterance, a bounded transcript window, and business context, and
//! are bounded by a request timeout; callers substitute the scripted
//! fallback utterance on any failure.

use crate::domain::call::value_object::TranscriptEntry;
use crate::domain::dialog::{BusinessContext, ReplyGenerator};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationRequest<'a> {
    message: &'a str,
    history: &'a [TranscriptEntry],
    business_context: &'a BusinessContext,
    business_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    response: String,
}

/// Reply generation against the backend's phone-AI endpoint
pub struct HttpReplyGenerator {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpReplyGenerator {
    /// `base_url` is the REST collaborator root, e.g. `https://api.example.com`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/voice/phone-ai", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate(
        &self,
        message: &str,
        history: &[TranscriptEntry],
        ctx: &BusinessContext,
    ) -> Result<String> {
        let request = GenerationRequest {
            message,
            history,
            business_context: ctx,
            business_name: &ctx.business_name,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Upstream(format!("generation request: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::Upstream(format!(
                "generation service returned {}",
                response.status()
            )));
        }

        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("generation response: {}", e)))?;

        debug!(chars = body.response.len(), "generated reply");
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalization() {
        let generator =
            HttpReplyGenerator::new("https://api.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(generator.endpoint, "https://api.example.com/voice/phone-ai");
    }

    #[test]
    fn test_request_wire_shape() {
        let ctx = BusinessContext::default();
        let request = GenerationRequest {
            message: "hello",
            history: &[],
            business_context: &ctx,
            business_name: &ctx.business_name,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"message\":\"hello\""));
        assert!(json.contains("\"businessContext\""));
        assert!(json.contains("\"businessName\""));
    }
}
