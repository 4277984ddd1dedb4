//! HTTP call-record repository

use crate::domain::call::repository::{CallRecord, CallRecordRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Persists ended-call records against the backend REST surface
pub struct HttpCallRecordRepository {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCallRecordRepository {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/calls/save", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CallRecordRepository for HttpCallRecordRepository {
    async fn save(&self, record: &CallRecord) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| DomainError::Upstream(format!("call record save: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::Upstream(format!(
                "call record endpoint returned {}",
                response.status()
            )));
        }

        debug!(call_id = %record.call_id, "call record persisted");
        Ok(())
    }
}
