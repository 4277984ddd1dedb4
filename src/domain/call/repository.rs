//! Call record persistence interface

use crate::domain::call::session::CallSession;
use crate::domain::call::value_object::TranscriptEntry;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a completed call handed to persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub call_id: String,
    pub from: String,
    pub to: String,
    pub duration: i64,
    pub transcript: Vec<TranscriptEntry>,
    pub business_id: String,
    pub timestamp: DateTime<Utc>,
}

impl CallRecord {
    /// Build a record from an ended session
    pub fn from_session(session: &CallSession, business_id: impl Into<String>) -> Self {
        Self {
            call_id: session.id().to_string(),
            from: session.from().to_string(),
            to: session.to().to_string(),
            duration: session.duration_seconds().unwrap_or(0),
            transcript: session.transcript().to_vec(),
            business_id: business_id.into(),
            timestamp: session.start_time(),
        }
    }
}

/// Repository interface for completed call records
///
/// This is defined in the domain layer as a trait (port),
/// and implemented in the infrastructure layer (adapter).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// Persist the record of an ended call
    async fn save(&self, record: &CallRecord) -> Result<()>;
}
