//! Call value objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Call session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Call has been announced by the backend but not yet greeted
    Started,
    /// Normal conversation loop
    Active,
    /// Call has ended
    Ended,
}

impl CallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Started => "started",
            CallStatus::Active => "active",
            CallStatus::Ended => "ended",
        }
    }

    /// Check if status transition is valid
    pub fn can_transition_to(&self, new_status: &CallStatus) -> bool {
        use CallStatus::*;

        match (self, new_status) {
            (Started, Active) => true,
            (Started, Ended) => true,
            (Active, Ended) => true,

            // Can't transition out of Ended
            (Ended, _) => false,

            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, CallStatus::Ended)
    }
}

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance in a call transcript, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Transfer destination on the telephony backend's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDestination {
    Human,
    Booking,
}

impl TransferDestination {
    pub fn as_str(&self) -> &str {
        match self {
            TransferDestination::Human => "human",
            TransferDestination::Booking => "booking",
        }
    }
}
