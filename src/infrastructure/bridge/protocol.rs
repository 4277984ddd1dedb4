//! Control-channel wire protocol
//!
//! Messages are JSON objects discriminated by a `type` field, with
//! camelCase payload keys matching the telephony backend.

use crate::domain::call::value_object::{TransferDestination, TranscriptEntry};
use serde::{Deserialize, Serialize};

/// Event received from the telephony backend
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    CallStart { data: CallStartData },
    CallEnd { data: CallEndData },
    Transcript { data: TranscriptData },
    Dtmf { data: DtmfData },
    Error { data: serde_json::Value },
    /// Forward compatibility: unknown event types are ignored
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStartData {
    pub call_sid: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEndData {
    pub call_sid: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptData {
    pub call_sid: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DtmfData {
    pub call_sid: String,
    pub digit: String,
}

/// Command sent to the telephony backend
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Auth {
        credentials: AuthCredentials,
    },
    Speak {
        #[serde(rename = "callSid")]
        call_sid: String,
        text: String,
        voice: String,
    },
    Transfer {
        #[serde(rename = "callSid")]
        call_sid: String,
        destination: TransferDestination,
        data: TransferData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCredentials {
    pub account_sid: String,
    pub business_id: String,
}

/// Context shipped with a transfer: booking transfers carry the
/// caller number, human transfers carry the conversation so far
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptEntry>>,
}

impl TransferData {
    pub fn for_booking(caller: impl Into<String>) -> Self {
        Self {
            caller: Some(caller.into()),
            transcript: None,
        }
    }

    pub fn for_human(transcript: Vec<TranscriptEntry>) -> Self {
        Self {
            caller: None,
            transcript: Some(transcript),
        }
    }
}
