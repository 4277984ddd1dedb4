//! Call session aggregate root

use crate::domain::call::value_object::{CallStatus, Role, TranscriptEntry};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Call session aggregate root
///
/// One per in-progress or completed call. The lifecycle worker is the
/// only writer; everything else sees read-only snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    /// Opaque call identifier assigned by the telephony backend
    id: String,
    /// Caller number, immutable once set
    from: String,
    /// Called number, immutable once set
    to: String,
    /// Current status
    status: CallStatus,
    /// When the call-start event was received
    start_time: DateTime<Utc>,
    /// When the call ended (if it has)
    end_time: Option<DateTime<Utc>>,
    /// Whole seconds between start and end, set once at call end
    duration_seconds: Option<i64>,
    /// Ordered, append-only conversation record
    transcript: Vec<TranscriptEntry>,
}

impl CallSession {
    /// Create a new session for an incoming call
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            status: CallStatus::Started,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
            transcript: Vec::new(),
        }
    }

    /// Append a caller utterance
    pub fn record_user(&mut self, text: impl Into<String>) -> Result<()> {
        self.append(Role::User, text)
    }

    /// Append a spoken response
    pub fn record_assistant(&mut self, text: impl Into<String>) -> Result<()> {
        self.append(Role::Assistant, text)
    }

    fn append(&mut self, role: Role, text: impl Into<String>) -> Result<()> {
        if !self.status.is_active() {
            return Err(DomainError::InvalidOperation(format!(
                "Cannot append transcript to {} call {}",
                self.status.as_str(),
                self.id
            )));
        }

        self.transcript.push(TranscriptEntry::new(role, text));
        Ok(())
    }

    /// Mark the call as in conversation, once the greeting is out
    pub fn activate(&mut self) -> Result<()> {
        self.transition_to(CallStatus::Active)
    }

    /// End the call, computing the duration from start to end
    pub fn end(&mut self) -> Result<()> {
        self.end_at(Utc::now())
    }

    /// End the call at an explicit instant
    pub fn end_at(&mut self, ended_at: DateTime<Utc>) -> Result<()> {
        self.transition_to(CallStatus::Ended)?;
        self.end_time = Some(ended_at);
        self.duration_seconds = Some((ended_at - self.start_time).num_seconds());
        Ok(())
    }

    fn transition_to(&mut self, new_status: CallStatus) -> Result<()> {
        if !self.status.can_transition_to(&new_status) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition call {} from {:?} to {:?}",
                self.id, self.status, new_status
            )));
        }

        self.status = new_status;
        Ok(())
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.duration_seconds
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Read-only window over the most recent entries, newest last
    pub fn recent_transcript(&self, limit: usize) -> &[TranscriptEntry] {
        let start = self.transcript.len().saturating_sub(limit);
        &self.transcript[start..]
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> CallSession {
        CallSession::new("CA123", "+15551234567", "+16028333189")
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = create_test_session();

        assert_eq!(session.status(), CallStatus::Started);
        assert!(session.transcript().is_empty());

        session.record_assistant("Hello, thank you for calling.").unwrap();
        session.activate().unwrap();
        assert_eq!(session.status(), CallStatus::Active);

        session.record_user("Hi, I need a quote.").unwrap();
        session.record_assistant("Happy to help with a quote.").unwrap();

        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[0].role, Role::Assistant);
        assert_eq!(session.transcript()[1].role, Role::User);

        session.end().unwrap();
        assert_eq!(session.status(), CallStatus::Ended);
        assert!(session.end_time().is_some());
        assert!(session.duration_seconds().is_some());
    }

    #[test]
    fn test_transcript_preserves_arrival_order() {
        let mut session = create_test_session();

        for i in 0..5 {
            session.record_user(format!("utterance {}", i)).unwrap();
            session.record_assistant(format!("reply {}", i)).unwrap();
        }

        let texts: Vec<&str> = session.transcript().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "utterance 0", "reply 0", "utterance 1", "reply 1", "utterance 2",
                "reply 2", "utterance 3", "reply 3", "utterance 4", "reply 4",
            ]
        );
    }

    #[test]
    fn test_zero_duration_when_start_equals_end() {
        let mut session = create_test_session();
        let started = session.start_time();

        session.end_at(started).unwrap();
        assert_eq!(session.duration_seconds(), Some(0));
    }

    #[test]
    fn test_duration_is_end_minus_start() {
        let mut session = create_test_session();
        let ended = session.start_time() + chrono::Duration::seconds(42);

        session.end_at(ended).unwrap();
        assert_eq!(session.duration_seconds(), Some(42));
        assert_eq!(session.end_time(), Some(ended));
    }

    #[test]
    fn test_cannot_append_after_end() {
        let mut session = create_test_session();
        session.end().unwrap();

        let result = session.record_user("anyone there?");
        assert!(result.is_err());
    }

    #[test]
    fn test_cannot_activate_twice() {
        let mut session = create_test_session();

        session.activate().unwrap();
        assert!(session.activate().is_err());
    }

    #[test]
    fn test_end_before_greeting_completes() {
        // Caller hangs up while the call is still in Started
        let mut session = create_test_session();

        session.end().unwrap();
        assert_eq!(session.status(), CallStatus::Ended);
        assert!(session.activate().is_err());
    }

    #[test]
    fn test_cannot_end_twice() {
        let mut session = create_test_session();
        session.end().unwrap();

        let result = session.end();
        assert!(result.is_err());
    }

    #[test]
    fn test_recent_transcript_window() {
        let mut session = create_test_session();
        for i in 0..15 {
            session.record_user(format!("u{}", i)).unwrap();
        }

        let window = session.recent_transcript(10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].text, "u5");
        assert_eq!(window[9].text, "u14");

        // Window larger than history returns everything
        assert_eq!(session.recent_transcript(100).len(), 15);
    }
}
