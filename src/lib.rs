//! VoiceBridge - a voice-call orchestration bridge
//!
//! Turns live telephone calls arriving through a SIP-to-WebSocket
//! telephony gateway into managed, stateful conversations: lifecycle
//! tracking, intent classification, scripted and AI-backed responses,
//! DTMF menus, and handoff to a human, a booking flow, or voicemail.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
