//! Dialog response generation
//!
//! Scripted replies are produced here from business configuration.
//! Anything without a script goes to an external text-generation
//! service behind the [`ReplyGenerator`] port; the lifecycle worker
//! bounds that call with a timeout and substitutes
//! [`BusinessContext::fallback_reply`] on failure so the dialogue
//! never goes silent.

use crate::domain::call::value_object::{TransferDestination, TranscriptEntry};
use crate::domain::intent::Intent;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Business configuration the scripted replies are parameterized by
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessContext {
    pub business_id: String,
    pub business_name: String,
    pub business_hours: String,
    pub service_area: String,
    pub services: Vec<String>,
}

impl Default for BusinessContext {
    fn default() -> Self {
        Self {
            business_id: String::new(),
            business_name: "Your Business".to_string(),
            business_hours: "Monday through Saturday, 8am to 6pm".to_string(),
            service_area: "local".to_string(),
            services: vec!["home remodeling services".to_string()],
        }
    }
}

impl BusinessContext {
    /// Greeting spoken when a call starts
    pub fn greeting(&self) -> String {
        format!(
            "Hello, thank you for calling {}. I'm your AI assistant. \
             How can I help you today? You can ask about scheduling, quotes, \
             or our services. Press 0 at any time to speak with a team member.",
            self.business_name
        )
    }

    /// First scripted utterance of the quote flow
    pub fn quote_flow_prompt(&self) -> String {
        "Great, let's get you a quote. First, what type of project is this for? \
         Say countertops, tile, flooring, cabinets, or full remodel."
            .to_string()
    }

    /// Clarifying utterance used when generation fails or times out
    pub fn fallback_reply(&self) -> String {
        "I'd be happy to help with that. Could you tell me a bit more about what you need?"
            .to_string()
    }

    fn services_list(&self) -> String {
        if self.services.is_empty() {
            "home remodeling services".to_string()
        } else {
            self.services.join(", ")
        }
    }
}

/// A scripted reply and its side effect, if any
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedReply {
    pub text: String,
    /// Transfer scheduled after the acknowledgment is heard
    pub transfer: Option<TransferDestination>,
}

impl ScriptedReply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            transfer: None,
        }
    }
}

/// Look up the scripted reply for an intent
///
/// Returns `None` for intents without special-case scripts (`status`,
/// `general`), which take the external generation path instead.
pub fn scripted_reply(ctx: &BusinessContext, intent: Intent) -> Option<ScriptedReply> {
    match intent {
        Intent::Schedule => Some(ScriptedReply::say(
            "I'd be happy to help you schedule an appointment. Our next available \
             time is tomorrow. Would you prefer morning or afternoon?",
        )),
        Intent::Quote => Some(ScriptedReply::say(
            "I can help you get an estimate. What type of project are you looking \
             to have done? For example, countertops, flooring, or a full remodel?",
        )),
        Intent::Hours => Some(ScriptedReply::say(format!(
            "We're open {}. Would you like to schedule a time for us to come out?",
            ctx.business_hours
        ))),
        Intent::Location => Some(ScriptedReply::say(format!(
            "We serve the {} area. We'd be happy to come to your location for a \
             free estimate.",
            ctx.service_area
        ))),
        Intent::Human => Some(ScriptedReply {
            text: "Absolutely, let me connect you with one of our team members \
                   right now. Please hold."
                .to_string(),
            transfer: Some(TransferDestination::Human),
        }),
        Intent::Services => Some(ScriptedReply::say(format!(
            "We specialize in {}. Which of these are you interested in?",
            ctx.services_list()
        ))),
        Intent::Emergency => Some(ScriptedReply::say(
            "I understand this is urgent. Let me get a team member on the line \
             right away.",
        )),
        Intent::Status | Intent::General => None,
    }
}

/// External text-generation port
///
/// Implemented in the infrastructure layer against the backend's
/// generation endpoint. Receives the utterance, a bounded window of
/// recent transcript entries, and business context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        message: &str,
        history: &[TranscriptEntry],
        ctx: &BusinessContext,
    ) -> Result<String>;
}

/// How many recent transcript entries accompany a generation request
pub const HISTORY_WINDOW: usize = 10;
