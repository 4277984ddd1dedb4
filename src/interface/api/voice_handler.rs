//! Voice webhook handlers
//!
//! The request/response integration path: the telephony backend POSTs
//! call input here and speaks whatever TwiML document comes back.
//! Unlike the streaming path there is no session state; every request
//! carries what it needs.

use crate::domain::dialog::{scripted_reply, BusinessContext, ReplyGenerator};
use crate::domain::intent::{classify, Intent};
use crate::infrastructure::ivr::menu::{self, MenuAction};
use crate::interface::api::twiml::WebhookResponder;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared state for the webhook surface
#[derive(Clone)]
pub struct AppState {
    pub responder: WebhookResponder,
    pub ctx: BusinessContext,
    pub generator: Arc<dyn ReplyGenerator>,
    pub generation_timeout: Duration,
    pub forward_number: String,
}

/// Webhook payload, PascalCase per the telephony backend
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceWebhookRequest {
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub speech_result: Option<String>,
    #[serde(default)]
    pub digits: Option<String>,
}

/// `POST /voice/inbound`: greet and gather
pub async fn handle_inbound_call(
    State(state): State<AppState>,
    Form(request): Form<VoiceWebhookRequest>,
) -> Response {
    info!(call_sid = ?request.call_sid, from = ?request.from, "inbound webhook call");
    xml(state.responder.greeting())
}

/// `POST /voice/process`: route gathered speech or keypad input
pub async fn handle_process(
    State(state): State<AppState>,
    Form(request): Form<VoiceWebhookRequest>,
) -> Response {
    if let Some(digits) = request.digits.as_deref().and_then(|d| d.chars().next()) {
        return xml(process_digits(&state, digits));
    }

    if let Some(speech) = request.speech_result.as_deref().filter(|s| !s.trim().is_empty()) {
        return xml(process_speech(&state, speech).await);
    }

    debug!(call_sid = ?request.call_sid, "gather returned no input, offering voicemail");
    xml(state.responder.voicemail())
}

/// `POST /voice/voicemail`: recording callback
pub async fn handle_voicemail(
    State(state): State<AppState>,
    Form(request): Form<VoiceWebhookRequest>,
) -> Response {
    info!(call_sid = ?request.call_sid, "voicemail recorded");
    xml(state.responder.response("Thank you. We'll get back to you shortly. Goodbye."))
}

/// `GET /health`
pub async fn health_check() -> impl IntoResponse {
    axum::Json(json!({ "status": "ok" }))
}

fn process_digits(state: &AppState, digit: char) -> String {
    let selection = menu::select(digit);

    match selection.action {
        Some(MenuAction::TransferToHuman) | Some(MenuAction::TransferToBooking) => {
            state.responder.transfer(&state.forward_number)
        }
        Some(MenuAction::StartQuoteFlow) => state.responder.response(&format!(
            "{} {}",
            selection.acknowledgment,
            state.ctx.quote_flow_prompt()
        )),
        None => state.responder.response(&selection.acknowledgment),
    }
}

async fn process_speech(state: &AppState, speech: &str) -> String {
    let intent = classify(speech);
    debug!(intent = intent.as_str(), "webhook utterance classified");

    if intent == Intent::Human {
        return state.responder.transfer(&state.forward_number);
    }

    if let Some(scripted) = scripted_reply(&state.ctx, intent) {
        return state.responder.response(&scripted.text);
    }

    // No transcript history on the webhook path; each turn stands alone.
    let generation = tokio::time::timeout(
        state.generation_timeout,
        state.generator.generate(speech, &[], &state.ctx),
    );

    let reply = match generation.await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!(error = %e, "webhook generation failed, using fallback");
            state.ctx.fallback_reply()
        }
        Err(_) => {
            warn!("webhook generation timed out, using fallback");
            state.ctx.fallback_reply()
        }
    };

    state.responder.response(&reply)
}

fn xml(document: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], document).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::value_object::TranscriptEntry;
    use crate::domain::shared::error::DomainError;
    use crate::domain::shared::result::Result;
    use async_trait::async_trait;

    struct FailingGenerator;

    #[async_trait]
    impl ReplyGenerator for FailingGenerator {
        async fn generate(
            &self,
            _message: &str,
            _history: &[TranscriptEntry],
            _ctx: &BusinessContext,
        ) -> Result<String> {
            Err(DomainError::Upstream("down".to_string()))
        }
    }

    fn test_state() -> AppState {
        AppState {
            responder: WebhookResponder::new("Polly.Joanna", "Stone Works", "+16025550100"),
            ctx: BusinessContext {
                business_name: "Stone Works".to_string(),
                ..BusinessContext::default()
            },
            generator: Arc::new(FailingGenerator),
            generation_timeout: Duration::from_millis(50),
            forward_number: "+16025550100".to_string(),
        }
    }

    #[test]
    fn test_digit_zero_produces_transfer_document() {
        let doc = process_digits(&test_state(), '0');
        assert!(doc.contains("<Dial>+16025550100</Dial>"));
    }

    #[test]
    fn test_digit_two_speaks_quote_flow() {
        let doc = process_digits(&test_state(), '2');
        assert!(doc.contains("quote estimate"));
        assert!(doc.contains("what type of project"));
        assert!(doc.contains("<Gather"));
    }

    #[test]
    fn test_unmapped_digit_reprompts() {
        let doc = process_digits(&test_state(), '8');
        assert!(doc.contains("did not recognize"));
        assert!(doc.contains("<Gather"));
    }

    #[tokio::test]
    async fn test_scripted_speech_gets_scripted_response() {
        let doc = process_speech(&test_state(), "what are your hours").await;
        // Apostrophes in the scripted text are XML-escaped
        assert!(doc.contains("We&apos;re open"));
        assert!(doc.contains("Monday through Saturday"));
    }

    #[tokio::test]
    async fn test_human_speech_transfers() {
        let doc = process_speech(&test_state(), "I want to talk to a person").await;
        assert!(doc.contains("<Dial>"));
    }

    #[tokio::test]
    async fn test_generation_failure_still_answers() {
        let state = test_state();
        let doc = process_speech(&state, "tell me something unusual").await;
        let expected = crate::interface::api::twiml::xml_escape(&state.ctx.fallback_reply());
        assert!(doc.contains(&expected));
    }
}
