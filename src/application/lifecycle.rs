//! Per-call lifecycle worker
//!
//! One worker task per active call consumes that call's events in
//! arrival order, so the dialogue stays sequential per call while
//! independent calls progress concurrently.

use crate::application::CallDeps;
use crate::domain::call::repository::CallRecord;
use crate::domain::call::store::SessionStore;
use crate::domain::call::value_object::TransferDestination;
use crate::domain::dialog::{scripted_reply, HISTORY_WINDOW};
use crate::domain::intent::classify;
use crate::infrastructure::bridge::protocol::TransferData;
use crate::infrastructure::ivr::menu::{self, MenuAction};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

/// Event addressed to one call's worker
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Caller speech delivered as text
    Utterance { text: String },
    /// Keypad digit
    Keypad { digit: char },
    /// Backend reported the call ended
    End,
}

/// Consume a call's events until it ends
///
/// The greeting is spoken before any event is processed. `ending` is
/// signalled by the dispatcher when `call_end` arrives so an
/// in-flight generation can be abandoned instead of awaited.
pub async fn run_call_worker(
    call_sid: String,
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    ending: Arc<Notify>,
    store: SessionStore,
    deps: Arc<CallDeps>,
) {
    let greeting = deps.ctx.greeting();
    speak_and_record(&deps, &store, &call_sid, &greeting);
    store.with_session(&call_sid, |session| {
        if let Err(e) = session.activate() {
            warn!(call_sid = %call_sid, error = %e, "could not activate session");
        }
    });
    info!(call_sid = %call_sid, "call session started");

    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Utterance { text } => {
                handle_utterance(&call_sid, &text, ending.as_ref(), &store, &deps).await;
            }
            SessionEvent::Keypad { digit } => {
                handle_keypad(&call_sid, digit, &store, &deps);
            }
            SessionEvent::End => {
                handle_end(&call_sid, &store, &deps);
                break;
            }
        }
    }

    debug!(call_sid = %call_sid, "call worker finished");
}

async fn handle_utterance(
    call_sid: &str,
    text: &str,
    ending: &Notify,
    store: &SessionStore,
    deps: &Arc<CallDeps>,
) {
    if record_user(store, call_sid, text).is_none() {
        warn!(call_sid = %call_sid, "utterance for missing session dropped");
        return;
    }

    let intent = classify(text);
    debug!(call_sid = %call_sid, intent = intent.as_str(), "utterance classified");

    let reply = match scripted_reply(&deps.ctx, intent) {
        Some(scripted) => {
            if let Some(destination) = scripted.transfer {
                schedule_transfer(deps, store, call_sid, destination);
            }
            scripted.text
        }
        None => {
            let history = store
                .get(call_sid)
                .map(|s| s.recent_transcript(HISTORY_WINDOW).to_vec())
                .unwrap_or_default();

            let generation = tokio::time::timeout(
                deps.generation_timeout,
                deps.generator.generate(text, &history, &deps.ctx),
            );

            tokio::select! {
                outcome = generation => match outcome {
                    Ok(Ok(reply)) => reply,
                    Ok(Err(e)) => {
                        warn!(call_sid = %call_sid, error = %e, "generation failed, using fallback");
                        deps.ctx.fallback_reply()
                    }
                    Err(_) => {
                        warn!(call_sid = %call_sid, "generation timed out, using fallback");
                        deps.ctx.fallback_reply()
                    }
                },
                _ = ending.notified() => {
                    debug!(call_sid = %call_sid, "call ending, abandoning in-flight generation");
                    return;
                }
            }
        }
    };

    speak_and_record(deps, store, call_sid, &reply);
}

fn handle_keypad(call_sid: &str, digit: char, store: &SessionStore, deps: &Arc<CallDeps>) {
    let selection = menu::select(digit);
    debug!(call_sid = %call_sid, digit = %digit, "keypad input");

    speak_and_record(deps, store, call_sid, &selection.acknowledgment);

    match selection.action {
        Some(MenuAction::TransferToBooking) => {
            deps.sink.transfer(
                call_sid,
                TransferDestination::Booking,
                transfer_data(store, call_sid, TransferDestination::Booking),
            );
        }
        Some(MenuAction::TransferToHuman) => {
            deps.sink.transfer(
                call_sid,
                TransferDestination::Human,
                transfer_data(store, call_sid, TransferDestination::Human),
            );
        }
        Some(MenuAction::StartQuoteFlow) => {
            let prompt = deps.ctx.quote_flow_prompt();
            speak_and_record(deps, store, call_sid, &prompt);
        }
        None => {}
    }
}

fn handle_end(call_sid: &str, store: &SessionStore, deps: &Arc<CallDeps>) {
    let record = store.with_session(call_sid, |session| {
        session.end()?;
        Ok::<CallRecord, crate::domain::shared::error::DomainError>(CallRecord::from_session(
            session,
            &deps.ctx.business_id,
        ))
    });

    match record {
        Some(Ok(record)) => {
            info!(
                call_sid = %call_sid,
                duration = record.duration,
                entries = record.transcript.len(),
                "call ended"
            );

            // Fire-and-forget: the caller has hung up, so failures are
            // logged rather than retried or surfaced.
            let repository = deps.repository.clone();
            tokio::spawn(async move {
                if let Err(e) = repository.save(&record).await {
                    error!(call_id = %record.call_id, error = %e, "failed to persist call record");
                }
            });
        }
        Some(Err(e)) => warn!(call_sid = %call_sid, error = %e, "could not finalize session"),
        None => warn!(call_sid = %call_sid, "call_end for missing session"),
    }

    // Retain the ended session briefly for post-call reads, then evict.
    let store = store.clone();
    let call_sid = call_sid.to_string();
    let retention = deps.retention;
    tokio::spawn(async move {
        tokio::time::sleep(retention).await;
        if store.remove(&call_sid).is_some() {
            debug!(call_sid = %call_sid, "session evicted");
        }
    });
}

/// Human-intent transfers wait a beat so the acknowledgment is heard
/// before the call is bridged away.
fn schedule_transfer(
    deps: &Arc<CallDeps>,
    store: &SessionStore,
    call_sid: &str,
    destination: TransferDestination,
) {
    let deps = deps.clone();
    let store = store.clone();
    let call_sid = call_sid.to_string();

    tokio::spawn(async move {
        tokio::time::sleep(deps.transfer_delay).await;
        let data = transfer_data(&store, &call_sid, destination);
        deps.sink.transfer(&call_sid, destination, data);
    });
}

fn transfer_data(
    store: &SessionStore,
    call_sid: &str,
    destination: TransferDestination,
) -> TransferData {
    match destination {
        TransferDestination::Booking => TransferData::for_booking(
            store
                .get(call_sid)
                .map(|s| s.from().to_string())
                .unwrap_or_default(),
        ),
        TransferDestination::Human => TransferData::for_human(
            store
                .get(call_sid)
                .map(|s| s.transcript().to_vec())
                .unwrap_or_default(),
        ),
    }
}

fn record_user(store: &SessionStore, call_sid: &str, text: &str) -> Option<()> {
    store.with_session(call_sid, |session| {
        if let Err(e) = session.record_user(text) {
            warn!(call_sid = %call_sid, error = %e, "dropping utterance");
        }
    })
}

fn speak_and_record(deps: &Arc<CallDeps>, store: &SessionStore, call_sid: &str, text: &str) {
    deps.sink.speak(call_sid, text);
    store.with_session(call_sid, |session| {
        if let Err(e) = session.record_assistant(text) {
            warn!(call_sid = %call_sid, error = %e, "could not record assistant entry");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{RecordingSink, StaticGenerator};
    use crate::domain::call::repository::MockCallRecordRepository;
    use crate::domain::call::session::CallSession;
    use crate::domain::dialog::{BusinessContext, MockReplyGenerator, ReplyGenerator};
    use crate::domain::shared::error::DomainError;
    use std::time::Duration;

    fn test_deps(
        sink: Arc<RecordingSink>,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Arc<CallDeps> {
        let mut repository = MockCallRecordRepository::new();
        repository.expect_save().returning(|_| Ok(()));

        Arc::new(CallDeps {
            sink,
            generator,
            repository: Arc::new(repository),
            ctx: BusinessContext {
                business_id: "biz-1".to_string(),
                business_name: "Stone Works".to_string(),
                ..BusinessContext::default()
            },
            generation_timeout: Duration::from_millis(100),
            transfer_delay: Duration::from_millis(1),
            retention: Duration::from_millis(1),
        })
    }

    fn seeded_store(call_sid: &str) -> SessionStore {
        let store = SessionStore::new();
        store.insert(CallSession::new(call_sid, "+15551234567", "+16028333189"));
        store
    }

    #[tokio::test]
    async fn test_scripted_utterance_is_spoken_and_recorded() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(sink.clone(), Arc::new(StaticGenerator::new("unused")));
        let store = seeded_store("CA1");
        let ending = Notify::new();

        handle_utterance("CA1", "what are your hours", &ending, &store, &deps).await;

        let session = store.get("CA1").unwrap();
        assert_eq!(session.transcript().len(), 2); // user + assistant
        assert_eq!(sink.speaks(), 1);
    }

    #[tokio::test]
    async fn test_general_utterance_uses_generator() {
        let sink = Arc::new(RecordingSink::default());
        let mut generator = MockReplyGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _, _| Ok("Generated answer.".to_string()));
        let deps = test_deps(sink.clone(), Arc::new(generator));
        let store = seeded_store("CA1");
        let ending = Notify::new();

        handle_utterance("CA1", "tell me about granite veining", &ending, &store, &deps).await;

        let session = store.get("CA1").unwrap();
        assert_eq!(session.transcript()[1].text, "Generated answer.");
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back() {
        let sink = Arc::new(RecordingSink::default());
        let mut generator = MockReplyGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _, _| Err(DomainError::Upstream("boom".to_string())));
        let deps = test_deps(sink.clone(), Arc::new(generator));
        let store = seeded_store("CA1");
        let ending = Notify::new();

        handle_utterance("CA1", "something unscripted", &ending, &store, &deps).await;

        let session = store.get("CA1").unwrap();
        assert_eq!(session.transcript()[1].text, deps.ctx.fallback_reply());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_falls_back_in_bounded_time() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(
            sink.clone(),
            Arc::new(StaticGenerator::slow("late", Duration::from_secs(60))),
        );
        let store = seeded_store("CA1");
        let ending = Notify::new();

        handle_utterance("CA1", "something unscripted", &ending, &store, &deps).await;

        let session = store.get("CA1").unwrap();
        let reply = &session.transcript()[1].text;
        assert!(!reply.is_empty());
        assert_eq!(reply, &deps.ctx.fallback_reply());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ending_abandons_generation() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(
            sink.clone(),
            Arc::new(StaticGenerator::slow("late", Duration::from_secs(60))),
        );
        let store = seeded_store("CA1");
        let ending = Notify::new();
        ending.notify_one();

        handle_utterance("CA1", "something unscripted", &ending, &store, &deps).await;

        // User entry recorded, but no reply was spoken
        let session = store.get("CA1").unwrap();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(sink.speaks(), 0);
    }

    #[tokio::test]
    async fn test_human_intent_schedules_exactly_one_transfer() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(sink.clone(), Arc::new(StaticGenerator::new("unused")));
        let store = seeded_store("CA1");
        let ending = Notify::new();

        handle_utterance("CA1", "let me speak to a person", &ending, &store, &deps).await;

        // Acknowledgment spoken immediately, transfer after the delay
        assert_eq!(sink.speaks(), 1);
        assert_eq!(sink.transfers(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(sink.transfers(), 1);
        assert_eq!(
            sink.transfer_log()[0],
            ("CA1".to_string(), TransferDestination::Human)
        );
    }

    #[tokio::test]
    async fn test_dtmf_zero_transfers_to_human_once() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(sink.clone(), Arc::new(StaticGenerator::new("unused")));
        let store = seeded_store("CA1");

        handle_keypad("CA1", '0', &store, &deps);

        assert_eq!(sink.speaks(), 1);
        assert_eq!(sink.transfers(), 1);
        assert_eq!(
            sink.transfer_log()[0],
            ("CA1".to_string(), TransferDestination::Human)
        );
        // Acknowledgment landed in the transcript, status untouched
        let session = store.get("CA1").unwrap();
        assert_eq!(session.transcript().len(), 1);
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_dtmf_two_starts_quote_flow() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(sink.clone(), Arc::new(StaticGenerator::new("unused")));
        let store = seeded_store("CA1");

        handle_keypad("CA1", '2', &store, &deps);

        // Acknowledgment plus the first quote-flow utterance
        assert_eq!(sink.speaks(), 2);
        assert_eq!(sink.transfers(), 0);
        let session = store.get("CA1").unwrap();
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].text, deps.ctx.quote_flow_prompt());
    }

    #[tokio::test]
    async fn test_dtmf_unmapped_digit_keeps_call_active() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(sink.clone(), Arc::new(StaticGenerator::new("unused")));
        let store = seeded_store("CA1");

        handle_keypad("CA1", '7', &store, &deps);

        assert_eq!(sink.speaks(), 1);
        assert_eq!(sink.transfers(), 0);
        assert!(store.get("CA1").unwrap().is_active());
    }

    #[tokio::test]
    async fn test_end_finalizes_and_evicts_after_retention() {
        let sink = Arc::new(RecordingSink::default());
        let deps = test_deps(sink.clone(), Arc::new(StaticGenerator::new("unused")));
        let store = seeded_store("CA1");

        handle_end("CA1", &store, &deps);

        let session = store.get("CA1").unwrap();
        assert!(!session.is_active());
        assert!(session.duration_seconds().is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get("CA1").is_none());
    }
}
