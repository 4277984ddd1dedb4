//! Inbound event dispatcher
//!
//! A single task reads events off the shared control channel and
//! routes each one to the per-call worker owning that call SID.
//! Workers are created on `call_start` and retired after `call_end`;
//! events for unknown SIDs are dropped with a warning and never
//! create a session implicitly.

use crate::application::lifecycle::{run_call_worker, SessionEvent};
use crate::application::CallDeps;
use crate::domain::call::session::CallSession;
use crate::domain::call::store::SessionStore;
use crate::infrastructure::bridge::protocol::InboundEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct CallWorker {
    tx: mpsc::UnboundedSender<SessionEvent>,
    ending: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Routes control-channel events to per-call workers
pub struct Dispatcher {
    store: SessionStore,
    deps: Arc<CallDeps>,
    workers: HashMap<String, CallWorker>,
}

impl Dispatcher {
    pub fn new(store: SessionStore, deps: Arc<CallDeps>) -> Self {
        Self {
            store,
            deps,
            workers: HashMap::new(),
        }
    }

    /// Consume events until the connection manager stops
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }

        info!("event stream closed, dispatcher stopping");
        for (_, worker) in self.workers.drain() {
            worker.handle.abort();
        }
    }

    /// Route one event; synchronous so per-call FIFO only depends on
    /// each worker's queue
    pub fn dispatch(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::CallStart { data } => {
                self.on_call_start(data.call_sid, data.from, data.to);
            }
            InboundEvent::Transcript { data } => {
                self.route(&data.call_sid, SessionEvent::Utterance { text: data.text });
            }
            InboundEvent::Dtmf { data } => match data.digit.chars().next() {
                Some(digit) => self.route(&data.call_sid, SessionEvent::Keypad { digit }),
                None => warn!(call_sid = %data.call_sid, "empty dtmf payload dropped"),
            },
            InboundEvent::CallEnd { data } => self.on_call_end(&data.call_sid),
            InboundEvent::Error { data } => {
                error!(data = %data, "bridge error reported by backend");
            }
            InboundEvent::Unknown => {}
        }
    }

    fn on_call_start(&mut self, call_sid: String, from: String, to: String) {
        if self.workers.contains_key(&call_sid) {
            warn!(call_sid = %call_sid, "duplicate call_start ignored");
            return;
        }

        info!(call_sid = %call_sid, from = %from, to = %to, "incoming call");
        self.store
            .insert(CallSession::new(call_sid.clone(), from, to));

        let (tx, rx) = mpsc::unbounded_channel();
        let ending = Arc::new(Notify::new());
        let handle = tokio::spawn(run_call_worker(
            call_sid.clone(),
            rx,
            ending.clone(),
            self.store.clone(),
            self.deps.clone(),
        ));

        self.workers.insert(call_sid, CallWorker { tx, ending, handle });
    }

    fn on_call_end(&mut self, call_sid: &str) {
        match self.workers.remove(call_sid) {
            Some(worker) => {
                // Wake any in-flight generation first so the worker
                // abandons it instead of finishing the reply.
                worker.ending.notify_one();
                if worker.tx.send(SessionEvent::End).is_err() {
                    debug!(call_sid = %call_sid, "worker already gone at call_end");
                }
            }
            None => warn!(call_sid = %call_sid, "call_end for unknown call dropped"),
        }
    }

    fn route(&self, call_sid: &str, event: SessionEvent) {
        match self.workers.get(call_sid) {
            Some(worker) => {
                if worker.tx.send(event).is_err() {
                    warn!(call_sid = %call_sid, "worker queue closed, event dropped");
                }
            }
            None => warn!(call_sid = %call_sid, "event for unknown call dropped"),
        }
    }

    /// Number of calls currently being tracked
    pub fn active_calls(&self) -> usize {
        self.workers.len()
    }
}
