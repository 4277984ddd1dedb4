//! Control-channel connection management
//!
//! Exactly one WebSocket connection to the telephony backend is kept
//! alive by [`ConnectionManager::run`]. Sessions talk to it through a
//! cloneable [`BridgeHandle`]; sends are best-effort and are dropped
//! while the channel is down, because a retried utterance would
//! arrive after the conversational moment has passed.

use crate::domain::call::value_object::TransferDestination;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::infrastructure::bridge::protocol::{
    AuthCredentials, InboundEvent, OutboundMessage, TransferData,
};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Fire-and-forget command surface shared by all call sessions
pub trait BridgeSink: Send + Sync {
    /// Speak text to the caller
    fn speak(&self, call_sid: &str, text: &str);

    /// Ask the backend to bridge the call elsewhere
    fn transfer(&self, call_sid: &str, destination: TransferDestination, data: TransferData);
}

/// Cloneable sending half of the control channel
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    connected: Arc<AtomicBool>,
    voice: String,
}

impl BridgeHandle {
    /// Serialize and transmit a message if the channel is open,
    /// otherwise silently drop it
    pub fn send(&self, message: OutboundMessage) {
        if !self.connected.load(Ordering::Acquire) {
            debug!("control channel closed, dropping outbound message");
            return;
        }

        if self.tx.send(message).is_err() {
            debug!("connection manager stopped, dropping outbound message");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl BridgeSink for BridgeHandle {
    fn speak(&self, call_sid: &str, text: &str) {
        self.send(OutboundMessage::Speak {
            call_sid: call_sid.to_string(),
            text: text.to_string(),
            voice: self.voice.clone(),
        });
    }

    fn transfer(&self, call_sid: &str, destination: TransferDestination, data: TransferData) {
        self.send(OutboundMessage::Transfer {
            call_sid: call_sid.to_string(),
            destination,
            data,
        });
    }
}

/// Owns the single control connection and its reconnect loop
pub struct ConnectionManager {
    url: String,
    credentials: AuthCredentials,
    reconnect_delay: Duration,
    connected: Arc<AtomicBool>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    events_tx: mpsc::UnboundedSender<InboundEvent>,
}

enum SessionExit {
    /// Channel dropped; reconnect after the fixed delay
    Disconnected,
    /// All handles gone; shut down cleanly
    HandlesClosed,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        credentials: AuthCredentials,
        voice: impl Into<String>,
        reconnect_delay: Duration,
        events_tx: mpsc::UnboundedSender<InboundEvent>,
    ) -> (Self, BridgeHandle) {
        let (tx, outbound_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let handle = BridgeHandle {
            tx,
            connected: connected.clone(),
            voice: voice.into(),
        };

        let manager = Self {
            url: url.into(),
            credentials,
            reconnect_delay,
            connected,
            outbound_rx,
            events_tx,
        };

        (manager, handle)
    }

    /// Connect and keep reconnecting until shutdown
    ///
    /// Retries every `reconnect_delay` on any failure. The only fatal
    /// condition is an authentication rejection from the backend.
    pub async fn run(mut self) -> Result<()> {
        loop {
            match connect_async(&self.url).await {
                Ok((stream, _)) => {
                    info!(url = %self.url, "control channel connected");
                    match self.serve(stream).await? {
                        SessionExit::Disconnected => {
                            warn!("control channel closed, reconnecting in {:?}", self.reconnect_delay);
                        }
                        SessionExit::HandlesClosed => {
                            info!("all bridge handles dropped, stopping connection manager");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "control channel connect failed, retrying in {:?}", self.reconnect_delay);
                }
            }

            self.connected.store(false, Ordering::Release);
            self.drain_outbound();
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn serve(
        &mut self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ) -> Result<SessionExit> {
        let (mut sink, mut source) = stream.split();

        // Authenticate immediately after the channel opens; the
        // outcome arrives asynchronously as an error frame, if at all.
        let auth = OutboundMessage::Auth {
            credentials: self.credentials.clone(),
        };
        let payload = serde_json::to_string(&auth)
            .map_err(|e| DomainError::Internal(format!("auth serialization: {}", e)))?;
        if let Err(e) = sink.send(Message::Text(payload)).await {
            warn!(error = %e, "failed to send auth message");
            return Ok(SessionExit::Disconnected);
        }

        self.connected.store(true, Ordering::Release);

        let exit = loop {
            tokio::select! {
                outbound = self.outbound_rx.recv() => match outbound {
                    Some(message) => {
                        let text = match serde_json::to_string(&message) {
                            Ok(text) => text,
                            Err(e) => {
                                error!(error = %e, "failed to serialize outbound message");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(text)).await.is_err() {
                            break SessionExit::Disconnected;
                        }
                    }
                    None => break SessionExit::HandlesClosed,
                },
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch_frame(&text)?,
                    Some(Ok(Message::Close(_))) | None => break SessionExit::Disconnected,
                    Some(Ok(_)) => {} // ping/pong/binary
                    Some(Err(e)) => {
                        warn!(error = %e, "control channel read error");
                        break SessionExit::Disconnected;
                    }
                },
            }
        };

        self.connected.store(false, Ordering::Release);
        Ok(exit)
    }

    /// Parse one inbound frame and forward it to the dispatcher
    fn dispatch_frame(&self, text: &str) -> Result<()> {
        let event: InboundEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "unparseable control frame ignored");
                return Ok(());
            }
        };

        if let InboundEvent::Error { data } = &event {
            if data.get("code").and_then(|c| c.as_str()) == Some("auth_rejected") {
                error!("telephony backend rejected credentials");
                return Err(DomainError::Unauthorized(
                    "control channel authentication rejected".to_string(),
                ));
            }
        }

        if self.events_tx.send(event).is_err() {
            warn!("event dispatcher gone, dropping inbound event");
        }
        Ok(())
    }

    /// Messages queued while disconnected are dropped, not replayed
    fn drain_outbound(&mut self) {
        let mut dropped = 0usize;
        while self.outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded outbound messages queued while disconnected");
        }
    }
}
