//! Telephony control-channel integration

pub mod connection;
pub mod protocol;

pub use connection::{BridgeHandle, BridgeSink, ConnectionManager};
pub use protocol::{AuthCredentials, InboundEvent, OutboundMessage, TransferData};
