//! Outbound telephony REST client

pub mod outbound;

pub use outbound::{OutboundReceipt, TelephonyClient};
