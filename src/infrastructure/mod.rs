//! Infrastructure layer

pub mod ai;
pub mod bridge;
pub mod ivr;
pub mod persistence;
pub mod telephony;
