//! Shared result type

pub use super::error::Result;
