//! Interface layer

pub mod api;
