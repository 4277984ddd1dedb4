//! Domain layer

pub mod call;
pub mod dialog;
pub mod intent;
pub mod shared;
