//! Webhook API surface

pub mod router;
pub mod twiml;
pub mod voice_handler;

pub use router::build_router;
pub use twiml::WebhookResponder;
pub use voice_handler::AppState;
