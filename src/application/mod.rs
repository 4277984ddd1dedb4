//! Application layer: call lifecycle orchestration

pub mod dispatcher;
pub mod lifecycle;

pub use dispatcher::Dispatcher;
pub use lifecycle::SessionEvent;

use crate::domain::call::repository::CallRecordRepository;
use crate::domain::dialog::{BusinessContext, ReplyGenerator};
use crate::infrastructure::bridge::connection::BridgeSink;
use std::sync::Arc;
use std::time::Duration;

/// Shared collaborators for every call worker
pub struct CallDeps {
    /// Control-channel command surface
    pub sink: Arc<dyn BridgeSink>,
    /// External text-generation port
    pub generator: Arc<dyn ReplyGenerator>,
    /// Call-record persistence port
    pub repository: Arc<dyn CallRecordRepository>,
    /// Business configuration replies are parameterized by
    pub ctx: BusinessContext,
    /// Bound on the one true suspension point
    pub generation_timeout: Duration,
    /// Pause between a transfer acknowledgment and the transfer itself
    pub transfer_delay: Duration,
    /// How long an ended session stays readable before eviction
    pub retention: Duration,
}
