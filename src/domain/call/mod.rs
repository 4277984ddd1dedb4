//! Call domain model

pub mod repository;
pub mod session;
pub mod store;
pub mod value_object;

pub use repository::{CallRecord, CallRecordRepository};
pub use session::CallSession;
pub use store::SessionStore;
pub use value_object::{CallStatus, Role, TransferDestination, TranscriptEntry};
