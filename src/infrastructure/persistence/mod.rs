//! Persistence adapters

pub mod call_record;

pub use call_record::HttpCallRecordRepository;
