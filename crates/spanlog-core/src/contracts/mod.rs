//! Wire contracts for log ingestion and export.
//!
//! These DTOs mirror the JSON shape produced by the dashboard server
//! (camelCase keys, upper-case levels). They are converted into domain types
//! at the store boundary and are also what [`crate::LogStore::to_log_list`]
//! emits, so an exported list can be re-ingested.

mod log_list;

pub use log_list::{ContractError, LogList, SegmentDto, SpanDto};
