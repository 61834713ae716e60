//! # Domain Layer
//!
//! - `records` - Network and chaincode records as persisted

pub mod records;
