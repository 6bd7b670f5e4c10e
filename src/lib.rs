//! Object storage operations for workflow engines.
//!
//! A batch of input items is dispatched, item by item, to one of the storage
//! operations registered under an operation code. Failures are classified into
//! a fixed taxonomy and either recorded per item or raised for the whole batch.

pub mod cli;
pub mod config;
pub mod error;
pub mod node;
pub mod storage;
