//! The record store: schema-driven records and their secondary indexes on
//! top of a plain key-value keyspace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RecordStore                           │
//! │   (create, find, update, destroy, count, drop per table)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    codec    │       │  keys/hash  │       │    query    │
//!  │  (values)   │       │ (key names) │       │  (filters)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │ connection  │
//!                        │ (kv store)  │
//!                        └─────────────┘
//! ```
//!
//! Records live in hashes keyed `{table}:{id}`; every indexed attribute
//! value owns a set keyed `{table}.index:{column}:{hash}` holding the ids
//! that currently carry it. The engine keeps those two in step under every
//! mutation by batching record and index writes atomically.

mod engine;
mod errors;
mod hash;
mod keys;
mod sweep;
mod types;

pub use engine::RecordStore;
pub use errors::{ErrorCode, StoreError, StoreResult};
pub use hash::content_hash;
pub use keys::{index_key, index_pattern, record_key};
pub use types::{InvalidNameError, RecordId, TableName};
