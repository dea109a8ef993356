//! Connection layer: the contract between the record store and its backing
//! key-value store.
//!
//! The engine never talks to a driver directly; it consumes the
//! [`KvConnection`] trait, which models the minimum primitive set it needs
//! (hash maps, sets, existence, pattern scans, and batching with an atomic
//! variant). [`MemoryConnection`] is the in-process implementation used by
//! the test suite and embedded callers; a networked backend implements the
//! same trait against a real deployment.

mod command;
mod error;
mod kv;
mod memory;

pub use command::{Command, Reply, ScanPage};
pub use error::{ConnResult, ConnectionError};
pub use kv::KvConnection;
pub use memory::MemoryConnection;
