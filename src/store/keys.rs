//! Storage key derivation.
//!
//! Key formats are a wire contract shared with existing deployments and must
//! not drift:
//!
//! ```text
//! record key   {table}:{id}
//! index key    {table}.index:{column}:{content_hash(serialized)}
//! ```
//!
//! Omitting the final segment yields the `*` wildcard form used for bulk
//! scans. The validated [`TableName`] charset (no `:`, `.`, or `*`) keeps
//! record and index key spaces disjoint across tables and attributes.

use super::hash::content_hash;
use super::types::{RecordId, TableName};

/// Key of a record hash; `None` yields the table-wide scan pattern.
pub fn record_key(table: &TableName, id: Option<&RecordId>) -> String {
    match id {
        Some(id) => format!("{table}:{id}"),
        None => format!("{table}:*"),
    }
}

/// Key of one index set; `None` yields the per-attribute scan pattern.
/// `serialized` is the codec's output for the indexed value.
pub fn index_key(table: &TableName, column: &str, serialized: Option<&str>) -> String {
    match serialized {
        Some(value) => format!("{table}.index:{column}:{}", content_hash(value)),
        None => format!("{table}.index:{column}:*"),
    }
}

/// Scan pattern matching every index set of a table.
pub fn index_pattern(table: &TableName) -> String {
    format!("{table}.index:*")
}
