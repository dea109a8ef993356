//! Batched command vocabulary.
//!
//! Everything the record store batches through a pipeline or an atomic
//! `MULTI` is one of these commands. Backends answer every batch with one
//! [`Reply`] per command, in order.

/// A single storage command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write fields into a hash (creating it if absent).
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Delete fields from a hash. Deleting the last field deletes the key.
    HDel { key: String, fields: Vec<String> },
    /// Read the given fields from a hash; absent fields (or an absent key)
    /// come back as `None`.
    HmGet { key: String, fields: Vec<String> },
    /// Delete a key of any kind.
    Del { key: String },
    /// Add members to a set (creating it if absent).
    SAdd { key: String, members: Vec<String> },
    /// Remove members from a set. Removing the last member deletes the key.
    SRem { key: String, members: Vec<String> },
}

impl Command {
    /// The key this command operates on.
    pub fn key(&self) -> &str {
        match self {
            Command::HSet { key, .. }
            | Command::HDel { key, .. }
            | Command::HmGet { key, .. }
            | Command::Del { key }
            | Command::SAdd { key, .. }
            | Command::SRem { key, .. } => key,
        }
    }
}

/// The reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain acknowledgement (`HSet`).
    Unit,
    /// A count (`HDel`, `Del`, `SAdd`, `SRem`).
    Int(usize),
    /// Per-field values for `HmGet`.
    Fields(Vec<Option<String>>),
}

impl Reply {
    /// Extract the field values of an `HmGet` reply.
    pub fn into_fields(self) -> Option<Vec<Option<String>>> {
        match self {
            Reply::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

/// One page of a cursor-driven key scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    /// Keys matched on this page. May be empty even mid-scan.
    pub keys: Vec<String>,
    /// Cursor for the next page; `None` when the scan has completed.
    pub cursor: Option<u64>,
}

impl ScanPage {
    /// A terminal page with no keys.
    pub fn done() -> Self {
        Self { keys: Vec::new(), cursor: None }
    }
}
