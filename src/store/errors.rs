//! Record store error types.
//!
//! Errors from every layer funnel into [`StoreError`], which is what the
//! operations on [`RecordStore`](super::RecordStore) surface. Callers that
//! need to branch programmatically (the upstream ORM does, to distinguish a
//! duplicate key from a backend failure) use [`StoreError::code`] rather
//! than matching on message text.

use thiserror::Error;

use super::types::{InvalidNameError, RecordId, TableName};
use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::query::QueryError;
use crate::schema::SchemaError;

/// the main error type for record store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// create() with an explicit primary key that is already taken.
    #[error("already exists a record with \"{key}\"=\"{id}\" on {table}")]
    UniqueViolation {
        table: TableName,
        key: String,
        id: RecordId,
    },

    /// update() attempted to change the primary key.
    #[error("the primary key \"{0}\" cannot be changed")]
    ImmutableKey(String),

    /// A table was registered twice on one datastore.
    #[error("table \"{0}\" has already been registered")]
    AlreadyRegistered(TableName),

    /// An operation referenced a table the datastore doesn't know.
    #[error("table \"{0}\" is not registered")]
    UnknownTable(String),

    /// codec violation (bad type, missing required value, unknown attribute)
    #[error("serialization error: {0}")]
    Codec(#[from] CodecError),

    /// malformed or unsupported filter
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// backend failure, propagated unchanged
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// invalid table name or record identifier
    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// schema metadata failed validation
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Machine-readable error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unique,
    ImmutableKey,
    Required,
    Type,
    UnknownAttribute,
    EmptyQuery,
    MultiAttrQuery,
    NotIndexed,
    InvalidQuery,
    InvalidName,
    AlreadyRegistered,
    UnknownTable,
    Schema,
    Connection,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unique => "E_UNIQUE",
            ErrorCode::ImmutableKey => "E_IMMUTABLE_KEY",
            ErrorCode::Required => "E_REQUIRED",
            ErrorCode::Type => "E_TYPE",
            ErrorCode::UnknownAttribute => "E_UNKNOWN_ATTRIBUTE",
            ErrorCode::EmptyQuery => "E_EMPTY_QUERY",
            ErrorCode::MultiAttrQuery => "E_MULTI_ATTR_QUERY",
            ErrorCode::NotIndexed => "E_NOT_INDEXED",
            ErrorCode::InvalidQuery => "E_INVALID_QUERY",
            ErrorCode::InvalidName => "E_INVALID_NAME",
            ErrorCode::AlreadyRegistered => "E_ALREADY_REGISTERED",
            ErrorCode::UnknownTable => "E_UNKNOWN_TABLE",
            ErrorCode::Schema => "E_SCHEMA",
            ErrorCode::Connection => "E_CONNECTION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StoreError {
    /// The code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::UniqueViolation { .. } => ErrorCode::Unique,
            StoreError::ImmutableKey(_) => ErrorCode::ImmutableKey,
            StoreError::AlreadyRegistered(_) => ErrorCode::AlreadyRegistered,
            StoreError::UnknownTable(_) => ErrorCode::UnknownTable,
            StoreError::Codec(e) => codec_code(e),
            StoreError::Query(e) => query_code(e),
            StoreError::Connection(_) => ErrorCode::Connection,
            StoreError::InvalidName(_) => ErrorCode::InvalidName,
            StoreError::Schema(_) => ErrorCode::Schema,
        }
    }

    /// Validation errors fail fast and are never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::ImmutableKey
                | ErrorCode::Required
                | ErrorCode::Type
                | ErrorCode::UnknownAttribute
                | ErrorCode::EmptyQuery
                | ErrorCode::MultiAttrQuery
                | ErrorCode::NotIndexed
                | ErrorCode::InvalidQuery
                | ErrorCode::InvalidName
                | ErrorCode::Schema
        )
    }

    /// Conflicts with existing state (duplicate key, duplicate registration).
    pub fn is_conflict(&self) -> bool {
        matches!(self.code(), ErrorCode::Unique | ErrorCode::AlreadyRegistered)
    }
}

fn codec_code(error: &CodecError) -> ErrorCode {
    match error.root() {
        CodecError::Required { .. } => ErrorCode::Required,
        CodecError::Type { .. } => ErrorCode::Type,
        CodecError::UnknownAttribute(_) => ErrorCode::UnknownAttribute,
        CodecError::Attribute { .. } => unreachable!("root() unwraps attribute wrappers"),
    }
}

fn query_code(error: &QueryError) -> ErrorCode {
    match error {
        QueryError::EmptyQuery => ErrorCode::EmptyQuery,
        QueryError::MultiAttrQuery => ErrorCode::MultiAttrQuery,
        QueryError::NotIndexed(_) => ErrorCode::NotIndexed,
        QueryError::InvalidQuery(_) => ErrorCode::InvalidQuery,
        QueryError::UnknownAttribute(_) => ErrorCode::UnknownAttribute,
        QueryError::Codec(e) => codec_code(e),
        QueryError::InvalidId(_) => ErrorCode::InvalidName,
        QueryError::Connection(_) => ErrorCode::Connection,
    }
}

/// result type alias for record store operations
pub type StoreResult<T> = Result<T, StoreError>;
