//! Query translation error types.

use thiserror::Error;

use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::store::InvalidNameError;

/// Errors raised while translating a filter into record identifiers.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The filter names no attribute at all.
    #[error("you must provide at least one attribute to filter results")]
    EmptyQuery,

    /// The filter names more than one attribute; the store only supports
    /// single-attribute lookups (composite filtering is the upstream ORM's
    /// job, via multiple calls).
    #[error("cannot find records using multiple attributes")]
    MultiAttrQuery,

    /// Filtering on an attribute that is neither indexed nor the primary key.
    #[error("the attribute \"{0}\" is not indexed, you can't find records using this attribute")]
    NotIndexed(String),

    /// A filter shape the translator does not support.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The filter names an attribute the schema doesn't declare.
    #[error("the attribute \"{0}\" is not present on the model definition")]
    UnknownAttribute(String),

    /// A filter value that doesn't fit the attribute's declared type.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A primary-key filter value that is not a valid record identifier.
    #[error("invalid record identifier: {0}")]
    InvalidId(#[from] InvalidNameError),

    /// Backend failure during index lookups.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// result type alias for query translation
pub type QueryResult<T> = Result<T, QueryError>;
