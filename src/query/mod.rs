//! Query translation: the restricted filter algebra and its resolution
//! into record identifiers via index-set lookups.

mod error;
mod filter;
mod resolve;

pub use error::{QueryError, QueryResult};
pub use filter::{Condition, Criteria, Filter};
pub use resolve::resolve;
