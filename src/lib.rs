//! RedStore - a Redis-backed indexed record store
//!
//! This crate maps a relational-style data-access contract (create / find /
//! update / destroy / count against named tables with typed attributes and
//! secondary indexes) onto a schemaless key-value store whose only
//! primitives are string keys, hash maps, and sets. Records live in hashes,
//! every indexed attribute value owns a set of record identifiers, and
//! mutations keep the two consistent through atomic command batches.
//!
//! # Example
//!
//! ```
//! use redstore::codec::Value;
//! use redstore::datastore::Datastore;
//! use redstore::query::{Criteria, Filter};
//! use redstore::schema::{AttrType, AttributeDef, SchemaBuilder};
//!
//! let ds = Datastore::in_memory();
//! let users = ds.register(
//!     SchemaBuilder::new("users")
//!         .attribute(AttributeDef::new("firstName", AttrType::String).indexed())
//!         .add_attribute("lastName", AttrType::String)
//!         .build()?,
//! )?;
//!
//! let ada = users.create([("firstName".to_string(), Value::from("Ada"))].into())?;
//! let found = users.find(&Criteria::new(Filter::eq("firstName", "Ada")))?;
//! assert_eq!(found, vec![ada]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod connection;
pub mod datastore;
pub mod query;
pub mod schema;
pub mod store;
