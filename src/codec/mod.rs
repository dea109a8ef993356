//! Value codec: typed attribute values and their wire-safe string forms.
//!
//! The stored representation is the contract with existing deployments: it
//! is what record hashes hold and what index-key hashes are computed from,
//! so serialization here is canonical and deterministic.

mod serializer;
mod value;

pub use serializer::{
    serialize_fields, serialize_record, serialize_value, unserialize_record, unserialize_value,
    CodecError,
};
pub use value::{Record, Value};
