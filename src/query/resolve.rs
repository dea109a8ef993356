//! Filter resolution: from a filter expression to record identifiers.

use super::error::{QueryError, QueryResult};
use super::filter::{Condition, Filter};
use crate::codec::{serialize_value, Value};
use crate::connection::KvConnection;
use crate::schema::{AttributeDef, TableSchema};
use crate::store::{index_key, RecordId};

/// Resolve a filter into the identifiers of matching records.
///
/// `indexes` is the store's derived list of indexed storage columns.
/// Primary-key filters short-circuit without touching the store; indexed
/// attributes go through one `SMEMBERS` (equality) or one `SUNION`
/// (membership). A null/empty filter value matches nothing, since absent
/// values are never indexed.
pub fn resolve(
    conn: &dyn KvConnection,
    schema: &TableSchema,
    indexes: &[String],
    filter: &Filter,
) -> QueryResult<Vec<RecordId>> {
    let map = match filter {
        Filter::And(inner) => {
            // only the single-hop relationship shape is supported
            return match inner.as_slice() {
                [single] => resolve(conn, schema, indexes, single),
                _ => Err(QueryError::InvalidQuery(format!(
                    "\"and\" must contain exactly one filter, found {}",
                    inner.len()
                ))),
            };
        }
        Filter::Where(map) => map,
    };

    if map.is_empty() {
        return Err(QueryError::EmptyQuery);
    }
    if map.len() > 1 {
        return Err(QueryError::MultiAttrQuery);
    }

    let (name, condition) = map.iter().next().expect("map has one entry");
    let attr = schema
        .resolve(name)
        .ok_or_else(|| QueryError::UnknownAttribute(name.clone()))?;

    if attr.name == schema.primary_key {
        return resolve_primary_key(attr, condition);
    }

    if !indexes.iter().any(|c| c == attr.column()) {
        return Err(QueryError::NotIndexed(name.clone()));
    }

    match condition {
        Condition::Eq(value) => {
            let Some(serialized) = serialize_filter_value(attr, value)? else {
                return Ok(Vec::new());
            };
            let key = index_key(&schema.table, attr.column(), Some(&serialized));
            ids_from_members(conn.smembers(&key)?)
        }
        Condition::In(values) => {
            let mut keys = Vec::with_capacity(values.len());
            for value in values {
                if let Some(serialized) = serialize_filter_value(attr, value)? {
                    keys.push(index_key(&schema.table, attr.column(), Some(&serialized)));
                }
            }
            if keys.is_empty() {
                return Ok(Vec::new());
            }
            ids_from_members(conn.sunion(&keys)?)
        }
    }
}

/// Primary-key filters return the literal value(s): identifiers *are*
/// primary keys, no index lookup needed.
fn resolve_primary_key(attr: &AttributeDef, condition: &Condition) -> QueryResult<Vec<RecordId>> {
    match condition {
        Condition::Eq(value) => Ok(primary_key_id(attr, value)?.into_iter().collect()),
        Condition::In(values) => {
            let mut ids = Vec::with_capacity(values.len());
            for value in values {
                if let Some(id) = primary_key_id(attr, value)? {
                    ids.push(id);
                }
            }
            Ok(ids)
        }
    }
}

fn primary_key_id(attr: &AttributeDef, value: &Value) -> QueryResult<Option<RecordId>> {
    match serialize_filter_value(attr, value)? {
        Some(raw) => Ok(Some(RecordId::new(raw)?)),
        None => Ok(None),
    }
}

/// Serialize a filter value through the codec so the index key matches what
/// the write path produced. `None` (empty/null input) can match no record.
fn serialize_filter_value(attr: &AttributeDef, value: &Value) -> QueryResult<Option<String>> {
    Ok(serialize_value(attr.attr_type, Some(value), false)?)
}

fn ids_from_members(members: Vec<String>) -> QueryResult<Vec<RecordId>> {
    members
        .into_iter()
        .map(|m| RecordId::new(m).map_err(QueryError::from))
        .collect()
}
