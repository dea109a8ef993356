//! The per-table record store engine.
//!
//! Owns one table's schema and derived index list, and composes the codec,
//! key naming, content hasher, and query translator into the operations the
//! upstream ORM calls. Every multi-step mutation (a record write plus its
//! index writes) goes to the backend as one atomic batch; multi-record
//! operations issue one *independent* batch per record (no cross-record
//! atomicity, a documented property rather than a hidden one).

use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{StoreError, StoreResult};
use super::keys::{index_key, index_pattern, record_key};
use super::sweep::delete_matching;
use super::types::{RecordId, TableName};
use crate::codec::{
    serialize_fields, serialize_record, serialize_value, unserialize_record, Record, Value,
};
use crate::connection::{Command, ConnectionError, KvConnection};
use crate::query::{resolve, Criteria, Filter};
use crate::schema::{AttributeDef, TableSchema};

/// A table-scoped store over a shared connection.
///
/// Cheap to share: hold it in an `Arc` (the datastore hands them out that
/// way) and call it from as many threads as needed; all state is immutable
/// after construction.
pub struct RecordStore {
    conn: Arc<dyn KvConnection>,
    schema: TableSchema,
    /// Storage columns with a secondary index, derived once at registration.
    indexes: Vec<String>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("schema", &self.schema)
            .field("indexes", &self.indexes)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Create a store for the given schema on a shared connection.
    pub fn new(schema: TableSchema, conn: Arc<dyn KvConnection>) -> Self {
        let indexes = schema.indexed_columns();
        Self { conn, schema, indexes }
    }

    /// The table schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The table this store operates on.
    pub fn table(&self) -> &TableName {
        &self.schema.table
    }

    /// Indexed storage columns.
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    fn record_key(&self, id: &RecordId) -> String {
        record_key(self.table(), Some(id))
    }

    fn index_key(&self, column: &str, serialized: &str) -> String {
        index_key(self.table(), column, Some(serialized))
    }

    /// Create a record.
    ///
    /// Generates a fresh identifier when the primary key is absent. When the
    /// caller supplies one, existence is checked first and a taken key fails
    /// with `E_UNIQUE`. Note the check-then-act window: two concurrent
    /// creates with the same identifier can both pass the check, since the
    /// minimal command set has no conditional write. The record hash and all
    /// index additions are applied as one atomic batch. Returns the created
    /// record.
    pub fn create(&self, attributes: Record) -> StoreResult<Record> {
        let mut attrs = attributes;
        let pk = self.schema.primary_key.clone();
        let pk_attr = self.schema.primary_key_attr();

        let supplied = attrs
            .get(&pk)
            .or_else(|| attrs.get(self.schema.primary_key_column()))
            .cloned();

        let id = match supplied {
            Some(value) => {
                let raw = serialize_value(pk_attr.attr_type, Some(&value), true)?
                    .expect("required serialization always yields a value");
                let id = RecordId::new(raw)?;
                if self.count(std::slice::from_ref(&id))? > 0 {
                    return Err(StoreError::UniqueViolation {
                        table: self.table().clone(),
                        key: pk,
                        id,
                    });
                }
                id
            }
            None => {
                let id = RecordId::generate();
                attrs.insert(pk, Value::from(id.as_str()));
                id
            }
        };

        let fields = serialize_record(&self.schema, &attrs)?;

        let mut batch = Vec::with_capacity(1 + self.indexes.len());
        batch.push(Command::HSet {
            key: self.record_key(&id),
            fields: fields.iter().map(|(f, v)| (f.clone(), v.clone())).collect(),
        });
        for column in &self.indexes {
            if let Some(value) = fields.get(column) {
                batch.push(Command::SAdd {
                    key: self.index_key(column, value),
                    members: vec![id.to_string()],
                });
            }
        }
        self.conn.exec_multi(&batch)?;

        Ok(attrs)
    }

    /// Resolve a filter into matching record identifiers.
    pub fn fetch_ids(&self, filter: &Filter) -> StoreResult<Vec<RecordId>> {
        Ok(resolve(self.conn.as_ref(), &self.schema, &self.indexes, filter)?)
    }

    /// Fetch records by identifier, in input order, in one pipelined round
    /// trip. Identifiers whose record no longer exists are silently skipped;
    /// that is how a concurrent destroy is tolerated. `select` restricts
    /// the fetched attributes (default: all declared attributes).
    pub fn find_by_ids(&self, ids: &[RecordId], select: Option<&[String]>) -> StoreResult<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let columns = self.select_columns(select)?;
        let pk_column = self.schema.primary_key_column().to_string();

        let commands: Vec<Command> = ids
            .iter()
            .map(|id| Command::HmGet {
                key: self.record_key(id),
                fields: std::iter::once(pk_column.clone())
                    .chain(columns.iter().cloned())
                    .collect(),
            })
            .collect();

        let replies = self.conn.pipeline(&commands)?;
        if replies.len() != commands.len() {
            return Err(protocol_error("one reply per fetched record").into());
        }

        let mut records = Vec::with_capacity(replies.len());
        for reply in replies {
            let values = reply
                .into_fields()
                .ok_or_else(|| protocol_error("fields reply to HMGET"))?;
            let mut values = values.into_iter();

            // a missing primary-key field means the record is gone
            match values.next() {
                Some(Some(_)) => {}
                _ => continue,
            }

            let mut fields = BTreeMap::new();
            for (column, value) in columns.iter().zip(values) {
                if let Some(value) = value {
                    fields.insert(column.clone(), value);
                }
            }
            records.push(unserialize_record(&self.schema, &fields)?);
        }

        Ok(records)
    }

    /// Resolve a criteria's filter, then fetch the matching records.
    pub fn find(&self, criteria: &Criteria) -> StoreResult<Vec<Record>> {
        let ids = self.fetch_ids(&criteria.filter)?;
        self.find_by_ids(&ids, criteria.select.as_deref())
    }

    /// How many of the given identifiers currently have a record.
    pub fn count(&self, ids: &[RecordId]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let keys: Vec<String> = ids.iter().map(|id| self.record_key(id)).collect();
        Ok(self.conn.exists(&keys)?)
    }

    /// Whether a record with this identifier exists.
    pub fn count_one(&self, id: &RecordId) -> StoreResult<bool> {
        Ok(self.count(std::slice::from_ref(id))? > 0)
    }

    /// Resolve a filter, then update the matching records.
    pub fn update(&self, filter: &Filter, changes: &Record) -> StoreResult<()> {
        let ids = self.fetch_ids(filter)?;
        self.update_by_ids(&ids, changes)
    }

    /// Update records in place.
    ///
    /// The primary key is immutable. Current records are fetched first so
    /// index maintenance runs against the values actually stored: for every
    /// changed indexed attribute the identifier leaves the old value's set
    /// and, unless the attribute is being cleared (null/empty input), joins
    /// the new value's. Unchanged attributes are skipped, records with
    /// nothing to do get no batch, and matching zero records is a no-op.
    /// Each record's field and index writes form one atomic batch; batches
    /// are pipelined together but independent of each other.
    pub fn update_by_ids(&self, ids: &[RecordId], changes: &Record) -> StoreResult<()> {
        for key in changes.keys() {
            if self.schema.is_primary_key(key) {
                return Err(StoreError::ImmutableKey(self.schema.primary_key.clone()));
            }
        }

        if ids.is_empty() {
            return Ok(());
        }

        let fields = serialize_fields(&self.schema, changes)?;
        if fields.is_empty() {
            return Ok(());
        }

        let records = self.find_by_ids(ids, None)?;
        if records.is_empty() {
            return Ok(());
        }

        let mut batches = Vec::with_capacity(records.len());
        for record in &records {
            let id = self.record_id(record)?;
            let key = self.record_key(&id);

            let mut clears = Vec::new();
            let mut sets = Vec::new();
            let mut index_writes = Vec::new();

            for (column, new_value) in &fields {
                let attr = self
                    .schema
                    .resolve(column)
                    .expect("serialized fields always resolve");
                let old_value = self.stored_value(attr, record)?;
                let indexed = self.indexes.iter().any(|c| c == column);

                match new_value {
                    // clearing: delete the field and leave the old index set
                    None => {
                        let Some(old) = old_value else { continue };
                        clears.push(column.clone());
                        if indexed {
                            index_writes.push(Command::SRem {
                                key: self.index_key(column, &old),
                                members: vec![id.to_string()],
                            });
                        }
                    }
                    Some(new) => {
                        if old_value.as_deref() == Some(new.as_str()) {
                            continue;
                        }
                        sets.push((column.clone(), new.clone()));
                        if indexed {
                            if let Some(old) = &old_value {
                                index_writes.push(Command::SRem {
                                    key: self.index_key(column, old),
                                    members: vec![id.to_string()],
                                });
                            }
                            index_writes.push(Command::SAdd {
                                key: self.index_key(column, new),
                                members: vec![id.to_string()],
                            });
                        }
                    }
                }
            }

            let mut batch = Vec::new();
            if !clears.is_empty() {
                batch.push(Command::HDel { key: key.clone(), fields: clears });
            }
            if !sets.is_empty() {
                batch.push(Command::HSet { key, fields: sets });
            }
            batch.extend(index_writes);

            if !batch.is_empty() {
                batches.push(batch);
            }
        }

        if !batches.is_empty() {
            self.conn.exec_multi_pipeline(&batches)?;
        }
        Ok(())
    }

    /// Resolve a filter, then destroy the matching records.
    pub fn destroy(&self, filter: &Filter) -> StoreResult<Vec<Record>> {
        let ids = self.fetch_ids(filter)?;
        self.destroy_by_ids(&ids)
    }

    /// Destroy records, removing each record hash and every index-set
    /// membership it currently holds: one atomic batch per record, batches
    /// pipelined together. Returns the pre-deletion records.
    pub fn destroy_by_ids(&self, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.find_by_ids(ids, None)?;

        let mut batches = Vec::with_capacity(records.len());
        for record in &records {
            let id = self.record_id(record)?;
            let mut batch = vec![Command::Del { key: self.record_key(&id) }];

            for column in &self.indexes {
                let attr = self
                    .schema
                    .resolve(column)
                    .expect("indexed columns always resolve");
                if let Some(old) = self.stored_value(attr, record)? {
                    batch.push(Command::SRem {
                        key: self.index_key(column, &old),
                        members: vec![id.to_string()],
                    });
                }
            }
            batches.push(batch);
        }

        if !batches.is_empty() {
            self.conn.exec_multi_pipeline(&batches)?;
        }
        Ok(records)
    }

    /// Delete every record and every index set of this table. Idempotent;
    /// safe on an empty table.
    pub fn drop_table(&self) -> StoreResult<()> {
        delete_matching(self.conn.as_ref(), &record_key(self.table(), None))?;
        delete_matching(self.conn.as_ref(), &index_pattern(self.table()))?;
        Ok(())
    }

    /// Map a `select` list (attribute or column names) to storage columns;
    /// `None` selects every persisted attribute.
    fn select_columns(&self, select: Option<&[String]>) -> StoreResult<Vec<String>> {
        match select {
            None => Ok(self
                .schema
                .attributes
                .iter()
                .filter(|a| !a.is_collection())
                .map(|a| a.column().to_string())
                .collect()),
            Some(names) => {
                let mut columns = Vec::with_capacity(names.len());
                for name in names {
                    let attr = self.schema.resolve(name).ok_or_else(|| {
                        StoreError::Codec(crate::codec::CodecError::UnknownAttribute(name.clone()))
                    })?;
                    if attr.is_collection() {
                        continue;
                    }
                    columns.push(attr.column().to_string());
                }
                Ok(columns)
            }
        }
    }

    /// The serialized form of an attribute's current value, as storage holds
    /// it. Required-ness is relaxed here: this feeds index-key derivation
    /// for updates and destroys, which must work on legacy rows too.
    fn stored_value(&self, attr: &AttributeDef, record: &Record) -> StoreResult<Option<String>> {
        Ok(serialize_value(attr.attr_type, record.get(&attr.name), false)?)
    }

    fn record_id(&self, record: &Record) -> StoreResult<RecordId> {
        let raw = record
            .get(&self.schema.primary_key)
            .and_then(Value::as_str)
            .ok_or_else(|| protocol_error("fetched record carries its primary key"))?;
        Ok(RecordId::new(raw)?)
    }
}

fn protocol_error(expected: &str) -> ConnectionError {
    ConnectionError::Protocol(format!("backend violated the batch contract: expected {expected}"))
}
