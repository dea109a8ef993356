//! The datastore: an explicit context owning one connection and the
//! per-table stores registered on it.
//!
//! Lifecycle is explicit construction and teardown; there is no global
//! registry anywhere in this crate. Registering a schema hands back an
//! `Arc<RecordStore>`; dropping the datastore (or calling
//! [`teardown`](Datastore::teardown)) releases the table registry, while
//! stores already handed out keep working on the shared connection.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::connection::{KvConnection, MemoryConnection};
use crate::schema::TableSchema;
use crate::store::{RecordStore, StoreError, StoreResult};

/// A set of table stores sharing one logical connection.
pub struct Datastore {
    conn: Arc<dyn KvConnection>,
    tables: RwLock<HashMap<String, Arc<RecordStore>>>,
}

impl Datastore {
    /// Create a datastore on the given connection.
    pub fn new(conn: Arc<dyn KvConnection>) -> Self {
        Self {
            conn,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Create a datastore backed by an in-memory store (for testing and
    /// embedded use).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConnection::new()))
    }

    /// The shared connection.
    pub fn connection(&self) -> Arc<dyn KvConnection> {
        self.conn.clone()
    }

    /// Register a table, deriving its index list from the schema.
    /// Registering the same table twice is an error.
    pub fn register(&self, schema: TableSchema) -> StoreResult<Arc<RecordStore>> {
        let mut tables = self.tables.write();
        let name = schema.table.as_str().to_string();

        if tables.contains_key(&name) {
            return Err(StoreError::AlreadyRegistered(schema.table));
        }

        let store = Arc::new(RecordStore::new(schema, self.conn.clone()));
        tables.insert(name, store.clone());
        Ok(store)
    }

    /// Look up a registered table store.
    pub fn table(&self, name: &str) -> Option<Arc<RecordStore>> {
        self.tables.read().get(name).cloned()
    }

    /// Names of all registered tables.
    pub fn tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Remove a table from the registry. The store itself (and its data)
    /// is untouched; callers wanting the data gone use
    /// [`RecordStore::drop_table`] first.
    pub fn unregister(&self, name: &str) -> StoreResult<Arc<RecordStore>> {
        self.tables
            .write()
            .remove(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    /// Drop every table registration.
    pub fn teardown(&self) {
        self.tables.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::query::{Criteria, Filter};
    use crate::schema::{AttrType, AttributeDef, SchemaBuilder};
    use crate::store::ErrorCode;

    fn user_schema() -> TableSchema {
        SchemaBuilder::new("users")
            .attribute(AttributeDef::new("firstName", AttrType::String).indexed())
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let ds = Datastore::in_memory();
        ds.register(user_schema()).unwrap();

        assert!(ds.table("users").is_some());
        assert!(ds.table("ghosts").is_none());
        assert_eq!(ds.tables(), vec!["users".to_string()]);
    }

    #[test]
    fn test_duplicate_registration() {
        let ds = Datastore::in_memory();
        ds.register(user_schema()).unwrap();

        let err = ds.register(user_schema()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyRegistered);
        assert!(err.is_conflict());
    }

    #[test]
    fn test_tables_share_one_connection() {
        let ds = Datastore::in_memory();
        let users = ds.register(user_schema()).unwrap();
        let pets = ds
            .register(
                SchemaBuilder::new("pets")
                    .attribute(AttributeDef::new("name", AttrType::String).indexed())
                    .build()
                    .unwrap(),
            )
            .unwrap();

        users
            .create([("firstName".to_string(), Value::from("Ada"))].into())
            .unwrap();
        pets.create([("name".to_string(), Value::from("Rex"))].into())
            .unwrap();

        // both tables are visible through the one keyspace
        let conn = ds.connection();
        assert_eq!(conn.scan("users:*", 0, 100).unwrap().keys.len(), 1);
        assert_eq!(conn.scan("pets:*", 0, 100).unwrap().keys.len(), 1);
    }

    #[test]
    fn test_unregister_and_teardown() {
        let ds = Datastore::in_memory();
        let users = ds.register(user_schema()).unwrap();
        users
            .create([("firstName".to_string(), Value::from("Ada"))].into())
            .unwrap();

        let store = ds.unregister("users").unwrap();
        assert!(ds.table("users").is_none());
        assert!(ds.unregister("users").is_err());

        // the handed-out store still works after unregistration
        let found = store.find(&Criteria::new(Filter::eq("firstName", "Ada"))).unwrap();
        assert_eq!(found.len(), 1);

        ds.register(user_schema()).unwrap();
        ds.teardown();
        assert!(ds.tables().is_empty());
    }
}
