//! Core Store implementation

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;

/// Current time as Unix milliseconds
fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Value of an indexed field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl IndexValue {
    /// Canonical text form stored in the index table
    fn as_key(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for IndexValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for IndexValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Comparison applied by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

/// Query filter on an indexed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    /// Equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Inequality filter (documents without the field also match)
    pub fn ne(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ne,
            value: value.into(),
        }
    }
}

/// A document type stored in a collection
pub trait Record: Serialize + DeserializeOwned {
    /// Document ID, unique within the collection
    fn id(&self) -> &str;

    /// Collection this record type lives in
    fn collection_name() -> &'static str;

    /// Fields that can be used in [`Filter`] queries
    fn indexed_fields(&self) -> HashMap<String, IndexValue>;
}

/// A single pending write
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        body: String,
        indexes: Vec<(String, String)>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Group of writes applied in one transaction
///
/// Nothing is written until the batch is passed to [`Store::commit`]; a
/// dropped batch leaves the store untouched.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a create-or-replace of a record
    pub fn set<R: Record>(&mut self, record: &R) -> Result<&mut Self, StoreError> {
        let body = serde_json::to_string(record)?;
        let mut indexes: Vec<(String, String)> = record
            .indexed_fields()
            .into_iter()
            .map(|(field, value)| (field, value.as_key()))
            .collect();
        indexes.sort();
        self.ops.push(WriteOp::Set {
            collection: R::collection_name().to_string(),
            id: record.id().to_string(),
            body,
            indexes,
        });
        Ok(self)
    }

    /// Queue a delete; deleting a missing document is not an error
    pub fn delete<R: Record>(&mut self, id: &str) -> &mut Self {
        self.delete_raw(R::collection_name(), id)
    }

    pub fn delete_raw(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE TABLE IF NOT EXISTS document_indexes (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    field TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (collection, id, field)
);
CREATE INDEX IF NOT EXISTS idx_document_indexes_lookup
    ON document_indexes (collection, field, value);
";

/// The document store
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a store in the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        let db_path = base_path.join(crate::DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA)?;
        debug!(db_path = %db_path.display(), "Opened document store");
        Ok(Self { conn })
    }

    /// Open a throwaway store that lives only in memory
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Start a new batch
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply every write in the batch, or none of them
    pub fn commit(&mut self, batch: WriteBatch) -> Result<usize, StoreError> {
        debug!(ops = batch.len(), "commit: called");
        let now = now_ms();
        let tx = self.conn.transaction()?;
        for op in &batch.ops {
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    body,
                    indexes,
                } => {
                    tx.execute(
                        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                        params![collection, id, body, now],
                    )?;
                    tx.execute(
                        "DELETE FROM document_indexes WHERE collection = ?1 AND id = ?2",
                        params![collection, id],
                    )?;
                    for (field, value) in indexes {
                        tx.execute(
                            "INSERT INTO document_indexes (collection, id, field, value) VALUES (?1, ?2, ?3, ?4)",
                            params![collection, id, field, value],
                        )?;
                    }
                }
                WriteOp::Delete { collection, id } => {
                    tx.execute(
                        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                        params![collection, id],
                    )?;
                    tx.execute(
                        "DELETE FROM document_indexes WHERE collection = ?1 AND id = ?2",
                        params![collection, id],
                    )?;
                }
            }
        }
        tx.commit()?;
        info!(ops = batch.len(), "Committed batch");
        Ok(batch.len())
    }

    /// Create or replace a single record
    pub fn put<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let mut batch = self.batch();
        batch.set(record)?;
        self.commit(batch)?;
        Ok(())
    }

    /// Delete a single record
    pub fn delete<R: Record>(&mut self, id: &str) -> Result<(), StoreError> {
        let mut batch = self.batch();
        batch.delete::<R>(id);
        self.commit(batch)?;
        Ok(())
    }

    /// Fetch a record by ID
    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        match self.get_raw(R::collection_name(), id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn get_raw(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// List records matching every filter, ordered by ID
    pub fn list<R: Record>(&self, filters: &[Filter]) -> Result<Vec<R>, StoreError> {
        self.list_raw(R::collection_name(), filters)?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .collect()
    }

    pub fn list_raw(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        debug!(%collection, filter_count = filters.len(), "list_raw: called");
        let mut sql = String::from("SELECT body FROM documents WHERE collection = ?");
        let mut values = vec![collection.to_string()];
        for filter in filters {
            let membership = match filter.op {
                FilterOp::Eq => "IN",
                FilterOp::Ne => "NOT IN",
            };
            sql.push_str(&format!(
                " AND id {} (SELECT id FROM document_indexes WHERE collection = ? AND field = ? AND value = ?)",
                membership
            ));
            values.push(collection.to_string());
            values.push(filter.field.clone());
            values.push(filter.value.as_key());
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;
        let mut documents = Vec::new();
        for body in rows {
            documents.push(serde_json::from_str(&body?)?);
        }
        Ok(documents)
    }

    /// Collection names with their document counts
    pub fn collections(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    #[cfg(test)]
    fn conn(&self) -> &Connection {
        &self.conn
    }
}
