//! Lineage Storage Layer
//!
//! Implements the TreeStore trait on SQLite as a small document store.
//!
//! # Architecture
//!
//! - One row per tree, holding the whole tree as a JSON document
//! - `id` and `name` are duplicated into columns for listing and lookup
//! - Relation consistency is the domain's job; the store persists what it is given
//!
//! # Examples
//!
//! ```no_run
//! use lineage_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for tree operations
//! ```

#![warn(missing_docs)]

use lineage_domain::traits::TreeStore;
use lineage_domain::{FamilyTree, TreeId};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Tree not found
    #[error("Family tree not found: {0}")]
    NotFound(String),

    /// A tree with this ID already exists
    #[error("Family tree already exists: {0}")]
    Duplicate(String),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row does not match its document
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of TreeStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Callers sharing a store across
/// tasks must wrap it in a mutex; holding that lock across a load-edit-save
/// cycle also serializes concurrent edits of the same tree.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lineage_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("lineage.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of stored trees
    pub fn tree_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM family_trees", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Milliseconds since the Unix epoch
    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default()
    }

    /// Parse a stored document and check it belongs to its row
    fn decode(row_id: &str, document: &str) -> Result<FamilyTree, StoreError> {
        let tree: FamilyTree = serde_json::from_str(document)?;
        if tree.id.as_str() != row_id {
            return Err(StoreError::InvalidData(format!(
                "Row {} holds document for tree {}",
                row_id, tree.id
            )));
        }
        Ok(tree)
    }
}

impl TreeStore for SqliteStore {
    type Error = StoreError;

    fn list_trees(&self) -> Result<Vec<FamilyTree>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, document FROM family_trees ORDER BY created_at, rowid",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|(id, document)| Self::decode(id, document))
            .collect()
    }

    fn get_tree(&self, id: &TreeId) -> Result<Option<FamilyTree>, Self::Error> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM family_trees WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        document
            .map(|doc| Self::decode(id.as_str(), &doc))
            .transpose()
    }

    fn insert_tree(&mut self, tree: &FamilyTree) -> Result<(), Self::Error> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM family_trees WHERE id = ?1",
                params![tree.id.as_str()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::Duplicate(tree.id.to_string()));
        }

        let document = serde_json::to_string(tree)?;
        let now = Self::now_millis();

        self.conn.execute(
            "INSERT INTO family_trees (id, name, document, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![tree.id.as_str(), &tree.name, &document, now],
        )?;

        debug!(tree_id = %tree.id, members = tree.len(), "Inserted family tree");
        Ok(())
    }

    fn save_tree(&mut self, tree: &FamilyTree) -> Result<(), Self::Error> {
        let document = serde_json::to_string(tree)?;

        let updated = self.conn.execute(
            "UPDATE family_trees SET name = ?2, document = ?3, updated_at = ?4 WHERE id = ?1",
            params![tree.id.as_str(), &tree.name, &document, Self::now_millis()],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(tree.id.to_string()));
        }

        debug!(tree_id = %tree.id, members = tree.len(), "Saved family tree");
        Ok(())
    }

    fn delete_tree(&mut self, id: &TreeId) -> Result<bool, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM family_trees WHERE id = ?1",
            params![id.as_str()],
        )?;

        debug!(tree_id = %id, deleted, "Deleted family tree");
        Ok(deleted > 0)
    }
}
