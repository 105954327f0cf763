//! KGCFP Storage Layer
//!
//! Implements the `GraphStore` trait as a property graph on SQLite.
//!
//! # Architecture
//!
//! - `nodes`: one row per (label, id), properties as a JSON object
//! - `edges`: one row per (source, target, type), properties as a JSON object
//! - Per-label uniqueness of `id` as partial unique indexes (`uniq_<label>_id`)
//!
//! # Examples
//!
//! ```no_run
//! use kgcfp_store::SqliteGraphStore;
//!
//! let store = SqliteGraphStore::open("kgcfp.db").unwrap();
//! // Store is now ready for graph operations
//! ```

#![warn(missing_docs)]

use kgcfp_domain::{
    GraphStats, GraphStore, MergeOutcome, NodeLabel, NodeRef, Properties, RelationType,
    StoredEdge, StoredNode,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Property (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// SQLite-based implementation of `GraphStore`
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should open its own
/// `SqliteGraphStore`.
pub struct SqliteGraphStore {
    conn: Connection,
}

impl SqliteGraphStore {
    /// Open (or create) a graph database at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a fresh in-memory graph
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn constraint_name(label: NodeLabel) -> String {
        format!("uniq_{}_id", label.as_str().to_lowercase())
    }

    fn find_node_id(&self, node: NodeRef<'_>) -> Result<Option<i64>, StoreError> {
        let node_id = self
            .conn
            .query_row(
                "SELECT node_id FROM nodes WHERE label = ?1 AND id = ?2 LIMIT 1",
                params![node.label.as_str(), node.id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(node_id)
    }

    /// Nodes whose identifier or property text contains `needle`
    pub fn search_nodes(&self, needle: &str, limit: usize) -> Result<Vec<StoredNode>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT label, id, properties FROM nodes
             WHERE instr(id, ?1) > 0 OR instr(properties, ?1) > 0
             ORDER BY label, id
             LIMIT ?2",
        )?;

        let nodes = stmt
            .query_map(params![needle, limit as i64], row_to_node)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Names of the declared uniqueness constraints, sorted
    pub fn constraint_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'index' AND name LIKE 'uniq\\_%' ESCAPE '\\'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

fn invalid(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidData(message)),
    )
}

fn parse_label(column: usize, raw: &str) -> rusqlite::Result<NodeLabel> {
    NodeLabel::parse(raw).ok_or_else(|| invalid(column, format!("Unknown node label: {}", raw)))
}

fn parse_properties(column: usize, raw: &str) -> rusqlite::Result<Properties> {
    serde_json::from_str(raw).map_err(|e| invalid(column, format!("Bad properties: {}", e)))
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<StoredNode> {
    let label: String = row.get(0)?;
    let properties: String = row.get(2)?;
    Ok(StoredNode {
        label: parse_label(0, &label)?,
        id: row.get(1)?,
        properties: parse_properties(2, &properties)?,
    })
}

impl GraphStore for SqliteGraphStore {
    type Error = StoreError;

    fn clear(&mut self) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM edges", [])?;
        tx.execute("DELETE FROM nodes", [])?;
        tx.commit()?;
        Ok(())
    }

    fn ensure_unique_id(&mut self, label: NodeLabel) -> Result<(), Self::Error> {
        // Labels come from a closed enum, so interpolating them is safe.
        let sql = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON nodes(id) WHERE label = '{}'",
            Self::constraint_name(label),
            label.as_str()
        );
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    fn upsert_node(
        &mut self,
        label: NodeLabel,
        id: &str,
        properties: &Properties,
    ) -> Result<(), Self::Error> {
        let encoded = serde_json::to_string(properties)?;

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE nodes SET properties = ?3 WHERE label = ?1 AND id = ?2",
            params![label.as_str(), id, &encoded],
        )?;
        if updated == 0 {
            tx.execute(
                "INSERT INTO nodes (label, id, properties) VALUES (?1, ?2, ?3)",
                params![label.as_str(), id, &encoded],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn merge_edge(
        &mut self,
        source: NodeRef<'_>,
        relation: &RelationType,
        target: NodeRef<'_>,
        properties: &Properties,
    ) -> Result<MergeOutcome, Self::Error> {
        let (Some(source_node), Some(target_node)) =
            (self.find_node_id(source)?, self.find_node_id(target)?)
        else {
            debug!(
                "Skipping {} edge {}:{} -> {}:{}: endpoint missing",
                relation, source.label, source.id, target.label, target.id
            );
            return Ok(MergeOutcome::Skipped);
        };

        let encoded = serde_json::to_string(properties)?;
        self.conn.execute(
            "INSERT INTO edges (source_node, target_node, rel_type, properties)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source_node, target_node, rel_type) DO UPDATE SET
             properties = excluded.properties",
            params![source_node, target_node, relation.as_str(), &encoded],
        )?;

        Ok(MergeOutcome::Merged)
    }

    fn get_node(&self, label: NodeLabel, id: &str) -> Result<Option<StoredNode>, Self::Error> {
        let node = self
            .conn
            .query_row(
                "SELECT label, id, properties FROM nodes WHERE label = ?1 AND id = ?2 LIMIT 1",
                params![label.as_str(), id],
                row_to_node,
            )
            .optional()?;
        Ok(node)
    }

    fn outgoing_edges(&self, node: NodeRef<'_>) -> Result<Vec<StoredEdge>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT s.label, s.id, e.rel_type, t.label, t.id, e.properties
             FROM edges e
             JOIN nodes s ON s.node_id = e.source_node
             JOIN nodes t ON t.node_id = e.target_node
             WHERE s.label = ?1 AND s.id = ?2
             ORDER BY e.rel_type, t.id",
        )?;

        let edges = stmt
            .query_map(params![node.label.as_str(), node.id], |row| {
                let source_label: String = row.get(0)?;
                let relation: String = row.get(2)?;
                let target_label: String = row.get(3)?;
                let properties: String = row.get(5)?;

                Ok(StoredEdge {
                    source_label: parse_label(0, &source_label)?,
                    source_id: row.get(1)?,
                    relation: RelationType::parse(&relation),
                    target_label: parse_label(3, &target_label)?,
                    target_id: row.get(4)?,
                    properties: parse_properties(5, &properties)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    fn stats(&self) -> Result<GraphStats, Self::Error> {
        let mut stats = GraphStats::default();

        let mut stmt = self
            .conn
            .prepare("SELECT label, COUNT(*) FROM nodes GROUP BY label")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (label, count) = row?;
            stats.nodes_by_label.insert(label, count as usize);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT rel_type, COUNT(*) FROM edges GROUP BY rel_type")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (relation, count) = row?;
            stats.edges_by_type.insert(relation, count as usize);
        }

        Ok(stats)
    }
}
