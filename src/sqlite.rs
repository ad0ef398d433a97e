use crate::config::{
    NODE_ID_COLUMN, PROGRESS_INTERVAL, REL_SOURCE_COLUMN, REL_TARGET_COLUMN, REL_TYPE_COLUMN,
};
use crate::cursor::{ColumnDescriptor, ColumnStrategy, CursorRow};
use crate::error::{ImportError, Result};
use crate::sink::GraphSink;
use crate::stats::ImportStats;
use indicatif::ProgressBar;
use rusqlite::Connection;
use tracing::{debug, info};

/// Imports a nodes table and a relationships table from a SQLite database.
///
/// Each table runs as a single unbounded `SELECT *` streaming pass. Column
/// metadata is read once, before any row; structural columns (identifier;
/// source/target/type) are configurable per stream, and every other column
/// becomes a property unless an explicit property-column list narrows the
/// selection.
pub struct SqliteImporter {
    nodes_table: String,
    rels_table: String,
    node_id_column: String,
    rel_source_column: String,
    rel_target_column: String,
    rel_type_column: String,
    node_properties: Option<Vec<String>>,
    rel_properties: Option<Vec<String>>,
}

impl SqliteImporter {
    pub fn new(nodes_table: impl Into<String>, rels_table: impl Into<String>) -> Self {
        Self {
            nodes_table: nodes_table.into(),
            rels_table: rels_table.into(),
            node_id_column: NODE_ID_COLUMN.to_string(),
            rel_source_column: REL_SOURCE_COLUMN.to_string(),
            rel_target_column: REL_TARGET_COLUMN.to_string(),
            rel_type_column: REL_TYPE_COLUMN.to_string(),
            node_properties: None,
            rel_properties: None,
        }
    }

    /// Overrides the node identifier column.
    pub fn with_node_id_column(mut self, column: impl Into<String>) -> Self {
        self.node_id_column = column.into();
        self
    }

    /// Overrides the relationship structural columns.
    pub fn with_rel_columns(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.rel_source_column = source.into();
        self.rel_target_column = target.into();
        self.rel_type_column = type_name.into();
        self
    }

    /// Restricts node properties to exactly these columns.
    pub fn with_node_properties(mut self, columns: Vec<String>) -> Self {
        self.node_properties = Some(columns);
        self
    }

    /// Restricts relationship properties to exactly these columns.
    pub fn with_rel_properties(mut self, columns: Vec<String>) -> Self {
        self.rel_properties = Some(columns);
        self
    }

    /// Runs the whole import: the node stream, then the relationship
    /// stream, then sink shutdown. Any error abandons the run as a whole.
    pub fn import_to<S: GraphSink>(
        &self,
        conn: &Connection,
        sink: &mut S,
    ) -> Result<ImportStats> {
        let mut stats = ImportStats::new();
        self.import_nodes(conn, sink, &mut stats)?;
        self.import_rels(conn, sink, &mut stats)?;
        sink.shutdown().map_err(ImportError::failed)?;
        Ok(stats)
    }

    fn import_nodes<S: GraphSink>(
        &self,
        conn: &Connection,
        sink: &mut S,
        stats: &mut ImportStats,
    ) -> Result<()> {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", self.nodes_table))?;
        let descriptors = column_descriptors(&stmt);
        debug!(
            table = %self.nodes_table,
            columns = descriptors.len(),
            "Read node column metadata"
        );

        let mut strategy = match &self.node_properties {
            Some(columns) => ColumnStrategy::allowing(columns),
            None => ColumnStrategy::excluding([self.node_id_column.as_str()]),
        };
        strategy.initialize(&descriptors)?;

        let pb = ProgressBar::new_spinner();
        pb.set_message("Importing nodes");

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(self.node_id_column.as_str())?;
            let properties = strategy.row_properties(&SqliteRow(row))?;
            stats.add_properties(properties.len() as u64);
            sink.create_node(id, &properties)
                .map_err(ImportError::failed)?;
            stats.inc_nodes();
            if stats.nodes_created % PROGRESS_INTERVAL == 0 {
                pb.tick();
                info!(nodes = stats.nodes_created, "Created nodes");
            }
        }

        pb.finish_and_clear();
        info!(nodes = stats.nodes_created, "Node stream complete");
        Ok(())
    }

    fn import_rels<S: GraphSink>(
        &self,
        conn: &Connection,
        sink: &mut S,
        stats: &mut ImportStats,
    ) -> Result<()> {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {}", self.rels_table))?;
        let descriptors = column_descriptors(&stmt);
        debug!(
            table = %self.rels_table,
            columns = descriptors.len(),
            "Read relationship column metadata"
        );

        let mut strategy = match &self.rel_properties {
            Some(columns) => ColumnStrategy::allowing(columns),
            None => ColumnStrategy::excluding([
                self.rel_source_column.as_str(),
                self.rel_target_column.as_str(),
                self.rel_type_column.as_str(),
            ]),
        };
        strategy.initialize(&descriptors)?;

        let pb = ProgressBar::new_spinner();
        pb.set_message("Importing relationships");

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let from: i64 = row.get(self.rel_source_column.as_str())?;
            let to: i64 = row.get(self.rel_target_column.as_str())?;
            let type_name: Option<String> = row.get(self.rel_type_column.as_str())?;
            let type_name = type_name.ok_or_else(|| {
                ImportError::MalformedRelationship(format!(
                    "NULL {} for relationship {from}->{to}",
                    self.rel_type_column
                ))
            })?;
            let properties = strategy.row_properties(&SqliteRow(row))?;
            stats.add_properties(properties.len() as u64);
            sink.create_relationship(from, to, &type_name, &properties)
                .map_err(ImportError::failed)?;
            stats.inc_relationships();
            if stats.relationships_created % PROGRESS_INTERVAL == 0 {
                pb.tick();
                info!(
                    relationships = stats.relationships_created,
                    "Created relationships"
                );
            }
        }

        pb.finish_and_clear();
        info!(
            relationships = stats.relationships_created,
            "Relationship stream complete"
        );
        Ok(())
    }
}

fn column_descriptors(stmt: &rusqlite::Statement<'_>) -> Vec<ColumnDescriptor> {
    stmt.columns()
        .iter()
        .map(|column| ColumnDescriptor::new(column.name(), column.decl_type().unwrap_or("")))
        .collect()
}

/// Adapts one rusqlite row to the cursor accessor seam.
struct SqliteRow<'a, 'stmt>(&'a rusqlite::Row<'stmt>);

impl CursorRow for SqliteRow<'_, '_> {
    fn get_string(&self, column: &str) -> anyhow::Result<Option<String>> {
        Ok(self.0.get(column)?)
    }

    fn get_long(&self, column: &str) -> anyhow::Result<Option<i64>> {
        Ok(self.0.get(column)?)
    }

    fn get_int(&self, column: &str) -> anyhow::Result<Option<i32>> {
        Ok(self.0.get(column)?)
    }

    fn get_short(&self, column: &str) -> anyhow::Result<Option<i16>> {
        Ok(self.0.get(column)?)
    }

    fn get_byte(&self, column: &str) -> anyhow::Result<Option<i8>> {
        Ok(self.0.get(column)?)
    }

    fn get_boolean(&self, column: &str) -> anyhow::Result<Option<bool>> {
        Ok(self.0.get(column)?)
    }

    fn get_float(&self, column: &str) -> anyhow::Result<Option<f32>> {
        Ok(self.0.get(column)?)
    }

    fn get_double(&self, column: &str) -> anyhow::Result<Option<f64>> {
        Ok(self.0.get(column)?)
    }
}
