use crate::scalar::PropertyMap;
use anyhow::Result;
use tracing::debug;

/// The target store's bulk-insertion interface.
///
/// Implementations create entities with caller-assigned identifiers.
/// Failures are fatal for the whole run; the pipeline never retries a
/// write.
pub trait GraphSink {
    fn create_node(&mut self, id: i64, properties: &PropertyMap) -> Result<()>;

    fn create_relationship(
        &mut self,
        from: i64,
        to: i64,
        type_name: &str,
        properties: &PropertyMap,
    ) -> Result<()>;

    /// Flushes and releases the sink. Called once, after both entity
    /// streams have completed.
    fn shutdown(&mut self) -> Result<()>;
}

/// Receives the per-node property subsets selected for a secondary index.
pub trait IndexSink {
    fn add_to_index(&mut self, index: &str, id: i64, properties: &PropertyMap) -> Result<()>;
}

/// Captures created entities in memory.
///
/// Used by the test suites to assert on what an import produced; also handy
/// for inspecting small imports without a store.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub nodes: Vec<(i64, PropertyMap)>,
    pub relationships: Vec<(i64, i64, String, PropertyMap)>,
    pub index_entries: Vec<(String, i64, PropertyMap)>,
    pub shutdown_calls: u32,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: i64) -> Option<&PropertyMap> {
        self.nodes
            .iter()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, properties)| properties)
    }
}

impl GraphSink for MemorySink {
    fn create_node(&mut self, id: i64, properties: &PropertyMap) -> Result<()> {
        self.nodes.push((id, properties.clone()));
        Ok(())
    }

    fn create_relationship(
        &mut self,
        from: i64,
        to: i64,
        type_name: &str,
        properties: &PropertyMap,
    ) -> Result<()> {
        self.relationships
            .push((from, to, type_name.to_string(), properties.clone()));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.shutdown_calls += 1;
        Ok(())
    }
}

impl IndexSink for MemorySink {
    fn add_to_index(&mut self, index: &str, id: i64, properties: &PropertyMap) -> Result<()> {
        self.index_entries
            .push((index.to_string(), id, properties.clone()));
        Ok(())
    }
}

/// Counts what would be written without touching a store.
#[derive(Debug, Default)]
pub struct DryRunSink {
    pub nodes: u64,
    pub relationships: u64,
    pub index_entries: u64,
}

impl GraphSink for DryRunSink {
    fn create_node(&mut self, id: i64, properties: &PropertyMap) -> Result<()> {
        debug!(id, properties = properties.len(), "Would create node");
        self.nodes += 1;
        Ok(())
    }

    fn create_relationship(
        &mut self,
        from: i64,
        to: i64,
        type_name: &str,
        properties: &PropertyMap,
    ) -> Result<()> {
        debug!(
            from,
            to,
            type_name,
            properties = properties.len(),
            "Would create relationship"
        );
        self.relationships += 1;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl IndexSink for DryRunSink {
    fn add_to_index(&mut self, index: &str, id: i64, properties: &PropertyMap) -> Result<()> {
        debug!(index, id, properties = properties.len(), "Would index node");
        self.index_entries += 1;
        Ok(())
    }
}
