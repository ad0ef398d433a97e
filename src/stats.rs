use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Counters for one import run.
#[derive(Debug, Default, Serialize)]
pub struct ImportStats {
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub properties_set: u64,
    pub index_entries: u64,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_nodes(&mut self) {
        self.nodes_created += 1;
    }

    pub fn inc_relationships(&mut self) {
        self.relationships_created += 1;
    }

    pub fn add_properties(&mut self, count: u64) {
        self.properties_set += count;
    }

    pub fn add_index_entries(&mut self, count: u64) {
        self.index_entries += count;
    }

    /// Writes the machine-readable run report.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context("Failed to serialize import report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn counters_accumulate() {
        let mut stats = ImportStats::new();
        stats.inc_nodes();
        stats.inc_nodes();
        stats.inc_relationships();
        stats.add_properties(3);
        stats.add_properties(2);
        stats.add_index_entries(1);

        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.relationships_created, 1);
        assert_eq!(stats.properties_set, 5);
        assert_eq!(stats.index_entries, 1);
    }

    #[test]
    fn report_is_valid_json() {
        let mut stats = ImportStats::new();
        stats.inc_nodes();
        stats.add_properties(2);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        stats.write_report(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["nodes_created"], 1);
        assert_eq!(parsed["properties_set"], 2);
    }
}
