use crate::config::PROGRESS_INTERVAL;
use crate::error::{ImportError, Result};
use crate::header::{parse_property_keys, PositionalStrategy};
use crate::indexing::IndexBuilder;
use crate::sink::{GraphSink, IndexSink};
use crate::stats::ImportStats;
use bzip2::read::BzDecoder;
use csv::{ReaderBuilder, StringRecord};
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lifecycle of one entity stream.
///
/// A header may only arrive while awaiting one; the first data row moves
/// the stream to `Streaming` and pins the declaration for good. The
/// terminal state is simply the end of input.
#[derive(Clone, Copy)]
enum StreamState {
    AwaitingHeader,
    Declared,
    Streaming { declared: bool },
}

impl StreamState {
    fn on_data_row(self) -> Self {
        match self {
            StreamState::AwaitingHeader => StreamState::Streaming { declared: false },
            StreamState::Declared => StreamState::Streaming { declared: true },
            streaming => streaming,
        }
    }

    /// Error for a header-shaped record arriving anywhere but
    /// `AwaitingHeader`.
    fn late_header_error(self, field: &'static str, value: &str) -> ImportError {
        match self {
            StreamState::Streaming { declared: false } => ImportError::InvalidId {
                field,
                value: value.to_string(),
            },
            _ => ImportError::DuplicateHeaderDeclaration,
        }
    }
}

/// Imports a node file and a relationship file into a graph sink.
///
/// Each file is one entity stream: an optional header line declaring
/// property names, types, and index assignments, followed by data rows
/// keyed by integer identifiers. The header is recognized as the first
/// record whose leading field does not parse as an identifier.
///
/// Nodes are fully imported before relationships begin, because
/// relationship records dereference node identifiers already assigned in
/// the sink.
pub struct CsvImporter {
    nodes: PathBuf,
    rels: PathBuf,
}

impl CsvImporter {
    pub fn new(nodes: impl Into<PathBuf>, rels: impl Into<PathBuf>) -> Self {
        Self {
            nodes: nodes.into(),
            rels: rels.into(),
        }
    }

    /// Runs the whole import: the node stream, then the relationship
    /// stream, then sink shutdown. Any error abandons the run as a whole.
    pub fn import_to<S: GraphSink + IndexSink>(&self, sink: &mut S) -> Result<ImportStats> {
        let mut stats = ImportStats::new();
        self.import_nodes(sink, &mut stats)?;
        self.import_rels(sink, &mut stats)?;
        sink.shutdown().map_err(ImportError::failed)?;
        Ok(stats)
    }

    fn import_nodes<S: GraphSink + IndexSink>(
        &self,
        sink: &mut S,
        stats: &mut ImportStats,
    ) -> Result<()> {
        let mut reader = open_delimited(&self.nodes)?;
        let mut record = StringRecord::new();
        let mut strategy = PositionalStrategy::default();
        let mut indices = IndexBuilder::default();
        let mut state = StreamState::AwaitingHeader;

        let pb = ProgressBar::new_spinner();
        pb.set_message("Importing nodes");

        while reader.read_record(&mut record)? {
            let leading = record.get(0).unwrap_or("");
            match leading.parse::<i64>() {
                Err(_) => {
                    if !matches!(state, StreamState::AwaitingHeader) {
                        return Err(state.late_header_error("node id", leading));
                    }
                    let trailing: Vec<&str> = record.iter().skip(1).collect();
                    let keys = parse_property_keys(&trailing)?;
                    indices = IndexBuilder::from_keys(&keys);
                    strategy = PositionalStrategy::new(keys);
                    debug!(
                        keys = strategy.keys().len(),
                        indexes = indices.groups().len(),
                        "Declared node property keys"
                    );
                    state = StreamState::Declared;
                }
                Ok(id) => {
                    state = state.on_data_row();
                    let trailing: Vec<&str> = record.iter().skip(1).collect();
                    let properties = strategy.row_properties(&trailing)?;
                    stats.add_properties(properties.len() as u64);
                    sink.create_node(id, &properties)
                        .map_err(ImportError::failed)?;
                    let entries = indices
                        .record_node(id, &properties, sink)
                        .map_err(ImportError::failed)?;
                    stats.add_index_entries(entries);
                    stats.inc_nodes();
                    if stats.nodes_created % PROGRESS_INTERVAL == 0 {
                        pb.tick();
                        info!(nodes = stats.nodes_created, "Created nodes");
                    }
                }
            }
        }

        pb.finish_and_clear();
        info!(nodes = stats.nodes_created, "Node stream complete");
        Ok(())
    }

    fn import_rels<S: GraphSink>(&self, sink: &mut S, stats: &mut ImportStats) -> Result<()> {
        let mut reader = open_delimited(&self.rels)?;
        let mut record = StringRecord::new();
        let mut strategy = PositionalStrategy::default();
        let mut state = StreamState::AwaitingHeader;

        let pb = ProgressBar::new_spinner();
        pb.set_message("Importing relationships");

        while reader.read_record(&mut record)? {
            if record.len() < 3 {
                return Err(ImportError::MalformedRelationship(raw_line(&record)));
            }
            let leading = record.get(0).unwrap_or("");
            match leading.parse::<i64>() {
                Err(_) => {
                    if !matches!(state, StreamState::AwaitingHeader) {
                        return Err(state.late_header_error("relationship source", leading));
                    }
                    let trailing: Vec<&str> = record.iter().skip(3).collect();
                    strategy = PositionalStrategy::new(parse_property_keys(&trailing)?);
                    debug!(
                        keys = strategy.keys().len(),
                        "Declared relationship property keys"
                    );
                    state = StreamState::Declared;
                }
                Ok(from) => {
                    state = state.on_data_row();
                    let target = record.get(1).unwrap_or("");
                    let to = target.parse::<i64>().map_err(|_| ImportError::InvalidId {
                        field: "relationship target",
                        value: target.to_string(),
                    })?;
                    let type_name = record.get(2).unwrap_or("");
                    let trailing: Vec<&str> = record.iter().skip(3).collect();
                    let properties = strategy.row_properties(&trailing)?;
                    stats.add_properties(properties.len() as u64);
                    sink.create_relationship(from, to, type_name, &properties)
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

/// Opens a delimited record reader over `path`, transparently decompressing
/// `.bz2` input.
///
/// The format has no quoting or escaping: records are plain comma-separated
/// fields, so the reader runs with quoting disabled and flexible record
/// lengths.
fn open_delimited(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file =
        File::open(path).map_err(|e| ImportError::failed(format!("{}: {e}", path.display())))?;
    let raw: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "bz2") {
        Box::new(BzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(raw))
}

fn raw_line(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}
