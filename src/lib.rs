//! Ariadne: bulk graph import from CSV files and SQL tables
//!
//! This crate streams nodes and typed relationships from two kinds of
//! sources into a graph store's bulk-insertion interface:
//!
//! 1. **CSV files** -- one file per entity kind; an optional header line
//!    declares property names, scalar types, and secondary-index
//!    assignments, and every following row binds values positionally
//! 2. **SQL tables** -- one table per entity kind, read through a streaming
//!    cursor whose column metadata decides which columns become properties
//!    and how each decodes
//!
//! Both paths share the same core: a type-directed property extraction
//! pipeline that resolves each property's scalar type exactly once at
//! declaration time and then builds one typed, sparse property map per row.
//! Nodes are always imported before relationships, because relationship
//! records dereference node identifiers already assigned in the sink.
//!
//! # Architecture
//!
//! - **Streaming passes** -- Each input is read exactly once, in order,
//!   without buffering more than one record
//! - **Declare once** -- Property keys and index groups are fixed before
//!   the first data row; a second declaration is a fatal error
//! - **Sparse properties** -- Empty fields and NULL columns are omitted
//!   from the row's property map, never stored as placeholder values
//! - **All-or-nothing runs** -- Any parse, declaration, or sink error
//!   abandons the run; a failed target store is discarded and re-imported
//!
//! # Key Modules
//!
//! - [`scalar`] -- Scalar type registry and typed property values
//! - [`columns`] -- Reserved-column exclusion and allow-list classification
//! - [`header`] -- Header-line grammar and positional extraction
//! - [`cursor`] -- Cursor metadata and accessor-driven extraction
//! - [`csv`] -- File importer (header/data stream splitting)
//! - [`sqlite`] -- SQL importer over a SQLite database
//! - [`indexing`] -- Secondary-index grouping and forwarding
//! - [`sink`] -- Sink traits plus in-memory and dry-run sinks
//! - [`bolt`] -- Bolt-backed sink for a running store
//! - [`stats`] -- Run counters and the JSON report
//! - [`error`] -- The fatal error taxonomy
//! - [`config`] -- Defaults and tuning constants
//!
//! # Example Usage
//!
//! ```bash
//! # Import CSV files into a store reachable over Bolt
//! ariadne import-csv -n nodes.csv -r rels.csv --bolt-uri bolt://localhost:7687
//!
//! # Import two SQLite tables, counting entities without writing
//! ariadne import-sql -d graph.db --nodes-table nodes --rels-table rels --dry-run
//! ```

pub mod bolt;
pub mod columns;
pub mod config;
pub mod csv;
pub mod cursor;
pub mod error;
pub mod header;
pub mod indexing;
pub mod scalar;
pub mod sink;
pub mod sqlite;
pub mod stats;
