use crate::config::{BOLT_MAX_RETRIES, BOLT_RETRY_DELAY_SECS, NODE_LABEL};
use crate::scalar::{PropertyMap, PropertyValue};
use crate::sink::{GraphSink, IndexSink};
use anyhow::{bail, Context, Result};
use neo4rs::{query, Graph};
use rustc_hash::FxHashSet;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Graph sink over the Bolt protocol.
///
/// Entities are written with per-entity Cypher statements built by string
/// templating. Imported nodes carry the `Node` label and a unique `id`
/// property that relationship statements match on. Declared index groups
/// become schema indexes; the store maintains their entries.
pub struct BoltSink {
    graph: Graph,
    runtime: Runtime,
    ensured_indexes: FxHashSet<(String, String)>,
}

impl BoltSink {
    /// Connects to the Bolt endpoint, retrying while the store comes up,
    /// and installs the id-uniqueness constraint imports rely on.
    pub fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("ariadne-bolt")
            .enable_io()
            .enable_time()
            .build()?;

        info!(uri, "Connecting to graph store");
        let graph = runtime.block_on(connect_with_retry(uri, user, password))?;
        runtime.block_on(run_cypher(
            &graph,
            &format!(
                "CREATE CONSTRAINT ariadne_node_id IF NOT EXISTS \
                 FOR (n:{NODE_LABEL}) REQUIRE n.id IS UNIQUE;"
            ),
        ))?;

        Ok(Self {
            graph,
            runtime,
            ensured_indexes: FxHashSet::default(),
        })
    }
}

impl GraphSink for BoltSink {
    fn create_node(&mut self, id: i64, properties: &PropertyMap) -> Result<()> {
        let cypher = node_create_statement(id, properties);
        self.runtime.block_on(run_cypher(&self.graph, &cypher))
    }

    fn create_relationship(
        &mut self,
        from: i64,
        to: i64,
        type_name: &str,
        properties: &PropertyMap,
    ) -> Result<()> {
        let cypher = relationship_create_statement(from, to, type_name, properties);
        self.runtime.block_on(run_cypher(&self.graph, &cypher))
    }

    fn shutdown(&mut self) -> Result<()> {
        debug!("Bolt sink shut down");
        Ok(())
    }
}

impl IndexSink for BoltSink {
    fn add_to_index(&mut self, index: &str, _id: i64, properties: &PropertyMap) -> Result<()> {
        // One schema index per (group, key); subsequent nodes are no-ops.
        for key in properties.keys() {
            let marker = (index.to_string(), key.clone());
            if self.ensured_indexes.contains(&marker) {
                continue;
            }
            let cypher = format!(
                "CREATE INDEX `{index}_{key}` IF NOT EXISTS \
                 FOR (n:{NODE_LABEL}) ON (n.`{key}`);"
            );
            self.runtime.block_on(run_cypher(&self.graph, &cypher))?;
            self.ensured_indexes.insert(marker);
        }
        Ok(())
    }
}

async fn connect_with_retry(uri: &str, user: &str, password: &str) -> Result<Graph> {
    let delay = tokio::time::Duration::from_secs(BOLT_RETRY_DELAY_SECS);

    for attempt in 1..=BOLT_MAX_RETRIES {
        match Graph::new(uri, user, password) {
            Ok(graph) => match graph.run(query("RETURN 1;")).await {
                Ok(_) => return Ok(graph),
                Err(e) if attempt < BOLT_MAX_RETRIES => {
                    info!(attempt, "Connection test failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(e).context(format!(
                        "Cannot connect to graph store at {uri} after {BOLT_MAX_RETRIES} attempts"
                    ));
                }
            },
            Err(e) if attempt < BOLT_MAX_RETRIES => {
                info!(attempt, "Cannot connect to {uri}, retrying: {e}");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Cannot connect to graph store at {uri} after {BOLT_MAX_RETRIES} attempts"
                ));
            }
        }
    }

    bail!("Cannot connect to graph store at {uri} after {BOLT_MAX_RETRIES} attempts")
}

async fn run_cypher(graph: &Graph, cypher: &str) -> Result<()> {
    graph
        .run(query(cypher))
        .await
        .with_context(|| format!("Failed to execute: {cypher}"))?;
    Ok(())
}

fn node_create_statement(id: i64, properties: &PropertyMap) -> String {
    format!(
        "CREATE (:{NODE_LABEL} {{{}}});",
        property_fragment(id, properties)
    )
}

fn relationship_create_statement(
    from: i64,
    to: i64,
    type_name: &str,
    properties: &PropertyMap,
) -> String {
    let mut cypher = format!(
        "MATCH (a:{NODE_LABEL} {{id: {from}}}), (b:{NODE_LABEL} {{id: {to}}}) \
         CREATE (a)-[:`{type_name}`"
    );
    if !properties.is_empty() {
        let pairs: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("`{key}`: {}", cypher_literal(value)))
            .collect();
        cypher.push_str(&format!(" {{{}}}", pairs.join(", ")));
    }
    cypher.push_str("]->(b);");
    cypher
}

/// Renders the `id` plus every property as Cypher map entries. The id comes
/// first; declared properties follow in map order.
fn property_fragment(id: i64, properties: &PropertyMap) -> String {
    let mut pairs = vec![format!("id: {id}")];
    for (key, value) in properties {
        pairs.push(format!("`{key}`: {}", cypher_literal(value)));
    }
    pairs.join(", ")
}

fn cypher_literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => quote_string(s),
        PropertyValue::Char(c) => quote_string(&c.to_string()),
        PropertyValue::Long(v) => v.to_string(),
        PropertyValue::Int(v) => v.to_string(),
        PropertyValue::Short(v) => v.to_string(),
        PropertyValue::Byte(v) => v.to_string(),
        PropertyValue::Boolean(v) => v.to_string(),
        // Debug formatting keeps a decimal point, so the store stores a
        // float rather than an integer.
        PropertyValue::Float(v) => format!("{v:?}"),
        PropertyValue::Double(v) => format!("{v:?}"),
    }
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
