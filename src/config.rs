/// Progress is reported every N imported entities
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Column carrying the node identifier in SQL node tables
pub const NODE_ID_COLUMN: &str = "id";

/// Column carrying the relationship source identifier in SQL tables
pub const REL_SOURCE_COLUMN: &str = "src";

/// Column carrying the relationship target identifier in SQL tables
pub const REL_TARGET_COLUMN: &str = "dest";

/// Column carrying the relationship type name in SQL tables
pub const REL_TYPE_COLUMN: &str = "type";

/// Default Bolt URI for the target store
pub const DEFAULT_BOLT_URI: &str = "bolt://localhost:7687";

/// Label applied to imported nodes, matched by relationship statements
pub const NODE_LABEL: &str = "Node";

/// Connection attempts before giving up on the Bolt endpoint
pub const BOLT_MAX_RETRIES: u32 = 5;

/// Seconds between Bolt connection attempts
pub const BOLT_RETRY_DELAY_SECS: u64 = 3;
