use crate::scalar::ScalarType;
use thiserror::Error;

/// Errors raised by the import pipeline.
///
/// Every variant is fatal: there is no skip-and-continue mode. A failed run
/// leaves the target store in an unknown state; the only supported recovery
/// is to discard the store and re-run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A property type tag is not one of the nine recognized scalars.
    /// Raised at declaration time (header parse or cursor metadata), never
    /// while decoding a data row.
    #[error("unknown property type: {0}")]
    UnknownType(String),

    /// Property keys were declared a second time within one entity stream.
    #[error("property keys can only be declared once per stream")]
    DuplicateHeaderDeclaration,

    /// A relationship record is missing one of the three mandatory leading
    /// fields.
    #[error("relationship record needs at least <from>,<to>,<type>: {0:?}")]
    MalformedRelationship(String),

    /// A data row supplies more positional values than declared property
    /// keys, or a declared property column has no corresponding source
    /// column.
    #[error("declared property keys do not match supplied values: {declared} declared, {got} supplied")]
    PropertyArityMismatch { declared: usize, got: usize },

    /// A structural identifier field did not parse as a 64-bit integer.
    #[error("cannot parse {field} {value:?} as an integer identifier")]
    InvalidId { field: &'static str, value: String },

    /// A data field failed to decode as its declared scalar type.
    #[error("cannot decode {value:?} as {ty}")]
    InvalidValue { ty: ScalarType, value: String },

    /// Uniform wrapper for I/O, source, or sink failures encountered
    /// mid-run. The run is abandoned as a whole.
    #[error("import failed: {0}")]
    ImportFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ImportError {
    /// Wraps a lower-level failure into the uniform run-abort error.
    pub fn failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::ImportFailed(cause.into())
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        Self::ImportFailed(Box::new(e))
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        Self::ImportFailed(Box::new(e))
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(e: rusqlite::Error) -> Self {
        Self::ImportFailed(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
