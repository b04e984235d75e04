use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgSessionError {
    #[error("Connection to database failed: {0}")]
    ConnectError(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Failed to decode column '{column}' ({type_name}) at row {row}: {reason}")]
    DecodeError {
        row: usize,
        column: String,
        type_name: String,
        reason: String,
    },

    #[error("Failed to resolve type oid {oid} (this is a bug): {message}")]
    TypeResolutionError { oid: u32, message: String },

    #[error("{axis} index {index} is out of bounds (len {len})")]
    RangeError {
        axis: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Escape failed: {0}")]
    EscapeError(String),

    #[error("Connection is closed")]
    ConnectionClosedError,

    #[error("Result has no rows")]
    EmptyResultError,

    #[error("SQL composite requires at least one fragment")]
    EmptyComposite,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PgSessionError {
    pub(crate) fn row_out_of_range(index: i64, len: usize) -> Self {
        PgSessionError::RangeError {
            axis: "Row",
            index,
            len,
        }
    }

    pub(crate) fn column_out_of_range(index: i64, len: usize) -> Self {
        PgSessionError::RangeError {
            axis: "Column",
            index,
            len,
        }
    }
}
