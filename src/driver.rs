//! Boundary toward the database client library.
//!
//! Everything above this module talks to the database through [`Driver`]:
//! the production implementation lives in [`crate::postgres::PgDriver`],
//! tests use [`crate::test_utils::scripted::ScriptedDriver`].

use std::fmt;

use thiserror::Error;

/// Failure reported by a driver primitive, carrying its diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Name and type OID of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDesc {
    pub name: String,
    pub type_oid: u32,
}

impl ColumnDesc {
    #[must_use]
    pub fn new(name: impl Into<String>, type_oid: u32) -> Self {
        Self {
            name: name.into(),
            type_oid,
        }
    }
}

/// Raw rows of a query in text format.
///
/// Owned by whoever holds it; dropping it is the release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleSet {
    columns: Vec<ColumnDesc>,
    rows: Vec<Vec<Option<String>>>,
}

impl TupleSet {
    #[must_use]
    pub fn new(columns: Vec<ColumnDesc>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    #[must_use]
    pub fn column_type(&self, col: usize) -> Option<u32> {
        self.columns.get(col).map(|c| c.type_oid)
    }

    #[must_use]
    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.columns.get(col).map(|c| c.name.as_str())
    }

    /// `None` when the cell is NULL or out of range.
    #[must_use]
    pub fn cell_text(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

/// Status classification of one executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Completed and produced rows (possibly zero of them).
    Tuples(TupleSet),
    /// Completed without a row description (DDL, DML without RETURNING).
    CommandOk,
    /// Completed with a warning; no rows are available.
    Nonfatal(String),
    /// Server rejected the command.
    Fatal(String),
    /// Response could not be understood.
    BadResponse(String),
}

impl ExecOutcome {
    /// Short status label, matching libpq's naming.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            ExecOutcome::Tuples(_) => "PGRES_TUPLES_OK",
            ExecOutcome::CommandOk => "PGRES_COMMAND_OK",
            ExecOutcome::Nonfatal(_) => "PGRES_NONFATAL_ERROR",
            ExecOutcome::Fatal(_) => "PGRES_FATAL_ERROR",
            ExecOutcome::BadResponse(_) => "PGRES_BAD_RESPONSE",
        }
    }

    /// Diagnostic text, or the status label when the outcome carries none.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ExecOutcome::Nonfatal(m) | ExecOutcome::Fatal(m) | ExecOutcome::BadResponse(m) => {
                m.clone()
            }
            other => other.status().to_string(),
        }
    }
}

/// A live database handle.
///
/// Implementations block the calling thread for every call. `close` must be
/// safe to call more than once; the connection layer only calls it once.
pub trait Driver {
    /// Run one command without parameters.
    fn execute(&mut self, sql: &str) -> ExecOutcome;

    /// Quote `text` as a string literal for this connection.
    ///
    /// # Errors
    /// Returns `DriverError` if the handle is unusable or the text cannot be quoted.
    fn escape_literal(&self, text: &str) -> Result<String, DriverError>;

    /// Quote `text` as an identifier for this connection.
    ///
    /// # Errors
    /// Returns `DriverError` if the handle is unusable or the text cannot be quoted.
    fn escape_identifier(&self, text: &str) -> Result<String, DriverError>;

    /// Release the handle.
    fn close(&mut self);
}

impl fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<driver>")
    }
}
