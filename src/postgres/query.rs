use tokio_postgres::{Error, SimpleQueryMessage, Statement};

use crate::driver::{ColumnDesc, ExecOutcome, TupleSet};

/// Column names and type OIDs from a prepared statement's row description.
pub(crate) fn describe_columns(stmt: &Statement) -> Vec<ColumnDesc> {
    stmt.columns()
        .iter()
        .map(|col| ColumnDesc::new(col.name(), col.type_().oid()))
        .collect()
}

/// Build a tuple-set from simple-query messages, using `columns` for metadata.
///
/// The simple protocol returns every cell in text format, which is the shape
/// the decoder works on.
pub(crate) fn build_tuple_set(
    columns: Vec<ColumnDesc>,
    messages: Vec<SimpleQueryMessage>,
) -> ExecOutcome {
    let column_count = columns.len();
    let mut rows = Vec::with_capacity(messages.len());

    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            match row_cells(column_count, row.len(), |idx| row.try_get(idx)) {
                Ok(cells) => rows.push(cells),
                Err(message) => return ExecOutcome::BadResponse(message),
            }
        }
    }

    ExecOutcome::Tuples(TupleSet::new(columns, rows))
}

/// Copy one row's cells out of the driver, checking its width against the
/// statement description first.
fn row_cells<'a, F>(
    column_count: usize,
    row_len: usize,
    mut cell: F,
) -> Result<Vec<Option<String>>, String>
where
    F: FnMut(usize) -> Result<Option<&'a str>, Error>,
{
    if row_len != column_count {
        return Err(format!(
            "row has {row_len} columns, statement described {column_count}"
        ));
    }
    (0..column_count)
        .map(|idx| {
            cell(idx)
                .map(|text| text.map(str::to_string))
                .map_err(|e| format!("unreadable cell: {e}"))
        })
        .collect()
}

/// Map a `tokio-postgres` error onto the driver status classification.
pub(crate) fn classify_error(err: &Error) -> ExecOutcome {
    if let Some(db) = err.as_db_error() {
        let mut message = format!("{}:  {}", db.severity(), db.message());
        if let Some(detail) = db.detail() {
            message.push_str(&format!("\nDETAIL:  {detail}"));
        }
        if let Some(hint) = db.hint() {
            message.push_str(&format!("\nHINT:  {hint}"));
        }
        return ExecOutcome::Fatal(message);
    }
    if err.is_closed() {
        return ExecOutcome::Fatal(format!("server closed the connection: {err}"));
    }
    ExecOutcome::BadResponse(err.to_string())
}
