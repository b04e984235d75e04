use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use super::row::{CellMeta, ColumnIndex, Row, build_column_index};
use crate::connection::ConnectionState;
use crate::decode::decode_cell;
use crate::driver::TupleSet;
use crate::error::PgSessionError;
use crate::registry::TypeName;
use crate::types::Value;

/// Rows returned by one command.
///
/// Holds its own reference to the connection that produced it, so the
/// session's type cache stays reachable for as long as the result is.
pub struct QueryResult {
    tuples: TupleSet,
    column_names: Arc<Vec<String>>,
    column_index: ColumnIndex,
    connection: Rc<RefCell<ConnectionState>>,
}

impl QueryResult {
    pub(crate) fn new(tuples: TupleSet, connection: Rc<RefCell<ConnectionState>>) -> Self {
        let column_names: Vec<String> = tuples
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let column_index = build_column_index(&column_names);
        Self {
            tuples,
            column_names: Arc::new(column_names),
            column_index,
            connection,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tuples.row_count()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.tuples.column_count()
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Whether the producing connection has been disconnected.
    #[must_use]
    pub fn is_connection_closed(&self) -> bool {
        self.connection.borrow().is_closed()
    }

    /// # Errors
    /// Returns `PgSessionError::RangeError` if `col` is out of bounds.
    pub fn column_name(&self, col: usize) -> Result<&str, PgSessionError> {
        self.tuples
            .column_name(col)
            .ok_or_else(|| self.column_range_error(col))
    }

    /// Resolved type of column `col`.
    ///
    /// # Errors
    /// Returns `PgSessionError::RangeError` if `col` is out of bounds, or a
    /// resolution error if the type is not cached and the connection cannot
    /// look it up.
    pub fn column_type(&self, col: usize) -> Result<TypeName, PgSessionError> {
        let oid = self
            .tuples
            .column_type(col)
            .ok_or_else(|| self.column_range_error(col))?;
        self.connection.borrow_mut().resolve(oid)
    }

    /// Decode one cell.
    ///
    /// # Errors
    /// - `PgSessionError::RangeError` for an out-of-bounds row or column
    /// - `PgSessionError::DecodeError` if the text does not fit the column type
    pub fn get_value(&self, row: usize, col: usize) -> Result<Value, PgSessionError> {
        self.check_row(row)?;
        let type_name = self.column_type(col)?;
        self.decode(row, col, &type_name)
    }

    fn decode(&self, row: usize, col: usize, type_name: &TypeName) -> Result<Value, PgSessionError> {
        decode_cell(type_name, self.tuples.cell_text(row, col)).map_err(|reason| {
            PgSessionError::DecodeError {
                row,
                column: self.column_names[col].clone(),
                type_name: type_name.as_str().to_string(),
                reason,
            }
        })
    }

    fn column_types(&self) -> Result<Vec<TypeName>, PgSessionError> {
        (0..self.column_count())
            .map(|col| self.column_type(col))
            .collect()
    }

    fn build_row(&self, row: usize, types: &[TypeName]) -> Result<Row, PgSessionError> {
        let values = types
            .iter()
            .enumerate()
            .map(|(col, type_name)| self.decode(row, col, type_name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Row::with_index(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            values,
        ))
    }

    /// Decode row `row` into a [`Row`].
    ///
    /// # Errors
    /// Returns `PgSessionError::RangeError` unless `row < row_count()`, or a
    /// decode error for a malformed cell.
    pub fn collect_row(&self, row: usize) -> Result<Row, PgSessionError> {
        self.check_row(row)?;
        self.build_row(row, &self.column_types()?)
    }

    /// Decode every row, in storage order.
    ///
    /// # Errors
    /// Returns the first decode error encountered.
    pub fn collect_all(&self) -> Result<Vec<Row>, PgSessionError> {
        self.rows()?.collect()
    }

    /// Lazily decode rows, in storage order.
    ///
    /// Column types are looked up once, up front; each row is decoded as the
    /// iterator reaches it.
    ///
    /// # Errors
    /// Returns an error if a column type cannot be resolved.
    pub fn rows(&self) -> Result<Rows<'_>, PgSessionError> {
        Ok(Rows {
            result: self,
            types: self.column_types()?,
            next: 0,
        })
    }

    /// Type name, column name, and value for each cell of the first row.
    ///
    /// # Errors
    /// Returns `PgSessionError::EmptyResultError` when there are no rows.
    pub fn collect_row_meta(&self) -> Result<Vec<CellMeta>, PgSessionError> {
        if self.row_count() == 0 {
            return Err(PgSessionError::EmptyResultError);
        }
        let types = self.column_types()?;
        types
            .iter()
            .enumerate()
            .map(|(col, type_name)| {
                Ok(CellMeta {
                    type_name: type_name.as_str().to_string(),
                    column_name: self.column_names[col].clone(),
                    value: self.decode(0, col, type_name)?,
                })
            })
            .collect()
    }

    fn check_row(&self, row: usize) -> Result<(), PgSessionError> {
        if row < self.row_count() {
            Ok(())
        } else {
            Err(PgSessionError::row_out_of_range(
                i64::try_from(row).unwrap_or(i64::MAX),
                self.row_count(),
            ))
        }
    }

    fn column_range_error(&self, col: usize) -> PgSessionError {
        PgSessionError::column_out_of_range(
            i64::try_from(col).unwrap_or(i64::MAX),
            self.column_count(),
        )
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("columns", &self.column_names)
            .field("rows", &self.row_count())
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`QueryResult::rows`].
pub struct Rows<'a> {
    result: &'a QueryResult,
    types: Vec<TypeName>,
    next: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, PgSessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.result.row_count() {
            return None;
        }
        let row = self.next;
        self.next += 1;
        Some(self.result.build_row(row, &self.types))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.result.row_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use crate::connection::Connection;
    use crate::driver::{ColumnDesc, ExecOutcome, TupleSet};
    use crate::error::PgSessionError;
    use crate::test_utils::scripted::ScriptedDriver;
    use crate::types::{Keyword, Value};

    fn people() -> ExecOutcome {
        ExecOutcome::Tuples(TupleSet::new(
            vec![
                ColumnDesc::new("id", 20),
                ColumnDesc::new("name", 25),
                ColumnDesc::new("active", 16),
                ColumnDesc::new("owner", 19),
            ],
            vec![
                vec![
                    Some("1".into()),
                    Some("alice".into()),
                    Some("t".into()),
                    Some("postgres".into()),
                ],
                vec![Some("2".into()), None, Some("f".into()), None],
            ],
        ))
    }

    fn connect(sql: &str, outcome: ExecOutcome) -> Connection {
        Connection::from_driver("host=h", Box::new(ScriptedDriver::new().respond(sql, outcome)))
            .unwrap()
    }

    #[test]
    fn counts_and_metadata() {
        let conn = connect("SELECT * FROM people", people());
        let result = conn.execute("SELECT * FROM people").unwrap().unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.column_count(), 4);
        assert_eq!(result.column_name(1).unwrap(), "name");
        assert_eq!(result.column_type(0).unwrap().as_str(), "bigint");
        assert!(matches!(
            result.column_name(4),
            Err(PgSessionError::RangeError { axis: "Column", index: 4, len: 4 })
        ));
    }

    #[test]
    fn get_value_decodes_by_type() {
        let conn = connect("SELECT * FROM people", people());
        let result = conn.execute("SELECT * FROM people").unwrap().unwrap();
        assert_eq!(result.get_value(0, 0).unwrap(), Value::Int(1));
        assert_eq!(result.get_value(0, 2).unwrap(), Value::Bool(true));
        assert_eq!(
            result.get_value(0, 3).unwrap(),
            Value::Keyword(Keyword::new("postgres"))
        );
        assert_eq!(result.get_value(1, 1).unwrap(), Value::Null);
        assert_eq!(result.get_value(1, 2).unwrap(), Value::Bool(false));
    }

    #[test]
    fn row_bounds() {
        let conn = connect("SELECT * FROM people", people());
        let result = conn.execute("SELECT * FROM people").unwrap().unwrap();
        assert!(result.collect_row(1).is_ok());
        assert!(matches!(
            result.collect_row(2),
            Err(PgSessionError::RangeError { axis: "Row", index: 2, len: 2 })
        ));
        assert!(matches!(
            result.get_value(5, 0),
            Err(PgSessionError::RangeError { axis: "Row", .. })
        ));
    }

    #[test]
    fn collect_all_is_repeatable() {
        let conn = connect("SELECT * FROM people", people());
        let result = conn.execute("SELECT * FROM people").unwrap().unwrap();
        let first = result.collect_all().unwrap();
        let second = result.collect_all().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].get("name"), Some(&Value::Text("alice".into())));
        assert_eq!(first[1].get("id"), Some(&Value::Int(2)));
    }

    #[test]
    fn rows_iterates_lazily() {
        let conn = connect("SELECT * FROM people", people());
        let result = conn.execute("SELECT * FROM people").unwrap().unwrap();
        let mut rows = result.rows().unwrap();
        assert_eq!(rows.size_hint(), (2, Some(2)));
        assert_eq!(rows.next().unwrap().unwrap().get("id"), Some(&Value::Int(1)));
        assert_eq!(rows.size_hint(), (1, Some(1)));
        assert!(rows.next().is_some());
        assert!(rows.next().is_none());
    }

    #[test]
    fn row_meta_describes_first_row() {
        let conn = connect("SELECT * FROM people", people());
        let result = conn.execute("SELECT * FROM people").unwrap().unwrap();
        let meta = result.collect_row_meta().unwrap();
        assert_eq!(meta.len(), 4);
        assert_eq!(meta[0].type_name, "bigint");
        assert_eq!(meta[0].column_name, "id");
        assert_eq!(meta[0].value, Value::Int(1));
        assert_eq!(meta[2].type_name, "boolean");
    }

    #[test]
    fn row_meta_on_empty_result() {
        let empty = ExecOutcome::Tuples(TupleSet::new(vec![ColumnDesc::new("n", 23)], vec![]));
        let conn = connect("SELECT 1 WHERE false", empty);
        let result = conn.execute("SELECT 1 WHERE false").unwrap().unwrap();
        assert_eq!(result.row_count(), 0);
        assert!(result.collect_all().unwrap().is_empty());
        assert!(matches!(
            result.collect_row_meta(),
            Err(PgSessionError::EmptyResultError)
        ));
    }

    #[test]
    fn duplicate_column_names_keep_last_value() {
        let dup = ExecOutcome::Tuples(TupleSet::new(
            vec![ColumnDesc::new("a", 23), ColumnDesc::new("a", 23)],
            vec![vec![Some("1".into()), Some("2".into())]],
        ));
        let conn = connect("SELECT 1 AS a, 2 AS a", dup);
        let result = conn.execute("SELECT 1 AS a, 2 AS a").unwrap().unwrap();
        let row = result.collect_row(0).unwrap();
        assert_eq!(row.get("a"), Some(&Value::Int(2)));
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"a":2}"#);
    }

    #[test]
    fn malformed_cell_reports_position() {
        let bad = ExecOutcome::Tuples(TupleSet::new(
            vec![ColumnDesc::new("flag", 16)],
            vec![vec![Some("yes".into())]],
        ));
        let conn = connect("SELECT flag", bad);
        let result = conn.execute("SELECT flag").unwrap().unwrap();
        let err = result.get_value(0, 0).unwrap_err();
        assert!(matches!(
            err,
            PgSessionError::DecodeError { row: 0, ref column, ref type_name, .. }
                if column == "flag" && type_name == "boolean"
        ));
    }
}
