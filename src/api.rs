//! Free-function surface over [`Connection`], [`QueryResult`] and the SQL builder.
//!
//! Row indices are signed so callers coming from untyped code get a
//! `RangeError` for negative input instead of a wrap-around.

use crate::connection::Connection;
use crate::error::PgSessionError;
use crate::results::{CellMeta, QueryResult, Row};
use crate::sql::{Composite, Fragment, SqlPart};

/// # Errors
/// See [`Connection::connect`].
#[cfg(feature = "postgres")]
pub fn connect(info: &str) -> Result<Connection, PgSessionError> {
    Connection::connect(info)
}

pub fn disconnect(conn: &Connection) {
    conn.disconnect();
}

/// # Errors
/// See [`Connection::execute`].
pub fn exec(conn: &Connection, command: &str) -> Result<Option<QueryResult>, PgSessionError> {
    conn.execute(command)
}

#[must_use]
pub fn collect_count(result: &QueryResult) -> usize {
    result.row_count()
}

/// # Errors
/// Returns `PgSessionError::RangeError` unless `0 <= row < row_count`.
pub fn collect_row(result: &QueryResult, row: i64) -> Result<Row, PgSessionError> {
    let index = usize::try_from(row)
        .map_err(|_| PgSessionError::row_out_of_range(row, result.row_count()))?;
    result.collect_row(index)
}

/// # Errors
/// See [`QueryResult::collect_row_meta`].
pub fn collect_row_meta(result: &QueryResult) -> Result<Vec<CellMeta>, PgSessionError> {
    result.collect_row_meta()
}

/// # Errors
/// See [`QueryResult::collect_all`].
pub fn collect_all(result: &QueryResult) -> Result<Vec<Row>, PgSessionError> {
    result.collect_all()
}

/// # Errors
/// See [`Connection::escape_literal`].
pub fn escape_literal(conn: &Connection, input: &str) -> Result<String, PgSessionError> {
    conn.escape_literal(input)
}

/// # Errors
/// See [`Connection::escape_identifier`].
pub fn escape_identifier(conn: &Connection, input: &str) -> Result<String, PgSessionError> {
    conn.escape_identifier(input)
}

#[must_use]
pub fn sql_unsafe(text: &str) -> Fragment {
    Fragment::unsafe_raw(text)
}

#[must_use]
pub fn sql_literal(text: &str) -> Fragment {
    Fragment::literal(text)
}

#[must_use]
pub fn sql_identifier(text: &str) -> Fragment {
    Fragment::identifier(text)
}

/// # Errors
/// Returns `PgSessionError::EmptyComposite` for an empty `parts`.
pub fn sql_composite<I, P>(parts: I) -> Result<Composite, PgSessionError>
where
    I: IntoIterator<Item = P>,
    P: Into<SqlPart>,
{
    Composite::new(parts.into_iter().map(Into::into).collect())
}

/// # Errors
/// See [`Composite::stringify`].
pub fn sql_stringify(conn: &Connection, composite: &Composite) -> Result<String, PgSessionError> {
    composite.stringify(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ColumnDesc, ExecOutcome, TupleSet};
    use crate::test_utils::scripted::ScriptedDriver;
    use crate::types::Value;

    const SCENARIO: &str = "SELECT 1 AS n, true AS b, NULL AS z";

    fn scenario_conn() -> Connection {
        let outcome = ExecOutcome::Tuples(TupleSet::new(
            vec![
                ColumnDesc::new("n", 23),
                ColumnDesc::new("b", 16),
                ColumnDesc::new("z", 25),
            ],
            vec![vec![Some("1".into()), Some("t".into()), None]],
        ));
        let driver = ScriptedDriver::new()
            .respond(SCENARIO, outcome)
            .respond("CREATE TABLE t (id int)", ExecOutcome::CommandOk);
        Connection::from_driver("host=h", Box::new(driver)).unwrap()
    }

    #[test]
    fn end_to_end_scenario() {
        let conn = scenario_conn();
        let result = exec(&conn, SCENARIO).unwrap().unwrap();
        let rows = collect_all(&result).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("n"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get("b"), Some(&Value::Bool(true)));
        assert_eq!(rows[0].get("z"), Some(&Value::Null));
        assert_eq!(
            serde_json::to_string(&rows[0]).unwrap(),
            r#"{"n":1,"b":true,"z":null}"#
        );
        disconnect(&conn);
    }

    #[test]
    fn signed_row_indices() {
        let conn = scenario_conn();
        let result = exec(&conn, SCENARIO).unwrap().unwrap();
        assert_eq!(collect_count(&result), 1);
        assert!(collect_row(&result, 0).is_ok());
        assert!(matches!(
            collect_row(&result, 1),
            Err(PgSessionError::RangeError { index: 1, len: 1, .. })
        ));
        assert!(matches!(
            collect_row(&result, -1),
            Err(PgSessionError::RangeError { index: -1, len: 1, .. })
        ));
    }

    #[test]
    fn no_tuples_is_none() {
        let conn = scenario_conn();
        assert!(exec(&conn, "CREATE TABLE t (id int)").unwrap().is_none());
    }

    #[test]
    fn row_meta() {
        let conn = scenario_conn();
        let result = exec(&conn, SCENARIO).unwrap().unwrap();
        let meta = collect_row_meta(&result).unwrap();
        let names: Vec<_> = meta.iter().map(|m| m.type_name.as_str()).collect();
        assert_eq!(names, vec!["integer", "boolean", "text"]);
    }

    #[test]
    fn builder_functions() {
        let conn = scenario_conn();
        let composite = sql_composite([
            sql_identifier("a;DROP TABLE x"),
            sql_unsafe(" = "),
            sql_literal("O'Brien"),
        ])
        .unwrap();
        assert_eq!(
            sql_stringify(&conn, &composite).unwrap(),
            "\"a;DROP TABLE x\" = 'O''Brien'"
        );
        assert!(matches!(
            sql_composite(Vec::<Fragment>::new()),
            Err(PgSessionError::EmptyComposite)
        ));
        assert_eq!(escape_identifier(&conn, "t").unwrap(), "\"t\"");
        assert_eq!(escape_literal(&conn, r"a\b").unwrap(), r" E'a\\b'");
    }
}
