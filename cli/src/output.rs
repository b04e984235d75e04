use pgsession::{CellMeta, PgSessionError, QueryResult, Value};

use crate::args::OutputFormat;

pub(crate) const NO_RESULT: &str = "(no result)";

/// Render every row of `result`.
pub(crate) fn render_rows(
    result: &QueryResult,
    format: OutputFormat,
) -> Result<String, PgSessionError> {
    let rows = result.collect_all()?;
    match format {
        OutputFormat::Json => to_json(&rows),
        OutputFormat::Table => {
            let header: Vec<String> = result.column_names().iter().cloned().collect();
            let body = rows
                .iter()
                .map(|row| row.values.iter().map(cell_text).collect())
                .collect::<Vec<Vec<String>>>();
            Ok(render_table(&header, &body, rows.len()))
        }
    }
}

/// Render the first-row metadata of `result`.
pub(crate) fn render_meta(
    result: &QueryResult,
    format: OutputFormat,
) -> Result<String, PgSessionError> {
    let meta = result.collect_row_meta()?;
    match format {
        OutputFormat::Json => to_json(&meta),
        OutputFormat::Table => {
            let header = vec![
                "column".to_string(),
                "type".to_string(),
                "value".to_string(),
            ];
            let body = meta
                .iter()
                .map(|CellMeta { type_name, column_name, value }| {
                    vec![column_name.clone(), type_name.clone(), cell_text(value)]
                })
                .collect::<Vec<_>>();
            Ok(render_table(&header, &body, meta.len()))
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, PgSessionError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PgSessionError::QueryError(format!("failed to render JSON: {e}")))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Keyword(keyword) => keyword.as_str().to_string(),
        other => other.to_string(),
    }
}

fn render_table(header: &[String], body: &[Vec<String>], count: usize) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(header));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in body {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&format!("({count} {})", if count == 1 { "row" } else { "rows" }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgsession::test_utils::scripted::ScriptedDriver;
    use pgsession::{ColumnDesc, Connection, ExecOutcome, TupleSet};

    fn result() -> QueryResult {
        let outcome = ExecOutcome::Tuples(TupleSet::new(
            vec![ColumnDesc::new("n", 23), ColumnDesc::new("label", 25)],
            vec![
                vec![Some("1".into()), Some("alpha".into())],
                vec![Some("22".into()), None],
            ],
        ));
        let driver = ScriptedDriver::new().respond("SELECT q", outcome);
        let conn = Connection::from_driver("host=h", Box::new(driver)).unwrap();
        conn.execute("SELECT q").unwrap().unwrap()
    }

    #[test]
    fn table_is_aligned() {
        let table = render_rows(&result(), OutputFormat::Table).unwrap();
        assert_eq!(
            table,
            "n  | label\n---+------\n1  | alpha\n22 | NULL\n(2 rows)"
        );
    }

    #[test]
    fn json_rows() {
        let json = render_rows(&result(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["n"], 1);
        assert_eq!(parsed[1]["label"], serde_json::Value::Null);
    }

    #[test]
    fn meta_table() {
        let table = render_meta(&result(), OutputFormat::Table).unwrap();
        assert!(table.starts_with("column | type    | value"));
        assert!(table.ends_with("(2 rows)"));
    }
}
