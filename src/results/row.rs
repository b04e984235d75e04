use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::types::Value;

/// Column name → position, shared by every row of one result.
pub(crate) type ColumnIndex = Arc<HashMap<String, usize>>;

/// Build the lookup table for `column_names`; the last of duplicate names wins.
pub(crate) fn build_column_index(column_names: &[String]) -> ColumnIndex {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        index.insert(name.clone(), i);
    }
    Arc::new(index)
}

/// One decoded row: column names paired with values, in column order.
///
/// Serializes as a JSON object keyed by column name. When several columns
/// share a name, the last of them is the one `get` and the object expose.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column names (shared across all rows of a result)
    pub column_names: Arc<Vec<String>>,
    /// Values in column order
    pub values: Vec<Value>,
    #[doc(hidden)]
    pub(crate) column_index: ColumnIndex,
}

impl Row {
    /// Create a row, building a fresh name index.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        let column_index = build_column_index(&column_names);
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: ColumnIndex,
        values: Vec<Value>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Value of the named column, or `None` if there is no such column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(column name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.column_index.len()))?;
        for (i, (name, value)) in self.iter().enumerate() {
            if self.get_column_index(name) == Some(i) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// Introspection record for one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellMeta {
    pub type_name: String,
    pub column_name: String,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            Arc::new(vec!["n".into(), "b".into(), "z".into()]),
            vec![Value::Int(1), Value::Bool(true), Value::Null],
        )
    }

    #[test]
    fn lookup_by_name_and_index() {
        let row = sample();
        assert_eq!(row.get("b"), Some(&Value::Bool(true)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_by_index(0), Some(&Value::Int(1)));
        assert_eq!(row.get_by_index(3), None);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn duplicate_names_resolve_to_last() {
        let row = Row::new(
            Arc::new(vec!["a".into(), "b".into(), "a".into()]),
            vec![Value::Int(1), Value::Bool(true), Value::Int(2)],
        );
        assert_eq!(row.get("a"), Some(&Value::Int(2)));
        assert_eq!(row.get_by_index(0), Some(&Value::Int(1)));
        assert_eq!(row.len(), 3);
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"b":true,"a":2}"#
        );
    }

    #[test]
    fn serializes_in_column_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"n":1,"b":true,"z":null}"#);
    }
}
