use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// A catalog identifier decoded from a `name` column.
///
/// PostgreSQL's `name` type holds table names, role names and the like.
/// Each value owns its text; two keywords are equal when their text is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(Arc<str>);

impl Keyword {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl From<&str> for Keyword {
    fn from(name: &str) -> Self {
        Keyword::new(name)
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A decoded cell value.
///
/// ```rust
/// use pgsession::Value;
///
/// let values = vec![Value::Int(1), Value::Text("alice".into()), Value::Bool(true)];
/// assert_eq!(values[0].as_int(), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Database NULL, whatever the declared column type
    Null,
    /// Integer family (`smallint`, `integer`, `bigint`, serials, `oid`)
    Int(i64),
    /// Floating family (`real`, `double precision`, `numeric`)
    Float(f64),
    /// `boolean`
    Bool(bool),
    /// `name`
    Keyword(Keyword),
    /// Any other type, as the server rendered it
    Text(String),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Floats as-is; integers widen to `f64`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_keyword(&self) -> Option<&Keyword> {
        if let Value::Keyword(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Short tag used by diagnostics and table output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Keyword(_) => "keyword",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Keyword(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_compare_by_text() {
        let a = Keyword::new("pg_class");
        let b = Keyword::from("pg_class");
        assert_eq!(a, b);
        assert_ne!(a, Keyword::new("pg_type"));
        assert_ne!(Value::Keyword(a.clone()), Value::Text("pg_class".into()));
        assert_eq!(a.to_string(), ":pg_class");
        assert_eq!(serde_json::to_string(&a).unwrap(), r#""pg_class""#);
    }

    #[test]
    fn accessors_match_variants() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Int(42).as_float(), Some(42.0));
        assert_eq!(Value::Float(1.5).as_int(), None);
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Text("x".into()).as_text(), Some("x"));
        assert_eq!(
            Value::Keyword(Keyword::new("pg_class")).as_keyword().map(Keyword::as_str),
            Some("pg_class")
        );
    }

    #[test]
    fn serializes_as_plain_json() {
        let values = vec![
            Value::Null,
            Value::Int(7),
            Value::Bool(true),
            Value::Keyword(Keyword::new("relname")),
            Value::Text("O'Brien".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,7,true,"relname","O'Brien"]"#);
    }

    #[test]
    fn keyword_displays_with_colon() {
        assert_eq!(Keyword::new("oid").to_string(), ":oid");
    }
}
