//! Per-connection cache of type OID → type name.
//!
//! Names come from `SELECT <oid>::oid::regtype`, issued at most once per OID on
//! the connection that first saw it. Each name is mapped once onto a closed
//! [`TypeCategory`], which is what the decoder dispatches on.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, LazyLock};

use crate::driver::{Driver, ExecOutcome};
use crate::error::PgSessionError;

/// Decoding strategy for a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Parsed as `i64`
    Integer,
    /// Parsed as `f64`
    Float,
    /// `t` / `f`
    Boolean,
    /// Catalog identifiers, decoded as keywords
    Name,
    /// Passed through unchanged
    Text,
}

/// Type names as `regtype` renders them. Adding a category is an edit here.
const CATEGORY_TABLE: &[(&str, TypeCategory)] = &[
    ("smallint", TypeCategory::Integer),
    ("integer", TypeCategory::Integer),
    ("bigint", TypeCategory::Integer),
    ("smallserial", TypeCategory::Integer),
    ("serial", TypeCategory::Integer),
    ("bigserial", TypeCategory::Integer),
    ("oid", TypeCategory::Integer),
    ("real", TypeCategory::Float),
    ("double precision", TypeCategory::Float),
    ("numeric", TypeCategory::Float),
    ("boolean", TypeCategory::Boolean),
    ("name", TypeCategory::Name),
];

static CATEGORIES: LazyLock<HashMap<&'static str, TypeCategory>> =
    LazyLock::new(|| CATEGORY_TABLE.iter().copied().collect());

impl TypeCategory {
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        CATEGORIES.get(name).copied().unwrap_or(TypeCategory::Text)
    }
}

/// A resolved registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    name: Arc<str>,
    category: TypeCategory,
}

impl TypeName {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            category: TypeCategory::from_type_name(name),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn category(&self) -> TypeCategory {
        self.category
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    names: HashMap<u32, TypeName>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `oid`, without touching the database.
    #[must_use]
    pub fn get(&self, oid: u32) -> Option<&TypeName> {
        self.names.get(&oid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Cached entry for `oid`, querying `driver` on a miss.
    ///
    /// # Errors
    /// Returns `PgSessionError::TypeResolutionError` if the lookup query does
    /// not yield a type name.
    pub fn resolve(
        &mut self,
        driver: &mut dyn Driver,
        oid: u32,
    ) -> Result<&TypeName, PgSessionError> {
        match self.names.entry(oid) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let name = lookup_type_name(driver, oid)?;
                tracing::debug!(oid, type_name = %name.as_str(), "resolved column type");
                Ok(entry.insert(name))
            }
        }
    }
}

fn lookup_type_name(driver: &mut dyn Driver, oid: u32) -> Result<TypeName, PgSessionError> {
    let query = format!("SELECT {oid}::oid::regtype");
    match driver.execute(&query) {
        ExecOutcome::Tuples(tuples) => match tuples.cell_text(0, 0) {
            Some(name) => Ok(TypeName::new(name)),
            None => Err(PgSessionError::TypeResolutionError {
                oid,
                message: "regtype lookup returned no name".to_string(),
            }),
        },
        other => Err(PgSessionError::TypeResolutionError {
            oid,
            message: other.message(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::scripted::ScriptedDriver;

    #[test]
    fn categories_follow_table() {
        assert_eq!(TypeCategory::from_type_name("integer"), TypeCategory::Integer);
        assert_eq!(TypeCategory::from_type_name("bigint"), TypeCategory::Integer);
        assert_eq!(
            TypeCategory::from_type_name("double precision"),
            TypeCategory::Float
        );
        assert_eq!(TypeCategory::from_type_name("boolean"), TypeCategory::Boolean);
        assert_eq!(TypeCategory::from_type_name("name"), TypeCategory::Name);
        assert_eq!(TypeCategory::from_type_name("jsonb"), TypeCategory::Text);
        assert_eq!(
            TypeCategory::from_type_name("public.mood"),
            TypeCategory::Text
        );
    }

    #[test]
    fn resolve_queries_once_per_oid() {
        let mut driver = ScriptedDriver::new();
        let log = driver.log();
        let mut registry = TypeRegistry::new();

        assert_eq!(registry.resolve(&mut driver, 23).unwrap().as_str(), "integer");
        assert_eq!(registry.resolve(&mut driver, 23).unwrap().as_str(), "integer");
        assert_eq!(registry.resolve(&mut driver, 16).unwrap().as_str(), "boolean");

        assert_eq!(log.regtype_lookups(), 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            log.commands(),
            vec![
                "SELECT 23::oid::regtype".to_string(),
                "SELECT 16::oid::regtype".to_string()
            ]
        );
    }

    #[test]
    fn failed_lookup_is_a_resolution_error() {
        let mut driver = ScriptedDriver::new().respond(
            "SELECT 99999::oid::regtype",
            ExecOutcome::Fatal("ERROR:  type with OID 99999 does not exist".into()),
        );
        let mut registry = TypeRegistry::new();

        let err = registry.resolve(&mut driver, 99999).unwrap_err();
        assert!(matches!(
            err,
            PgSessionError::TypeResolutionError { oid: 99999, ref message } if message.contains("does not exist")
        ));
        assert!(registry.is_empty());
    }
}
