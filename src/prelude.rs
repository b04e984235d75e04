//! Convenient imports for common functionality.

pub use crate::connection::Connection;
pub use crate::error::PgSessionError;
pub use crate::results::{CellMeta, QueryResult, Row};
pub use crate::sql::{Composite, Fragment, SqlPart};
pub use crate::types::{Keyword, Value};

#[cfg(feature = "postgres")]
pub use crate::postgres::SessionConfig;
