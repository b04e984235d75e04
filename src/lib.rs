//! Blocking PostgreSQL sessions.
//!
//! A [`Connection`] runs plain SQL and hands back a [`QueryResult`] whose
//! cells are decoded by column type: integers, floats, booleans, `name`
//! keywords, and everything else as text. Type names are looked up once per
//! session and cached. [`Composite`] assembles queries from escaped fragments.
//!
//! ```rust,no_run
//! use pgsession::{Connection, Value};
//!
//! # fn main() -> Result<(), pgsession::PgSessionError> {
//! let conn = Connection::connect("host=localhost user=postgres dbname=app")?;
//! if let Some(result) = conn.execute("SELECT 1 AS n, true AS b, NULL AS z")? {
//!     let rows = result.collect_all()?;
//!     assert_eq!(rows[0].get("n"), Some(&Value::Int(1)));
//! }
//! conn.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod connection;
mod decode;
pub mod driver;
pub mod error;
pub mod escape;
pub mod prelude;
mod redact;
pub mod registry;
pub mod results;
pub mod sql;
pub mod test_utils;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use connection::Connection;
pub use driver::{ColumnDesc, Driver, DriverError, ExecOutcome, TupleSet};
pub use error::PgSessionError;
pub use redact::redact_conninfo;
pub use registry::{TypeCategory, TypeName};
pub use results::{CellMeta, QueryResult, Row, Rows};
pub use sql::{Composite, Fragment, FragmentKind, SqlPart};
pub use types::{Keyword, Value};

#[cfg(feature = "postgres")]
pub use postgres::{PgDriver, SessionConfig};
