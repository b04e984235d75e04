// PostgreSQL module - the production driver over tokio-postgres
//
// - config: connection settings and connection-string helpers
// - executor: the blocking driver
// - query: tuple-set building and status classification

pub mod config;
pub mod executor;
mod query;

pub use config::{SessionConfig, validate_conninfo};
pub use executor::PgDriver;
