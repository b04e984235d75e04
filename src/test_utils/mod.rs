/// In-memory driver for unit tests and benchmarks
pub mod scripted;

/// Embedded `PostgreSQL` for integration tests
#[cfg(feature = "test-utils")]
pub mod postgres;

#[cfg(feature = "test-utils")]
use std::sync::LazyLock;
#[cfg(feature = "test-utils")]
use tokio::runtime::Runtime;

/// Shared tokio runtime for test utilities to avoid creating multiple runtimes
#[cfg(feature = "test-utils")]
pub(crate) static SHARED_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("Failed to create tokio runtime for test utilities"));

#[cfg(feature = "test-utils")]
pub use postgres::*;
