use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::driver::{Driver, DriverError, ExecOutcome};
use crate::error::PgSessionError;
use crate::redact::redact_conninfo;
use crate::registry::{TypeName, TypeRegistry};
use crate::results::QueryResult;
use crate::sql::Composite;

#[cfg(feature = "postgres")]
use crate::postgres::{PgDriver, SessionConfig};

/// Run right after connecting so unqualified names cannot resolve through a
/// schema the session user does not control.
pub(crate) const HARDEN_SEARCH_PATH: &str = "SELECT pg_catalog.set_config('search_path', '', false)";

enum Lifecycle {
    Open(Box<dyn Driver>),
    Closed,
}

/// State shared by a connection and every result it produced.
pub(crate) struct ConnectionState {
    info: String,
    lifecycle: Lifecycle,
    registry: TypeRegistry,
}

impl ConnectionState {
    /// Close the driver if it is still open. Returns whether this call closed it.
    fn release(&mut self) -> bool {
        match mem::replace(&mut self.lifecycle, Lifecycle::Closed) {
            Lifecycle::Open(mut driver) => {
                driver.close();
                true
            }
            Lifecycle::Closed => false,
        }
    }

    fn driver_mut(&mut self) -> Result<&mut dyn Driver, PgSessionError> {
        match &mut self.lifecycle {
            Lifecycle::Open(driver) => Ok(driver.as_mut()),
            Lifecycle::Closed => Err(PgSessionError::ConnectionClosedError),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Closed)
    }

    /// Resolve `oid`, answering from the cache even after the driver is closed.
    pub(crate) fn resolve(&mut self, oid: u32) -> Result<TypeName, PgSessionError> {
        if let Some(type_name) = self.registry.get(oid) {
            return Ok(type_name.clone());
        }
        let Self {
            lifecycle,
            registry,
            ..
        } = self;
        match lifecycle {
            Lifecycle::Open(driver) => registry.resolve(driver.as_mut(), oid).cloned(),
            Lifecycle::Closed => Err(PgSessionError::ConnectionClosedError),
        }
    }
}

impl Drop for ConnectionState {
    fn drop(&mut self) {
        if self.release() {
            tracing::debug!(conninfo = %redact_conninfo(&self.info), "connection released on drop");
        }
    }
}

/// A database session.
///
/// The handle is shared with every [`QueryResult`] it returns, so results stay
/// decodable after the `Connection` itself is dropped. `Connection` is `!Send`;
/// a session and its results live on one thread.
pub struct Connection {
    state: Rc<RefCell<ConnectionState>>,
}

impl Connection {
    /// Open a PostgreSQL session from a key/value or URL connection string.
    ///
    /// # Errors
    /// Returns `PgSessionError::ConnectError` carrying the driver diagnostic if
    /// the connection cannot be opened or hardened.
    #[cfg(feature = "postgres")]
    pub fn connect(info: &str) -> Result<Self, PgSessionError> {
        let driver = PgDriver::connect(info).map_err(|e| PgSessionError::ConnectError(e.message))?;
        Self::from_driver(info, Box::new(driver))
    }

    /// Open a PostgreSQL session from a [`SessionConfig`].
    ///
    /// # Errors
    /// Returns `PgSessionError::ConfigError` for an unusable config, otherwise
    /// as [`Connection::connect`].
    #[cfg(feature = "postgres")]
    pub fn connect_with_config(config: &SessionConfig) -> Result<Self, PgSessionError> {
        Self::connect(&config.to_conninfo()?)
    }

    /// Wrap an already opened driver, running the search-path hardening first.
    ///
    /// # Errors
    /// Returns `PgSessionError::ConnectError` if hardening does not succeed; the
    /// driver is closed before returning.
    pub fn from_driver(info: &str, mut driver: Box<dyn Driver>) -> Result<Self, PgSessionError> {
        match driver.execute(HARDEN_SEARCH_PATH) {
            ExecOutcome::Tuples(_) => {}
            other => {
                driver.close();
                return Err(PgSessionError::ConnectError(format!(
                    "failed to reset search_path: {}",
                    other.message()
                )));
            }
        }

        tracing::info!(conninfo = %redact_conninfo(info), "connected");
        Ok(Self {
            state: Rc::new(RefCell::new(ConnectionState {
                info: info.to_string(),
                lifecycle: Lifecycle::Open(driver),
                registry: TypeRegistry::new(),
            })),
        })
    }

    /// Close the handle. Later calls, and the eventual drop, do nothing.
    ///
    /// Results obtained earlier keep decoding from the resolved type cache.
    pub fn disconnect(&self) {
        let mut state = self.state.borrow_mut();
        if state.release() {
            tracing::info!(conninfo = %redact_conninfo(&state.info), "disconnected");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().is_closed()
    }

    /// Connection string with any password hidden.
    #[must_use]
    pub fn info(&self) -> String {
        redact_conninfo(&self.state.borrow().info).into_owned()
    }

    /// Number of type OIDs resolved on this session so far.
    #[must_use]
    pub fn cached_type_count(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// Run one command.
    ///
    /// Returns `None` when the command produced no tuples, or when the server
    /// answered with a non-fatal status (logged at `warn`). Every column type
    /// of a returned result is already resolved.
    ///
    /// # Errors
    /// - `PgSessionError::ConnectionClosedError` after [`Connection::disconnect`]
    /// - `PgSessionError::QueryError` with the server message on failure
    /// - `PgSessionError::TypeResolutionError` if a column type cannot be named
    pub fn execute(&self, command: &str) -> Result<Option<QueryResult>, PgSessionError> {
        let mut state = self.state.borrow_mut();
        tracing::debug!(command, "executing");

        let outcome = state.driver_mut()?.execute(command);
        match outcome {
            ExecOutcome::Tuples(tuples) => {
                for column in tuples.columns() {
                    state.resolve(column.type_oid)?;
                }
                drop(state);
                Ok(Some(QueryResult::new(tuples, Rc::clone(&self.state))))
            }
            ExecOutcome::CommandOk => Ok(None),
            ExecOutcome::Nonfatal(message) => {
                tracing::warn!(command, %message, "command completed with a non-fatal status");
                Ok(None)
            }
            ExecOutcome::Fatal(message) | ExecOutcome::BadResponse(message) => {
                Err(PgSessionError::QueryError(message))
            }
        }
    }

    /// Stringify `composite` against this session and run the result.
    ///
    /// # Errors
    /// As [`Composite::stringify`] and [`Connection::execute`].
    pub fn execute_composite(
        &self,
        composite: &Composite,
    ) -> Result<Option<QueryResult>, PgSessionError> {
        let sql = composite.stringify(self)?;
        self.execute(&sql)
    }

    /// Quote `input` as a string literal.
    ///
    /// # Errors
    /// Returns `PgSessionError::EscapeError` if the session is closed or the
    /// input cannot be quoted.
    pub fn escape_literal(&self, input: &str) -> Result<String, PgSessionError> {
        self.escape_with(input, |driver, text| driver.escape_literal(text))
    }

    /// Quote `input` as an identifier.
    ///
    /// # Errors
    /// Returns `PgSessionError::EscapeError` if the session is closed or the
    /// input cannot be quoted.
    pub fn escape_identifier(&self, input: &str) -> Result<String, PgSessionError> {
        self.escape_with(input, |driver, text| driver.escape_identifier(text))
    }

    fn escape_with<F>(&self, input: &str, escape: F) -> Result<String, PgSessionError>
    where
        F: FnOnce(&dyn Driver, &str) -> Result<String, DriverError>,
    {
        let state = self.state.borrow();
        match &state.lifecycle {
            Lifecycle::Open(driver) => escape(driver.as_ref(), input)
                .map_err(|e| PgSessionError::EscapeError(e.message)),
            Lifecycle::Closed => Err(PgSessionError::EscapeError(
                "connection is closed".to_string(),
            )),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<pg/connection {}>", self.info())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("info", &self.info())
            .field("closed", &self.is_closed())
            .field("cached_types", &self.cached_type_count())
            .finish()
    }
}
