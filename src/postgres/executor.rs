use std::future::poll_fn;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tokio_postgres::tls::NoTlsStream;
use tokio_postgres::{AsyncMessage, Client, Config, Connection, NoTls, Socket};

use super::query::{build_tuple_set, classify_error, describe_columns};
use crate::driver::{Driver, DriverError, ExecOutcome};
use crate::escape::{quote_identifier, quote_literal};

/// Upper bound on waiting for the connection task to flush its Terminate message.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Blocking `Driver` over `tokio-postgres`.
///
/// Each driver owns a current-thread runtime. The connection task only makes
/// progress while one of the blocking methods runs, so there is no background
/// I/O between calls. Like the `postgres` crate, these methods must not be
/// called from inside another tokio runtime.
pub struct PgDriver {
    runtime: Runtime,
    client: Option<Client>,
    connection_task: Option<JoinHandle<()>>,
}

impl PgDriver {
    /// Open a connection described by a key/value or URL connection string.
    ///
    /// # Errors
    /// Returns `DriverError` with the server's or parser's diagnostic text.
    pub fn connect(info: &str) -> Result<Self, DriverError> {
        let config: Config = info
            .parse()
            .map_err(|e| DriverError::new(format!("invalid connection string: {e}")))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DriverError::new(format!("failed to start runtime: {e}")))?;

        let (client, connection) = runtime
            .block_on(config.connect(NoTls))
            .map_err(|e| DriverError::new(classify_error(&e).message()))?;

        let connection_task = runtime.spawn(drive_connection(connection));

        Ok(Self {
            runtime,
            client: Some(client),
            connection_task: Some(connection_task),
        })
    }

    fn open_client(&self) -> Result<&Client, DriverError> {
        match &self.client {
            Some(client) if !client.is_closed() => Ok(client),
            _ => Err(DriverError::new("connection is closed")),
        }
    }
}

/// Poll the connection, logging server notices as they arrive.
async fn drive_connection(mut connection: Connection<Socket, NoTlsStream>) {
    loop {
        match poll_fn(|cx| connection.poll_message(cx)).await {
            Some(Ok(AsyncMessage::Notice(notice))) => {
                tracing::warn!(
                    severity = notice.severity(),
                    code = notice.code().code(),
                    "{}",
                    notice.message()
                );
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "postgres connection terminated");
                break;
            }
            None => break,
        }
    }
}

impl Driver for PgDriver {
    fn execute(&mut self, sql: &str) -> ExecOutcome {
        let client = match self.open_client() {
            Ok(client) => client,
            Err(e) => return ExecOutcome::Fatal(e.message),
        };

        self.runtime.block_on(async {
            // Describe first: the simple protocol reports column names but not type OIDs.
            let stmt = match client.prepare(sql).await {
                Ok(stmt) => stmt,
                Err(e) => return classify_error(&e),
            };

            if stmt.columns().is_empty() {
                return match client.execute(&stmt, &[]).await {
                    Ok(_) => ExecOutcome::CommandOk,
                    Err(e) => classify_error(&e),
                };
            }

            let columns = describe_columns(&stmt);
            match client.simple_query(sql).await {
                Ok(messages) => build_tuple_set(columns, messages),
                Err(e) => classify_error(&e),
            }
        })
    }

    fn escape_literal(&self, text: &str) -> Result<String, DriverError> {
        self.open_client()?;
        quote_literal(text)
    }

    fn escape_identifier(&self, text: &str) -> Result<String, DriverError> {
        self.open_client()?;
        quote_identifier(text)
    }

    fn close(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        drop(client);

        if let Some(task) = self.connection_task.take() {
            let finished = self
                .runtime
                .block_on(async { tokio::time::timeout(CLOSE_GRACE, task).await });
            if finished.is_err() {
                tracing::warn!("postgres connection did not shut down within {CLOSE_GRACE:?}");
            }
        }
    }
}

impl Drop for PgDriver {
    fn drop(&mut self) {
        self.close();
    }
}
