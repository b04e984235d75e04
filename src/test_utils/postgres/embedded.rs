use postgresql_embedded::PostgreSQL;

use super::super::SHARED_RUNTIME;
use crate::connection::Connection;

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// URL form, including credentials
    pub database_url: String,
    /// Key/value form of the same target
    pub conninfo: String,
}

/// Set up an embedded `PostgreSQL` instance with database `dbname`.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up or started, if the
/// database cannot be created, or if the post-start connectivity check fails.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let (postgresql, port, database_url, conninfo) = SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();

        // Bundled binaries, so no download
        postgresql.setup().await?;
        postgresql.start().await?;

        let settings = postgresql.settings();
        let port = settings.port;
        let host = settings.host.clone();
        let user = settings.username.clone();
        let password = settings.password.clone();

        postgresql.create_database(dbname).await?;

        let database_url = format!("postgres://{user}:{password}@{host}:{port}/{dbname}");
        let conninfo =
            format!("host={host} port={port} user={user} password={password} dbname={dbname}");
        Ok::<_, Box<dyn std::error::Error>>((postgresql, port, database_url, conninfo))
    })?;

    tracing::info!(port, "embedded PostgreSQL started");

    // Outside the shared runtime: the session drives its own.
    let conn = Connection::connect(&conninfo)?;
    conn.execute("SELECT 1")?;
    conn.disconnect();

    Ok(EmbeddedPostgres {
        postgresql,
        port,
        database_url,
        conninfo,
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
