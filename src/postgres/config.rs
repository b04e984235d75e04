use std::borrow::Cow;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PgSessionError;
use crate::redact::redact_conninfo;

/// Connection settings, loadable from JSON or the environment.
///
/// Either `url` is set, or the individual fields are rendered into a libpq
/// key/value connection string:
/// ```rust
/// use pgsession::SessionConfig;
///
/// let cfg = SessionConfig {
///     host: Some("localhost".into()),
///     dbname: Some("app".into()),
///     ..SessionConfig::default()
/// };
/// assert_eq!(cfg.to_conninfo().unwrap(), "host=localhost dbname=app");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
    pub application_name: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

impl SessionConfig {
    /// Render the connection string passed to `connect`.
    ///
    /// # Errors
    /// Returns `PgSessionError::ConfigError` if neither `url` nor `host` is set,
    /// or if the rendered string does not parse.
    pub fn to_conninfo(&self) -> Result<String, PgSessionError> {
        if let Some(url) = &self.url {
            validate_conninfo(url)?;
            return Ok(url.clone());
        }

        let Some(host) = &self.host else {
            return Err(PgSessionError::ConfigError(
                "host is required".to_string(),
            ));
        };

        let port = self.port.map(|p| p.to_string());
        let timeout = self.connect_timeout_secs.map(|t| t.to_string());
        let pairs = [
            ("host", Some(host.as_str())),
            ("port", port.as_deref()),
            ("user", self.user.as_deref()),
            ("password", self.password.as_deref()),
            ("dbname", self.dbname.as_deref()),
            ("application_name", self.application_name.as_deref()),
            ("connect_timeout", timeout.as_deref()),
        ];

        let info = pairs
            .iter()
            .filter_map(|(key, value)| value.map(|v| format!("{key}={}", quote_conninfo_value(v))))
            .collect::<Vec<_>>()
            .join(" ");

        validate_conninfo(&info)?;
        Ok(info)
    }

    /// Load settings from a JSON file.
    ///
    /// # Errors
    /// Returns `PgSessionError::ConfigError` if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, PgSessionError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PgSessionError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            PgSessionError::ConfigError(format!("Invalid JSON in {}: {e}", path.display()))
        })
    }

    /// Read settings from the process environment.
    ///
    /// See [`SessionConfig::from_env_with`] for the variables consulted.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`.
    ///
    /// Checks in order:
    /// 1. `PGSESSION_URL`
    /// 2. `DATABASE_URL`
    /// 3. `PGHOST` plus the optional `PGPORT`, `PGUSER`, `PGPASSWORD`, `PGDATABASE`
    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PGSESSION_URL").or_else(|| lookup("DATABASE_URL")) {
            return Some(Self {
                url: Some(url),
                ..Self::default()
            });
        }

        let host = lookup("PGHOST")?;
        Some(Self {
            host: Some(host),
            port: lookup("PGPORT").and_then(|p| p.parse().ok()),
            user: lookup("PGUSER"),
            password: lookup("PGPASSWORD"),
            dbname: lookup("PGDATABASE"),
            ..Self::default()
        })
    }
}

fn quote_conninfo_value(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return Cow::Borrowed(value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}

/// Check that `info` parses as a key/value or URL connection string.
///
/// # Errors
/// Returns `PgSessionError::ConfigError` with the parser's message.
pub fn validate_conninfo(info: &str) -> Result<tokio_postgres::Config, PgSessionError> {
    info.parse::<tokio_postgres::Config>().map_err(|e| {
        PgSessionError::ConfigError(format!(
            "invalid connection string '{}': {e}",
            redact_conninfo(info)
        ))
    })
}
