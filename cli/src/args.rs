use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use pgsession::{PgSessionError, SessionConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL against PostgreSQL and print typed rows")]
pub(crate) struct Args {
    /// Key/value or URL connection string
    #[arg(long)]
    pub(crate) conninfo: Option<String>,
    /// JSON file with connection settings
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Command to run; repeat for several, run in order
    #[arg(short = 'c', long = "command", required = true)]
    pub(crate) commands: Vec<String>,
    #[arg(long, value_enum, default_value = "table")]
    pub(crate) format: OutputFormat,
    /// Print type, column, and value for the first row instead of all rows
    #[arg(long)]
    pub(crate) meta: bool,
    /// Also write logs to this file
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl Args {
    /// Connection string from `--conninfo`, then `--config`, then the environment.
    pub(crate) fn resolve_conninfo(&self) -> Result<String, PgSessionError> {
        if let Some(info) = &self.conninfo {
            return Ok(info.clone());
        }
        if let Some(path) = &self.config {
            return SessionConfig::from_json_file(path)?.to_conninfo();
        }
        match SessionConfig::from_env() {
            Some(config) => config.to_conninfo(),
            None => Err(PgSessionError::ConfigError(
                "no connection given: pass --conninfo or --config, or set PGSESSION_URL, DATABASE_URL, or PGHOST"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_commands() {
        let args = Args::parse_from([
            "pgsession-cli",
            "--conninfo",
            "host=localhost",
            "-c",
            "SELECT 1",
            "--command",
            "SELECT 2",
            "--format",
            "json",
        ]);
        assert_eq!(args.commands, vec!["SELECT 1", "SELECT 2"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.resolve_conninfo().unwrap(), "host=localhost");
    }

    #[test]
    fn command_is_required() {
        assert!(Args::try_parse_from(["pgsession-cli", "--conninfo", "host=h"]).is_err());
    }
}
