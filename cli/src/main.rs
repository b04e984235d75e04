mod args;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use pgsession::{Connection, PgSessionError};
use tracing::Level;

use crate::args::Args;
use crate::logging::LogWriter;
use crate::output::{NO_RESULT, render_meta, render_rows};

fn main() -> ExitCode {
    let args = Args::parse();
    let writer = LogWriter::new(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), PgSessionError> {
    let conninfo = args.resolve_conninfo()?;
    let conn = Connection::connect(&conninfo)?;

    for command in &args.commands {
        match conn.execute(command)? {
            Some(result) if args.meta => println!("{}", render_meta(&result, args.format)?),
            Some(result) => println!("{}", render_rows(&result, args.format)?),
            None => println!("{NO_RESULT}"),
        }
    }

    conn.disconnect();
    Ok(())
}
