//! sqlprobe CLI Entry Point
//!
//! Loads `.env`, connects, runs `SELECT VERSION()` and prints each row as
//! `MySQL Version: <version>`.
//!
//! Exit status is 0 on success and 1 when the connection fails. A missing
//! `.env` or a failing query aborts with the error on stderr and status 2.
//! Logs go to stderr; set `SQLPROBE_LOG=debug` to see them.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use sqlprobe::{write_labeled_rows, DatabaseClient, VERSION_LABEL, VERSION_QUERY};

/// sqlprobe - print the MySQL server version using credentials from ./.env
#[derive(Parser)]
#[command(name = "sqlprobe")]
#[command(about = "Connect to MySQL using ./.env credentials and print the server version")]
#[command(version)]
struct Cli {}

fn init_logging() {
    let level = std::env::var("SQLPROBE_LOG")
        .ok()
        .and_then(|value| value.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();
}

/// Exit status for aborted runs (missing config, failed query)
const EXIT_ABORTED: u8 = 2;

fn main() -> ExitCode {
    let _cli = Cli::parse();
    init_logging();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let mut client = DatabaseClient::new()?;

    // connect() already wrote the diagnostic line
    if !client.connect() {
        return Ok(ExitCode::FAILURE);
    }

    let mut rows = client.query(VERSION_QUERY).context("version query failed")?;
    let mut out = io::stdout().lock();
    write_labeled_rows(&mut rows, VERSION_LABEL, &mut out)?;
    rows.close()?;

    Ok(ExitCode::SUCCESS)
}
