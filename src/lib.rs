//! sqlprobe - MySQL connection check
//!
//! sqlprobe reads MySQL credentials from a `.env` file in the current
//! directory, opens one connection, runs a single statement and prints the
//! result rows.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`config`] - `.env` loading
//! - [`engine`] - Driver handle, MySQL client and row cursor
//! - [`output`] - Stdout rendering
//!
//! # Example
//! ```no_run
//! use sqlprobe::{DatabaseClient, VERSION_QUERY};
//!
//! # fn main() -> sqlprobe::Result<()> {
//! let mut client = DatabaseClient::new()?;
//! if client.connect() {
//!     for row in client.query(VERSION_QUERY)? {
//!         println!("{:?}", row?.get_string(0));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod output;

pub use config::ConnectionParameters;
pub use engine::mysql::{DatabaseClient, RowCursor};
pub use engine::{ClientState, Driver, ResultRow};
pub use error::{ProbeError, Result};
pub use output::{write_labeled_rows, VERSION_LABEL, VERSION_QUERY};
