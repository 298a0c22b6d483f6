//! Database Engine Core Types
//!
//! This module holds the pieces shared by the MySQL client:
//! - [`Driver`] - the process-wide driver handle
//! - [`ClientState`] - the observable lifecycle of a client
//! - [`ResultRow`] - one row produced by a row cursor
//!
//! # Blocking Interface
//! The MySQL client library is async. The driver owns a tokio runtime and
//! every client call blocks the calling thread on it, so callers see a plain
//! synchronous API: connect, query and row fetches return only once the
//! server has answered.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::future::Future;

use crate::error::{ProbeError, Result};

pub mod mysql;

static DRIVER: OnceCell<Driver> = OnceCell::new();

/// Process-wide driver handle
///
/// Created lazily by the first [`Driver::instance`] call and shared by every
/// client afterwards. It is never torn down while the process runs.
#[derive(Debug)]
pub struct Driver {
    runtime: tokio::runtime::Runtime,
}

impl Driver {
    /// Get the driver, initializing it on first use
    pub fn instance() -> Result<&'static Self> {
        DRIVER.get_or_try_init(|| {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("sqlprobe-driver")
                .enable_all()
                .build()
                .map_err(|e| {
                    ProbeError::connection_failed(format!("Could not start database driver: {e}"))
                })?;

            tracing::debug!("database driver initialized");
            Ok(Self { runtime })
        })
    }

    /// Run a client future to completion on the driver, blocking the caller
    ///
    /// Must not be called from inside an async context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Client lifecycle state
///
/// There is no explicit `Closed` value: a client is closed when dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No open connection (initial state, and after a failed connect)
    Unconnected,
    /// A session is open and the schema is selected
    Connected,
}

impl ClientState {
    /// Get the state name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One result row
///
/// Rows read from the server hold text or NULL; binary data is
/// Base64-encoded so every value is JSON-safe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    columns: Vec<String>,
    values: Vec<serde_json::Value>,
}

impl ResultRow {
    /// Create a row from column names and their values
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<serde_json::Value>) -> Self {
        Self { columns, values }
    }

    /// Column names, in select-list order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column values, in select-list order
    #[must_use]
    pub fn values(&self) -> &[serde_json::Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the raw value at a 0-based column index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&serde_json::Value> {
        self.values.get(index)
    }

    /// Get the textual value at a 0-based column index
    ///
    /// Returns `None` for a missing column or a SQL NULL. Non-string values
    /// are rendered in their JSON form (`42`, `1.5`, `true`).
    #[must_use]
    pub fn get_string(&self, index: usize) -> Option<String> {
        match self.values.get(index)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
