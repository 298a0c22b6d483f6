//! MySQL Client Implementation
//!
//! This module implements the single-connection MySQL client and its row cursor.
//!
//! # Lifecycle
//! - `Unconnected` - initial state, and the state after a failed connect
//! - `Connected` - after a successful [`DatabaseClient::connect`]
//! - closed - when the client is dropped; the connection is released once
//!
//! # Implementation Notes
//! - Uses `mysql_async`, driven through the blocking [`Driver`]
//! - The schema is selected with `USE` after the session is open
//! - Statements go through the text protocol verbatim (no parameters, no escaping)
//! - A [`RowCursor`] mutably borrows its client, so the client cannot be
//!   queried again or dropped while rows are still being read
//! - Row values are text (or NULL); binary data is Base64-encoded for JSON safety

use mysql_async::{prelude::*, Conn, OptsBuilder, QueryResult, Row, TextProtocol, Value};
use std::fmt;
use std::io::{self, Write};

use crate::config::ConnectionParameters;
use crate::engine::{ClientState, Driver, ResultRow};
use crate::error::{ProbeError, Result};

/// Prefix of the diagnostic line written when a connect attempt fails
pub const CONNECT_FAILURE_PREFIX: &str = "Could not connect to the database. Error: ";

enum Session {
    Unconnected,
    Connected { driver: &'static Driver, conn: Conn },
}

/// MySQL client owning at most one connection
pub struct DatabaseClient {
    params: ConnectionParameters,
    session: Session,
}

impl DatabaseClient {
    /// Create a client from the `.env` file in the current working directory
    ///
    /// Fails with `ConfigUnavailable` before any network activity if the
    /// file cannot be opened.
    pub fn new() -> Result<Self> {
        Ok(Self::with_parameters(ConnectionParameters::load()?))
    }

    /// Create a client from explicit parameters
    #[must_use]
    pub fn with_parameters(params: ConnectionParameters) -> Self {
        Self { params, session: Session::Unconnected }
    }

    #[must_use]
    pub fn parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    #[must_use]
    pub fn state(&self) -> ClientState {
        match self.session {
            Session::Unconnected => ClientState::Unconnected,
            Session::Connected { .. } => ClientState::Connected,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ClientState::Connected
    }

    /// Open the connection and select the schema
    ///
    /// Every failure is reported as `ConnectionFailed` and leaves the client
    /// `Unconnected`. A single attempt is made; calling again retries.
    /// Already being connected is not an error.
    pub fn try_connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let driver = Driver::instance()?;
        let conn = driver.block_on(open_session(&self.params))?;
        self.session = Session::Connected { driver, conn };

        Ok(())
    }

    /// Connect, reporting failure as one diagnostic line on stderr
    ///
    /// Returns `true` once connected, `false` if the attempt failed.
    pub fn connect(&mut self) -> bool {
        self.connect_with_diagnostics(&mut io::stderr().lock())
    }

    /// Connect, reporting failure as one diagnostic line on `diagnostics`
    pub fn connect_with_diagnostics<W: Write>(&mut self, diagnostics: &mut W) -> bool {
        match self.try_connect() {
            Ok(()) => true,
            Err(err) => {
                let detail = match err {
                    ProbeError::ConnectionFailed(detail) => detail,
                    other => other.message(),
                };
                // nowhere left to report a failed diagnostic write
                let _ = writeln!(diagnostics, "{CONNECT_FAILURE_PREFIX}{detail}");
                false
            }
        }
    }

    /// Execute a statement and return a cursor over its rows
    ///
    /// The text is sent exactly as given. Must only be called once
    /// connected; otherwise returns `NotConnected`.
    pub fn query(&mut self, statement: &str) -> Result<RowCursor<'_>> {
        let Session::Connected { driver, conn } = &mut self.session else {
            return Err(ProbeError::NotConnected);
        };
        let driver: &'static Driver = *driver;

        tracing::debug!(statement, "executing query");
        let result = driver
            .block_on(conn.query_iter(statement.to_string()))
            .map_err(|e| ProbeError::query_failed(e.to_string()))?;

        Ok(RowCursor { driver, inner: Some(result) })
    }
}

impl fmt::Debug for DatabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseClient")
            .field("params", &self.params)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for DatabaseClient {
    fn drop(&mut self) {
        if let Session::Connected { driver, conn } =
            std::mem::replace(&mut self.session, Session::Unconnected)
        {
            tracing::debug!("closing MySQL connection");
            if let Err(e) = driver.block_on(conn.disconnect()) {
                tracing::warn!(error = %e, "MySQL connection did not close cleanly");
            }
        }
    }
}

/// Forward-only cursor over the rows of one executed statement
///
/// The server-side result is released once: when the rows run out, on
/// [`RowCursor::close`], or on drop, whichever comes first.
pub struct RowCursor<'a> {
    driver: &'static Driver,
    inner: Option<QueryResult<'a, 'static, TextProtocol>>,
}

impl RowCursor<'_> {
    /// Release the result set, reporting any error from draining it
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if let Some(result) = self.inner.take() {
            self.driver
                .block_on(result.drop_result())
                .map_err(|e| ProbeError::query_failed(format!("Failed to release result set: {e}")))?;
        }
        Ok(())
    }
}

impl Iterator for RowCursor<'_> {
    type Item = Result<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;

        match self.driver.block_on(inner.next()) {
            Ok(Some(row)) => Some(Ok(row_to_result_row(&row))),
            Ok(None) => match self.release() {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => {
                self.inner = None;
                Some(Err(ProbeError::query_failed(format!("Failed to fetch row: {e}"))))
            }
        }
    }
}

impl Drop for RowCursor<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %e, "result set was not released cleanly");
        }
    }
}

/// Open a session and select the schema
///
/// A session whose schema cannot be selected is closed before returning.
async fn open_session(params: &ConnectionParameters) -> Result<Conn> {
    let (host, port) = params.endpoint();
    tracing::debug!(%host, port, user = %params.user, "connecting to MySQL");

    let opts = OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(port)
        .user(Some(params.user.clone()))
        .pass(Some(params.password.clone()));

    let mut conn = Conn::new(opts).await.map_err(|e| ProbeError::connection_failed(e.to_string()))?;

    if let Err(e) = conn.query_drop(use_statement(&params.database)).await {
        if let Err(close_err) = conn.disconnect().await {
            tracing::warn!(error = %close_err, "MySQL connection did not close cleanly");
        }
        return Err(ProbeError::connection_failed(e.to_string()));
    }

    tracing::debug!(database = %params.database, "schema selected");
    Ok(conn)
}

/// Build the `USE` statement for a schema name
fn use_statement(database: &str) -> String {
    format!("USE `{}`", database.replace('`', "``"))
}

fn row_to_result_row(row: &Row) -> ResultRow {
    let columns = row.columns_ref().iter().map(|c| c.name_str().to_string()).collect();
    let values = (0..row.len())
        .map(|idx| row.as_ref(idx).map_or(serde_json::Value::Null, value_to_json))
        .collect();

    ResultRow::new(columns, values)
}

/// Convert a text-protocol MySQL value to a JSON value
///
/// Text-protocol rows only carry NULL or the column's text as bytes, so
/// numbers and dates arrive as their textual form (`SELECT 42` gives `"42"`).
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        // anything not UTF-8 is binary
        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => serde_json::Value::String(s.to_string()),
            Err(_) => {
                use base64::Engine;
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        },
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Parameters pointing at a port nothing listens on
    fn refused_params() -> ConnectionParameters {
        ConnectionParameters {
            host: "127.0.0.1:1".to_string(),
            user: "root".to_string(),
            password: "secret".to_string(),
            database: "testdb".to_string(),
        }
    }

    #[test]
    fn test_new_client_is_unconnected() {
        let client = DatabaseClient::with_parameters(refused_params());
        assert_eq!(client.state(), ClientState::Unconnected);
        assert!(!client.is_connected());
        assert_eq!(client.parameters().database, "testdb");
    }

    #[test]
    fn test_query_before_connect_is_not_connected() {
        let mut client = DatabaseClient::with_parameters(refused_params());
        let err = client.query("SELECT VERSION()").err().unwrap();
        assert!(matches!(err, ProbeError::NotConnected));
    }

    #[test]
    fn test_try_connect_refused() {
        let mut client = DatabaseClient::with_parameters(refused_params());
        let err = client.try_connect().unwrap_err();
        assert!(matches!(err, ProbeError::ConnectionFailed(_)));
        assert_eq!(client.state(), ClientState::Unconnected);
    }

    #[test]
    fn test_connect_refused_writes_one_diagnostic_line() {
        let mut client = DatabaseClient::with_parameters(refused_params());
        let mut diagnostics = Vec::new();

        assert!(!client.connect_with_diagnostics(&mut diagnostics));
        assert_eq!(client.state(), ClientState::Unconnected);

        let text = String::from_utf8(diagnostics).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let detail = lines[0].strip_prefix(CONNECT_FAILURE_PREFIX).unwrap();
        assert!(!detail.trim().is_empty());
    }

    #[test]
    fn test_connect_can_be_retried_by_caller() {
        let mut client = DatabaseClient::with_parameters(refused_params());
        let mut diagnostics = Vec::new();

        assert!(!client.connect_with_diagnostics(&mut diagnostics));
        assert!(!client.connect_with_diagnostics(&mut diagnostics));
        assert_eq!(String::from_utf8(diagnostics).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_debug_does_not_leak_password() {
        let client = DatabaseClient::with_parameters(refused_params());
        let debug = format!("{client:?}");
        assert!(debug.contains("Unconnected"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_use_statement_quotes_schema() {
        assert_eq!(use_statement("testdb"), "USE `testdb`");
        assert_eq!(use_statement("we`ird"), "USE `we``ird`");
        assert_eq!(use_statement(""), "USE ``");
    }

    #[test]
    fn test_value_to_json_text_and_null() {
        assert_eq!(value_to_json(&Value::NULL), serde_json::Value::Null);
        assert_eq!(value_to_json(&Value::Bytes(b"8.0.35".to_vec())), json!("8.0.35"));
        assert_eq!(value_to_json(&Value::Bytes(b"42".to_vec())), json!("42"));
        assert_eq!(value_to_json(&Value::Bytes(Vec::new())), json!(""));
    }

    #[test]
    fn test_value_to_json_binary_is_base64() {
        assert_eq!(value_to_json(&Value::Bytes(vec![0xff, 0x00, 0xfe])), json!("/wD+"));
    }

    // Live server tests. Run with:
    // SQLPROBE_TEST_HOST=... SQLPROBE_TEST_USER=... SQLPROBE_TEST_PASS=... SQLPROBE_TEST_DB=... \
    //     cargo test -- --ignored

    fn live_params() -> ConnectionParameters {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        ConnectionParameters {
            host: var("SQLPROBE_TEST_HOST"),
            user: var("SQLPROBE_TEST_USER"),
            password: var("SQLPROBE_TEST_PASS"),
            database: var("SQLPROBE_TEST_DB"),
        }
    }

    #[test]
    #[ignore] // Requires running MySQL instance
    fn test_live_version_query() {
        let mut client = DatabaseClient::with_parameters(live_params());
        assert!(client.connect());
        assert!(client.is_connected());

        let rows: Vec<ResultRow> =
            client.query("SELECT VERSION()").unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].get_string(0).unwrap().is_empty());
    }

    #[test]
    #[ignore] // Requires running MySQL instance
    fn test_live_cursor_dropped_early_leaves_client_usable() {
        let mut client = DatabaseClient::with_parameters(live_params());
        assert!(client.connect());

        {
            let mut cursor = client.query("SELECT 1 UNION ALL SELECT 2 UNION ALL SELECT 3").unwrap();
            assert!(cursor.next().is_some());
        }

        let rows: Vec<ResultRow> = client.query("SELECT 42").unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(rows[0].get_string(0), Some("42".to_string()));
        // text protocol: numbers come back as their text
        assert_eq!(rows[0].get(0), Some(&json!("42")));
    }

    #[test]
    #[ignore] // Requires running MySQL instance
    fn test_live_unknown_schema_fails_connect() {
        let mut params = live_params();
        params.database = "sqlprobe_no_such_schema".to_string();
        let mut client = DatabaseClient::with_parameters(params);

        let mut diagnostics = Vec::new();
        assert!(!client.connect_with_diagnostics(&mut diagnostics));
        assert_eq!(client.state(), ClientState::Unconnected);
    }
}
