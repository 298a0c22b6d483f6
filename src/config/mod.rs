//! Configuration Loading
//!
//! This module reads the four MySQL connection parameters from a `.env` file
//! in the current working directory.
//!
//! # File Format
//! Plain `KEY=VALUE` lines. The first `=` is the delimiter; everything after
//! it (including further `=` characters) is the value. There is no quoting,
//! escaping, comment syntax or whitespace trimming.
//!
//! # Recognized Keys
//! - `DB_HOST` - server host, optionally `tcp://`-prefixed and/or with `:port`
//! - `DB_USER` - user name
//! - `DB_PASS` - password
//! - `DB_NAME` - schema selected after connecting
//!
//! Unknown keys are ignored. Lines without `=` or with an empty value are
//! skipped. Missing keys stay empty strings: nothing here validates that the
//! credentials are complete, the server rejects them instead.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ProbeError, Result};

/// Name of the config file, resolved against the current working directory
pub const ENV_FILE: &str = ".env";

/// Port used when `DB_HOST` does not carry one
pub const DEFAULT_PORT: u16 = 3306;

/// Connection parameters read from the config file
///
/// Populated once and not modified afterwards.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Server host as written in the file (`DB_HOST`)
    pub host: String,

    /// User name (`DB_USER`)
    pub user: String,

    /// Password (`DB_PASS`)
    /// WARNING: Sensitive data, do not log or include in error messages
    pub password: String,

    /// Schema to select (`DB_NAME`)
    pub database: String,
}

impl ConnectionParameters {
    /// Load parameters from `.env` in the current working directory
    ///
    /// Fails with `ConfigUnavailable` if the file cannot be opened.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(ENV_FILE))
    }

    /// Load parameters from an explicit path
    ///
    /// Only opening or reading the file can fail. The contents are handled
    /// as bytes, so unrelated lines in other encodings do not matter.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read(path).map_err(|e| {
            ProbeError::config_unavailable(format!("Could not open {} file: {e}", path.display()))
        })?;

        let params = Self::parse(&contents);
        tracing::debug!(
            path = %path.display(),
            host = %params.host,
            user = %params.user,
            database = %params.database,
            "loaded connection parameters"
        );

        Ok(params)
    }

    /// Parse config file contents
    ///
    /// Lines are split on `\n` only, so a trailing `\r` stays part of the value.
    /// Recognized values that are not valid UTF-8 get U+FFFD replacements.
    #[must_use]
    pub fn parse(contents: impl AsRef<[u8]>) -> Self {
        let mut params = Self::default();

        for line in contents.as_ref().split(|&b| b == b'\n') {
            let Some(eq) = line.iter().position(|&b| b == b'=') else {
                continue;
            };
            let (key, value) = (&line[..eq], &line[eq + 1..]);
            if value.is_empty() {
                continue;
            }

            let field = match key {
                b"DB_HOST" => &mut params.host,
                b"DB_USER" => &mut params.user,
                b"DB_PASS" => &mut params.password,
                b"DB_NAME" => &mut params.database,
                _ => continue,
            };
            *field = String::from_utf8_lossy(value).into_owned();
        }

        params
    }

    /// Resolve `host` into a hostname and TCP port
    ///
    /// Accepts `host`, `host:port`, `tcp://host:port` and `[v6addr]:port`.
    /// Anything else after the address (a port that does not parse, or
    /// trailing text after `]`) leaves the whole string as the hostname.
    #[must_use]
    pub fn endpoint(&self) -> (String, u16) {
        let raw = self.host.strip_prefix("tcp://").unwrap_or(&self.host);

        if let Some(rest) = raw.strip_prefix('[') {
            if let Some((addr, tail)) = rest.split_once(']') {
                let port = if tail.is_empty() {
                    Some(DEFAULT_PORT)
                } else {
                    tail.strip_prefix(':').and_then(|port| port.parse().ok())
                };
                return match port {
                    Some(port) => (addr.to_string(), port),
                    None => (raw.to_string(), DEFAULT_PORT),
                };
            }
        }

        match raw.rsplit_once(':') {
            // bare IPv6 literals contain more than one ':'
            Some((host, port)) if !host.contains(':') => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (raw.to_string(), DEFAULT_PORT),
            },
            _ => (raw.to_string(), DEFAULT_PORT),
        }
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &password)
            .field("database", &self.database)
            .finish()
    }
}
