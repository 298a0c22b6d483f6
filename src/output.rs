//! Result Rendering
//!
//! Stdout carries only result lines: one per row, a fixed label followed by
//! the row's first column. Diagnostics and logs go to stderr.

use std::io::Write;

use crate::engine::ResultRow;
use crate::error::Result;

/// The statement the binary runs
pub const VERSION_QUERY: &str = "SELECT VERSION()";

/// Label printed before each version row
pub const VERSION_LABEL: &str = "MySQL Version: ";

/// Write `label` + first column for every row, returning the number of lines written
///
/// A NULL or missing first column renders as empty text. The first row
/// error stops iteration and is returned.
pub fn write_labeled_rows<I, W>(rows: I, label: &str, out: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = Result<ResultRow>>,
    W: Write,
{
    let mut written = 0;
    for row in rows {
        let value = row?.get_string(0).unwrap_or_default();
        writeln!(out, "{label}{value}")?;
        written += 1;
    }
    out.flush()?;

    Ok(written)
}
