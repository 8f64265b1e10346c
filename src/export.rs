//! CSV and JSON output for ledgers and scenario tables

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::WindfinResult;
use crate::projection::LedgerRow;
use crate::scenario::ScenarioResult;

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> WindfinResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the annual ledger with the fixed export columns
pub fn write_ledger<W: Write>(writer: W, rows: &[LedgerRow]) -> WindfinResult<()> {
    write_rows(writer, rows)
}

pub fn write_ledger_csv<P: AsRef<Path>>(path: P, rows: &[LedgerRow]) -> WindfinResult<()> {
    write_ledger(File::create(path)?, rows)
}

/// Write one row per Monte Carlo draw; unsolved IRRs are empty fields
pub fn write_scenarios<W: Write>(writer: W, rows: &[ScenarioResult]) -> WindfinResult<()> {
    write_rows(writer, rows)
}

pub fn write_scenarios_csv<P: AsRef<Path>>(path: P, rows: &[ScenarioResult]) -> WindfinResult<()> {
    write_scenarios(File::create(path)?, rows)
}

/// Pretty-printed JSON; non-finite floats become `null`
pub fn to_json<T: Serialize>(value: &T) -> WindfinResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
