// src/models/mod.rs

pub mod answers;
pub mod question;
pub mod response;
pub mod student;

use thiserror::Error;

use crate::sheets::{SheetTable, Table};

/// A table could not be mapped onto its typed record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("table {table} has no '{column}' column")]
    MissingColumn { table: Table, column: &'static str },
}

/// Fails unless every column in `columns` appears in the header row.
pub(crate) fn require_columns(
    sheet: &SheetTable,
    table: Table,
    columns: &[&'static str],
) -> Result<(), RecordError> {
    match columns.iter().find(|c| !sheet.has_column(c)) {
        Some(&column) => Err(RecordError::MissingColumn { table, column }),
        None => Ok(()),
    }
}
