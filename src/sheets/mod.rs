// src/sheets/mod.rs

//! Spreadsheet-backed persistence.
//!
//! The portal owns no database: the roster, the question bank and the
//! submitted responses live in three spreadsheet tables. This module defines
//! the narrow surface the rest of the crate relies on (full-table read,
//! single-cell write, row append) and the backends implementing it.

pub mod google;
pub mod memory;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use google::{GoogleSheetsClient, TokenSource};
pub use memory::InMemorySheetStore;

/// The three tables the portal reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Students,
    Questions,
    Responses,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Students => "Students",
            Table::Questions => "Questions",
            Table::Responses => "Responses",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by a spreadsheet backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The HTTP request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("sheets API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Obtaining or refreshing the access token failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API answered with something we could not decode.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("table {0} is not configured")]
    UnknownTable(Table),

    /// Injected by the in-memory backend.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A single data row, keyed by trimmed header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based row number inside the sheet (the header occupies row 1).
    pub number: usize,
    values: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(number: usize, values: HashMap<String, String>) -> Self {
        Self { number, values }
    }

    /// Cell value under `column`, trimmed. `None` when the column is absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.trim())
    }
}

/// A full read of one table: header row plus every non-empty data row.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl SheetTable {
    /// Builds a table from raw cell values, the first row being the header.
    ///
    /// Short rows are padded with empty cells and blank rows are dropped
    /// while keeping the sheet row numbering intact.
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut iter = values.into_iter();
        let headers: Vec<String> = match iter.next() {
            Some(header) => header.into_iter().map(|h| h.trim().to_string()).collect(),
            None => return Self::default(),
        };

        let rows = iter
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
            .map(|(idx, cells)| {
                let values = headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| !h.is_empty())
                    .map(|(col, h)| (h.clone(), cells.get(col).cloned().unwrap_or_default()))
                    .collect();
                SheetRow::new(idx + 2, values)
            })
            .collect();

        Self { headers, rows }
    }

    /// 1-based column index of `name`, resolved from the header row.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name).map(|i| i + 1)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Remote spreadsheet operations consumed by the portal.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Reads the header row and every data row of `table`.
    async fn read_table(&self, table: Table) -> Result<SheetTable, StoreError>;

    /// Writes `value` at the 1-based (`row`, `col`) cell of `table`.
    async fn write_cell(
        &self,
        table: Table,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Appends one row after the last data row of `table`.
    async fn append_row(&self, table: Table, values: &[String]) -> Result<(), StoreError>;
}
