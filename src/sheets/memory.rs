// src/sheets/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{SheetStore, SheetTable, StoreError, Table};

/// In-process spreadsheet backend.
///
/// Each table is kept as a grid of cells whose first row is the header,
/// mirroring the layout of the remote sheets. Reads and writes can be made
/// to fail on demand to exercise the degraded paths.
#[derive(Default)]
pub struct InMemorySheetStore {
    tables: Mutex<HashMap<Table, Vec<Vec<String>>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    reads: AtomicUsize,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `table` with a header row and data rows.
    pub fn with_table(self, table: Table, headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        grid.push(headers.iter().map(|h| h.to_string()).collect());
        grid.extend(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
        self.lock().insert(table, grid);
        self
    }

    /// Makes every subsequent write fail with `StoreError::Rejected`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent read fail with `StoreError::Network`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Raw grid of `table`, header first.
    pub fn snapshot(&self, table: Table) -> Vec<Vec<String>> {
        self.lock().get(&table).cloned().unwrap_or_default()
    }

    /// Number of data rows in `table`.
    pub fn row_count(&self, table: Table) -> usize {
        self.lock()
            .get(&table)
            .map(|grid| grid.len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Total full-table reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Table, Vec<Vec<String>>>> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self, table: Table) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(format!("writes to {table} disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl SheetStore for InMemorySheetStore {
    async fn read_table(&self, table: Table) -> Result<SheetTable, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Network(format!("reads of {table} disabled")));
        }
        let grid = self
            .lock()
            .get(&table)
            .cloned()
            .ok_or(StoreError::UnknownTable(table))?;
        Ok(SheetTable::from_values(grid))
    }

    async fn write_cell(
        &self,
        table: Table,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        self.check_writable(table)?;
        if row == 0 || col == 0 {
            return Err(StoreError::Rejected(format!("invalid cell ({row}, {col})")));
        }

        let mut tables = self.lock();
        let grid = tables.get_mut(&table).ok_or(StoreError::UnknownTable(table))?;
        if grid.len() < row {
            grid.resize_with(row, Vec::new);
        }
        let cells = &mut grid[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        Ok(())
    }

    async fn append_row(&self, table: Table, values: &[String]) -> Result<(), StoreError> {
        self.check_writable(table)?;
        let mut tables = self.lock();
        let grid = tables.get_mut(&table).ok_or(StoreError::UnknownTable(table))?;
        grid.push(values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySheetStore {
        InMemorySheetStore::new().with_table(
            Table::Students,
            &["Username", "Violations"],
            &[&["alice", "0"], &["bob", "2"]],
        )
    }

    #[tokio::test]
    async fn test_write_cell_updates_grid() {
        let store = store();
        store.write_cell(Table::Students, 3, 2, "3").await.unwrap();

        let table = store.read_table(Table::Students).await.unwrap();
        assert_eq!(table.rows[1].get("Violations"), Some("3"));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_append_row() {
        let store = store();
        store
            .append_row(Table::Students, &["carol".to_string(), "0".to_string()])
            .await
            .unwrap();
        assert_eq!(store.row_count(Table::Students), 3);
    }

    #[tokio::test]
    async fn test_failed_writes_leave_grid_untouched() {
        let store = store();
        store.set_fail_writes(true);

        let err = store.write_cell(Table::Students, 2, 2, "9").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.snapshot(Table::Students)[1][1], "0");
    }

    #[tokio::test]
    async fn test_failed_reads() {
        let store = store();
        store.set_fail_reads(true);
        let err = store.read_table(Table::Students).await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));

        store.set_fail_reads(false);
        assert!(store.read_table(Table::Students).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = store();
        let err = store.read_table(Table::Responses).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(Table::Responses)));
    }
}
