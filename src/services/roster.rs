// src/services/roster.rs

//! Roster lookups and the best-effort writes against it.
//!
//! Reads propagate errors. Writes never do: a failed write is logged and the
//! request carries on with whatever state the sheet was left in.

use std::collections::BTreeSet;

use crate::{
    error::AppError,
    models::{
        response::ResponseRecord,
        student::{COL_SUBMITTED, COL_VIOLATIONS, Student},
    },
    sheets::{SheetStore, Table},
};

/// Looks up a student by username.
pub async fn find_student(
    store: &dyn SheetStore,
    username: &str,
    default_pool: &str,
) -> Result<Option<Student>, AppError> {
    let sheet = store.read_table(Table::Students).await?;
    Ok(Student::find(&sheet, username, default_pool)?)
}

/// Persisted violation count of `username`, `None` for unknown students.
pub async fn persisted_violations(
    store: &dyn SheetStore,
    username: &str,
    default_pool: &str,
) -> Result<Option<u32>, AppError> {
    Ok(find_student(store, username, default_pool)
        .await?
        .map(|s| s.violations))
}

/// Sorted distinct departments found in the roster.
pub async fn departments(store: &dyn SheetStore, default_pool: &str) -> Result<Vec<String>, AppError> {
    let sheet = store.read_table(Table::Students).await?;
    let departments: BTreeSet<String> = Student::load_all(&sheet, default_pool)?
        .into_iter()
        .map(|s| s.department)
        .collect();
    Ok(departments.into_iter().collect())
}

/// Writes one cell of `username`'s roster row. Failures are logged only.
async fn write_student_cell(
    store: &dyn SheetStore,
    username: &str,
    column: &str,
    value: &str,
    default_pool: &str,
) {
    let sheet = match store.read_table(Table::Students).await {
        Ok(sheet) => sheet,
        Err(e) => {
            tracing::error!("Cannot update {} for {}: roster read failed: {}", column, username, e);
            return;
        }
    };

    let Some(col) = sheet.column(column) else {
        tracing::warn!("Roster has no '{}' column, skipping update for {}", column, username);
        return;
    };

    let row = match Student::find(&sheet, username, default_pool) {
        Ok(Some(student)) => student.row,
        Ok(None) => {
            tracing::warn!("Student {} vanished from the roster", username);
            return;
        }
        Err(e) => {
            tracing::error!("Cannot update {} for {}: {}", column, username, e);
            return;
        }
    };

    match store.write_cell(Table::Students, row, col, value).await {
        Ok(()) => tracing::info!("Updated Students row {}, col {} -> {}", row, col, value),
        Err(e) => tracing::error!("Failed to update Students row {}, col {}: {}", row, col, e),
    }
}

/// Mirrors the violation counter into the roster.
pub async fn persist_violations(
    store: &dyn SheetStore,
    username: &str,
    count: u32,
    default_pool: &str,
) {
    write_student_cell(store, username, COL_VIOLATIONS, &count.to_string(), default_pool).await;
}

/// Flips the student's Submitted flag to "1".
pub async fn mark_submitted(store: &dyn SheetStore, username: &str, default_pool: &str) {
    write_student_cell(store, username, COL_SUBMITTED, "1", default_pool).await;
}

/// Appends a response row. Failures are logged only.
pub async fn append_response(store: &dyn SheetStore, record: &ResponseRecord) {
    match store.append_row(Table::Responses, &record.to_row()).await {
        Ok(()) => tracing::info!("Response recorded for {} (score {})", record.username, record.score),
        Err(e) => tracing::error!("Failed to append response for {}: {}", record.username, e),
    }
}
