// src/models/student.rs

use crate::sheets::{SheetRow, SheetTable, Table};

use super::{RecordError, require_columns};

pub const COL_USERNAME: &str = "Username";
pub const COL_PASSWORD: &str = "Password";
pub const COL_DEPARTMENT: &str = "Department";
pub const COL_ROLL_NO: &str = "RollNo";
pub const COL_NAME: &str = "Name";
pub const COL_VIOLATIONS: &str = "Violations";
pub const COL_SUBMITTED: &str = "Submitted";

/// One row of the student roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Sheet row the record was read from.
    pub row: usize,

    pub username: String,

    /// Plaintext or an Argon2 PHC string.
    pub password: String,

    pub department: String,
    pub roll_no: String,
    pub name: String,

    /// Persisted violation counter. Unparseable cells read as 0.
    pub violations: u32,

    /// Stored as "0"/"1".
    pub submitted: bool,
}

impl Student {
    fn from_row(row: &SheetRow, default_pool: &str) -> Self {
        let field = |name: &str| row.get(name).unwrap_or_default().to_string();
        let department = match row.get(COL_DEPARTMENT) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => default_pool.to_string(),
        };

        Self {
            row: row.number,
            username: field(COL_USERNAME),
            password: field(COL_PASSWORD),
            department,
            roll_no: field(COL_ROLL_NO),
            name: field(COL_NAME),
            violations: row
                .get(COL_VIOLATIONS)
                .and_then(parse_counter)
                .unwrap_or(0),
            submitted: row.get(COL_SUBMITTED) == Some("1"),
        }
    }

    /// Maps every roster row onto a `Student`.
    pub fn load_all(sheet: &SheetTable, default_pool: &str) -> Result<Vec<Self>, RecordError> {
        require_columns(sheet, Table::Students, &[COL_USERNAME, COL_PASSWORD])?;
        Ok(sheet
            .rows
            .iter()
            .map(|row| Self::from_row(row, default_pool))
            .collect())
    }

    /// Finds `username` (trimmed, case-insensitive) in the roster.
    pub fn find(
        sheet: &SheetTable,
        username: &str,
        default_pool: &str,
    ) -> Result<Option<Self>, RecordError> {
        let wanted = username.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(None);
        }
        Ok(Self::load_all(sheet, default_pool)?
            .into_iter()
            .find(|s| s.username.to_lowercase() == wanted))
    }
}

/// Sheets hand back numbers as text, sometimes as "3.0".
fn parse_counter(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u32))
}
