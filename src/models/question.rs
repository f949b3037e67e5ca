// src/models/question.rs

use crate::sheets::{SheetRow, SheetTable, Table};

use super::{RecordError, require_columns};

pub const COL_QID: &str = "QID";
pub const COL_DEPARTMENT: &str = "Department";
pub const COL_QUESTION: &str = "Question";
pub const COL_OPTIONS: [&str; 4] = ["Option1", "Option2", "Option3", "Option4"];
pub const COL_ANSWER: &str = "Answer";

/// A multiple-choice question from the question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,

    /// Owning department. Empty cells are reported as the default pool.
    pub department: String,

    /// Question text. May carry basic formatting markup.
    pub text: String,

    /// Non-empty option texts, in presentation order.
    pub options: Vec<String>,

    /// Text of the correct option.
    pub answer: String,
}

impl Question {
    fn from_row(row: &SheetRow, default_pool: &str) -> Option<Self> {
        let id = row.get(COL_QID).unwrap_or_default();
        if id.is_empty() {
            tracing::warn!("Skipping question at row {} without a QID", row.number);
            return None;
        }

        let department = match row.get(COL_DEPARTMENT) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => default_pool.to_string(),
        };

        let options = COL_OPTIONS
            .iter()
            .filter_map(|col| row.get(col))
            .filter(|opt| !opt.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            id: id.to_string(),
            department,
            text: row.get(COL_QUESTION).unwrap_or_default().to_string(),
            options,
            answer: row.get(COL_ANSWER).unwrap_or_default().to_string(),
        })
    }

    /// Maps the question bank onto typed records, skipping rows without a QID.
    pub fn load_all(sheet: &SheetTable, default_pool: &str) -> Result<Vec<Self>, RecordError> {
        let mut required = vec![COL_QID, COL_QUESTION, COL_ANSWER];
        required.extend(COL_OPTIONS);
        require_columns(sheet, Table::Questions, &required)?;

        Ok(sheet
            .rows
            .iter()
            .filter_map(|row| Self::from_row(row, default_pool))
            .collect())
    }
}
