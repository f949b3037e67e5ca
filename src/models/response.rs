// src/models/response.rs

use chrono::{DateTime, Local};

use super::answers::{Answers, serialize_answers};

/// Timestamp layout used in the responses sheet.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column order of the responses sheet.
pub const RESPONSE_HEADERS: [&str; 9] = [
    "Username",
    "RollNo",
    "Name",
    "Department",
    "StartTime",
    "EndTime",
    "Answers",
    "Score",
    "ViolationsAtSubmit",
];

/// One submitted attempt. Appended once, never updated.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub username: String,
    pub roll_no: String,
    pub name: String,
    pub department: String,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub answers: Answers,
    pub score: usize,
    /// Violation count at the moment of submission.
    pub violations: u32,
}

impl ResponseRecord {
    /// Cell values in `RESPONSE_HEADERS` order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.roll_no.clone(),
            self.name.clone(),
            self.department.clone(),
            self.start_time.format(TIMESTAMP_FORMAT).to_string(),
            self.end_time.format(TIMESTAMP_FORMAT).to_string(),
            serialize_answers(&self.answers),
            self.score.to_string(),
            self.violations.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_row_layout() {
        let start = Local.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2026, 3, 1, 10, 15, 30).unwrap();
        let mut answers = Answers::new();
        answers.insert("Q1".to_string(), "Paris".to_string());

        let record = ResponseRecord {
            username: "alice".to_string(),
            roll_no: "R1".to_string(),
            name: "Alice A".to_string(),
            department: "CSE".to_string(),
            start_time: start,
            end_time: end,
            answers,
            score: 1,
            violations: 2,
        };

        let row = record.to_row();
        assert_eq!(row.len(), RESPONSE_HEADERS.len());
        assert_eq!(row[4], "2026-03-01 09:00:00");
        assert_eq!(row[5], "2026-03-01 10:15:30");
        assert_eq!(row[6], r#"{"Q1":"Paris"}"#);
        assert_eq!(row[7], "1");
        assert_eq!(row[8], "2");
    }

    #[test]
    fn test_headers_name_submission_count() {
        assert_eq!(RESPONSE_HEADERS[6], "Answers");
        assert_eq!(RESPONSE_HEADERS[8], "ViolationsAtSubmit");
    }
}
