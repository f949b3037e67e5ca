// src/services/violations.rs

//! Violation counting and the auto-submit it can trigger.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    services::{
        roster,
        submission::{SubmissionKind, record_submission},
    },
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationStatus {
    /// No live session; nothing was counted.
    NotLoggedIn,
    /// Counted, still under the threshold.
    Ok,
    /// Counted, threshold exceeded: the attempt was force-submitted.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViolationOutcome {
    pub status: ViolationStatus,
    pub violations: u32,
}

/// Whether `count` violations force a submission.
pub fn exceeds_threshold(count: u32, max_violations: u32) -> bool {
    count > max_violations
}

/// Records one violation for the session `session_id`.
///
/// The increment happens under the session lock, then the new count is
/// mirrored to the roster. Crossing the threshold force-submits the last
/// heartbeat answers and ends the session, so it fires at most once.
pub async fn record_violation(state: &AppState, session_id: Option<Uuid>) -> ViolationOutcome {
    let not_logged_in = ViolationOutcome {
        status: ViolationStatus::NotLoggedIn,
        violations: 0,
    };
    let Some(id) = session_id else {
        return not_logged_in;
    };

    let Some(session) = state
        .sessions
        .update(id, |s| {
            s.violations += 1;
            s.clone()
        })
        .await
    else {
        return not_logged_in;
    };
    let count = session.violations;
    tracing::warn!("Violation {} recorded for {}", count, session.username);

    roster::persist_violations(
        state.store.as_ref(),
        &session.username,
        count,
        &state.config.default_pool,
    )
    .await;

    if !exceeds_threshold(count, state.config.max_violations) {
        return ViolationOutcome {
            status: ViolationStatus::Ok,
            violations: count,
        };
    }

    // Only the request that removes the session gets to submit.
    if state.sessions.remove(id).await.is_some() {
        let answers = session.answers.clone().unwrap_or_default();
        record_submission(state, &session, answers, count, SubmissionKind::Forced).await;
    }

    ViolationOutcome {
        status: ViolationStatus::Blocked,
        violations: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::student::Student,
        sheets::{InMemorySheetStore, Table},
    };
    use std::sync::Arc;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "SHEETS_ACCESS_TOKEN" => Some("t".to_string()),
            "STUDENTS_SPREADSHEET_ID" | "QUESTIONS_SPREADSHEET_ID" | "RESPONSES_SPREADSHEET_ID" => {
                Some("id".to_string())
            }
            _ => None,
        })
        .unwrap()
    }

    fn fixture() -> (Arc<InMemorySheetStore>, AppState) {
        let store = Arc::new(
            InMemorySheetStore::new()
                .with_table(
                    Table::Students,
                    &["Username", "Password", "Department", "RollNo", "Name", "Violations", "Submitted"],
                    &[&["alice", "pw", "", "R1", "Alice", "0", "0"]],
                )
                .with_table(
                    Table::Questions,
                    &["QID", "Department", "Question", "Option1", "Option2", "Option3", "Option4", "Answer"],
                    &[&["Q1", "", "Capital of France?", "Paris", "Rome", "Oslo", "Bern", "Paris"]],
                )
                .with_table(Table::Responses, &crate::models::response::RESPONSE_HEADERS, &[]),
        );
        let state = AppState::new(store.clone(), config());
        (store, state)
    }

    fn alice() -> Student {
        Student {
            row: 2,
            username: "alice".to_string(),
            password: "pw".to_string(),
            department: "Aptitude".to_string(),
            roll_no: "R1".to_string(),
            name: "Alice".to_string(),
            violations: 0,
            submitted: false,
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!exceeds_threshold(5, 5));
        assert!(exceeds_threshold(6, 5));
    }

    #[tokio::test]
    async fn test_without_session() {
        let (_, state) = fixture();
        let outcome = record_violation(&state, None).await;
        assert_eq!(outcome.status, ViolationStatus::NotLoggedIn);
        assert_eq!(outcome.violations, 0);

        let outcome = record_violation(&state, Some(Uuid::new_v4())).await;
        assert_eq!(outcome.status, ViolationStatus::NotLoggedIn);
    }

    #[tokio::test]
    async fn test_sixth_violation_auto_submits_once() {
        let (store, state) = fixture();
        let session = state.sessions.create(&alice()).await;
        state
            .sessions
            .update(session.id, |s| {
                s.answers = Some([("Q1".to_string(), "Paris".to_string())].into())
            })
            .await;

        for expected in 1..=5 {
            let outcome = record_violation(&state, Some(session.id)).await;
            assert_eq!(outcome.status, ViolationStatus::Ok);
            assert_eq!(outcome.violations, expected);
            assert_eq!(store.row_count(Table::Responses), 0);
        }
        assert_eq!(store.snapshot(Table::Students)[1][5], "5");

        let outcome = record_violation(&state, Some(session.id)).await;
        assert_eq!(outcome.status, ViolationStatus::Blocked);
        assert_eq!(outcome.violations, 6);

        let outcome = record_violation(&state, Some(session.id)).await;
        assert_eq!(outcome.status, ViolationStatus::NotLoggedIn);

        let responses = store.snapshot(Table::Responses);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1][6], r#"{"Q1":"Paris"}"#);
        assert_eq!(responses[1][7], "1");
        assert_eq!(responses[1][8], "6");

        let roster = store.snapshot(Table::Students);
        assert_eq!(roster[1][5], "6");
        assert_eq!(roster[1][6], "1");
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_stop_counting() {
        let (store, state) = fixture();
        let session = state.sessions.create(&alice()).await;
        store.set_fail_writes(true);

        let outcome = record_violation(&state, Some(session.id)).await;
        assert_eq!(outcome.status, ViolationStatus::Ok);
        assert_eq!(outcome.violations, 1);
        assert_eq!(store.snapshot(Table::Students)[1][5], "0");
    }
}
