// src/services/submission.rs

use chrono::Local;

use crate::{
    models::{answers::Answers, response::ResponseRecord},
    services::{roster, scoring},
    state::AppState,
    utils::session::Session,
};

/// Why a submission is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// The student pressed submit (or the timer ran out client-side).
    Explicit,
    /// The violation threshold was crossed.
    Forced,
}

/// Scores and records an attempt.
///
/// Write order: violation counter, response row, Submitted flag. Each write
/// is independent and best-effort, so a failure part-way leaves the earlier
/// writes in place. The caller ends the session afterwards.
///
/// Returns the score that was recorded.
pub async fn record_submission(
    state: &AppState,
    session: &Session,
    answers: Answers,
    violations: u32,
    kind: SubmissionKind,
) -> usize {
    let store = state.store.as_ref();
    let pool = &state.config.default_pool;

    let score = match scoring::calculate_score(store, &answers, &session.department, pool).await {
        Ok(score) => score,
        Err(e) => {
            tracing::error!("Scoring failed for {}, recording 0: {}", session.username, e);
            0
        }
    };

    roster::persist_violations(store, &session.username, violations, pool).await;

    let record = ResponseRecord {
        username: session.username.clone(),
        roll_no: session.roll_no.clone(),
        name: session.name.clone(),
        department: session.department.clone(),
        start_time: session.start_time,
        end_time: Local::now(),
        answers,
        score,
        violations,
    };
    roster::append_response(store, &record).await;

    roster::mark_submitted(store, &session.username, pool).await;

    tracing::info!(
        "{:?} submission for {}: score {}, violations {}",
        kind,
        session.username,
        score,
        violations
    );
    score
}
