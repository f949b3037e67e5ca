// src/handlers/exam.rs

use axum::{
    Form,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    models::answers::parse_answers_json,
    services::{
        roster, selector,
        submission::{SubmissionKind, record_submission},
    },
    state::AppState,
    utils::session::{CurrentSession, Session, clear_session_cookie, logout_redirect},
    views::{self, ExamHeader},
};

/// Final exam form. `answers_json` maps question id to chosen option text.
#[derive(Debug, Deserialize)]
pub struct SubmitExamForm {
    #[serde(default)]
    pub answers_json: Option<String>,
}

/// Ends `session` when the roster says the attempt is already in.
///
/// Returns the redirect to send instead of the page. A roster read failure
/// lets the request through.
async fn reject_if_submitted(state: &AppState, session: &Session) -> Option<Response> {
    match roster::find_student(state.store.as_ref(), &session.username, &state.config.default_pool).await {
        Ok(Some(student)) if student.submitted => {
            tracing::info!("{} already submitted, closing session", session.username);
            state.sessions.remove(session.id).await;
            Some(logout_redirect(state.config.secure_cookies))
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Could not re-check submission for {}: {}", session.username, e);
            None
        }
    }
}

pub async fn instructions(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    let Some(session) = session else {
        return Redirect::to("/").into_response();
    };
    if let Some(redirect) = reject_if_submitted(&state, &session).await {
        return redirect;
    }

    let page = views::instructions_page(
        &session.name,
        &session.username,
        state.config.exam_duration_min,
        state.config.max_violations,
    );
    Html(page.into_string()).into_response()
}

/// Serves a freshly shuffled paper for the session's department.
pub async fn exam_page(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    let Some(session) = session else {
        return Redirect::to("/").into_response();
    };
    if let Some(redirect) = reject_if_submitted(&state, &session).await {
        return redirect;
    }

    let questions = match selector::select_questions(
        state.store.as_ref(),
        &session.department,
        &state.config.default_pool,
    )
    .await
    {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!("Questions error for {}: {}", session.username, e);
            return e.into_response();
        }
    };

    let header = ExamHeader {
        username: &session.username,
        name: &session.name,
        roll_no: &session.roll_no,
        department: &session.department,
    };
    let page = views::exam_page(
        &header,
        &questions,
        state.config.exam_duration_min,
        state.config.max_violations,
    );
    Html(page.into_string()).into_response()
}

/// Scores and records the submitted paper, then ends the session.
///
/// The recorded violation count is the session's own counter.
pub async fn submit_exam(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<SubmitExamForm>,
) -> Response {
    let Some(session) = session else {
        return Redirect::to("/").into_response();
    };
    if let Some(redirect) = reject_if_submitted(&state, &session).await {
        return redirect;
    }

    // Whoever removes the session owns the submission.
    let Some(session) = state.sessions.remove(session.id).await else {
        return Redirect::to("/").into_response();
    };

    let answers = parse_answers_json(form.answers_json.as_deref().unwrap_or("{}"));
    let violations = session.violations;
    record_submission(&state, &session, answers, violations, SubmissionKind::Explicit).await;

    let page = views::thank_you_page(&session.username);
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Html(page.into_string()),
    )
        .into_response()
}
