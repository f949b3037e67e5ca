// src/handlers/integrity.rs

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    models::answers::answers_from_value,
    services::violations::{ViolationStatus, record_violation},
    state::AppState,
    utils::session::{CurrentSession, clear_session_cookie},
};

/// Counts one integrity violation reported by the exam page.
///
/// Responds `{"status": "...", "violations": n}`; `blocked` means the attempt
/// was force-submitted and the session is gone.
pub async fn violation(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    let outcome = record_violation(&state, session.map(|s| s.id)).await;

    if outcome.status == ViolationStatus::Blocked {
        return (
            [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
            Json(outcome),
        )
            .into_response();
    }
    Json(outcome).into_response()
}

/// Same transition as `violation`, sent with `navigator.sendBeacon` on unload.
/// Always answers 204 without a body.
pub async fn violation_beacon(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> StatusCode {
    let outcome = record_violation(&state, session.map(|s| s.id)).await;
    tracing::debug!("Beacon violation: {:?}", outcome);
    StatusCode::NO_CONTENT
}

/// Caches the latest answers in the session. Never writes to the store.
pub async fn heartbeat(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    body: Bytes,
) -> Json<Value> {
    if let Some(session) = session {
        let answers = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|payload| match payload {
                Value::Object(mut map) => map.remove("answers"),
                _ => None,
            });

        if let Some(answers) = answers {
            let answers = answers_from_value(answers);
            state
                .sessions
                .update(session.id, |s| s.answers = Some(answers))
                .await;
        }
    }
    Json(json!({ "ok": true }))
}
