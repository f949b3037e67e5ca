// src/utils/session.rs

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Local};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{models::answers::Answers, models::student::Student, services::roster, state::AppState};

pub const SESSION_COOKIE: &str = "exam_session";

/// Server-side state of one logged-in student.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub roll_no: String,
    pub name: String,
    pub department: String,
    pub start_time: DateTime<Local>,

    /// In-memory violation counter. Mirrored to the roster on every event.
    pub violations: u32,

    /// Last answers delivered by a heartbeat.
    pub answers: Option<Answers>,

    expires_at: Instant,
}

impl Session {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process session map keyed by the cookie value.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Opens a session for `student`, replacing any live session they hold.
    ///
    /// The violation counter starts from the persisted value, or from the
    /// replaced session's counter when that is higher, so a re-login
    /// continues counting instead of resetting it. Expired sessions are
    /// swept on the way.
    pub async fn create(&self, student: &Student) -> Session {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, s| !s.is_expired(now));

        let previous: Vec<Uuid> = sessions
            .values()
            .filter(|s| s.username == student.username)
            .map(|s| s.id)
            .collect();
        let mut violations = student.violations;
        let mut answers = None;
        for id in previous {
            if let Some(old) = sessions.remove(&id) {
                tracing::info!("Replacing session {} of {}", id, old.username);
                violations = violations.max(old.violations);
                answers = answers.or(old.answers);
            }
        }

        let session = Session {
            id: Uuid::new_v4(),
            username: student.username.clone(),
            roll_no: student.roll_no.clone(),
            name: student.name.clone(),
            department: student.department.clone(),
            start_time: Local::now(),
            violations,
            answers,
            expires_at: now + self.ttl,
        };
        sessions.insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.inner.read().await;
            match sessions.get(&id) {
                None => return None,
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }
        tracing::info!("Session {} expired", id);
        self.inner.write().await.remove(&id);
        None
    }

    /// Applies `f` to a live session under the write lock.
    pub async fn update<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(&id) {
            Some(session) if !session.is_expired(now) => Some(f(session)),
            Some(_) => {
                sessions.remove(&id);
                None
            }
            None => None,
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<Session> {
        self.inner.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// `Set-Cookie` value carrying the session id.
pub fn session_cookie(id: Uuid, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session id from the request's `Cookie` headers, if well formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Redirect to the login page that also drops the session cookie.
pub fn logout_redirect(secure: bool) -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie(secure))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Axum Middleware: Session loading.
///
/// Resolves the session cookie and injects the live `Session` into the
/// request extensions. Requests without a valid session pass through
/// untouched; handlers decide what anonymous access means for them.
pub async fn load_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(id) = session_id_from_headers(req.headers()) {
        if let Some(session) = state.sessions.get(id).await {
            req.extensions_mut().insert(session);
        }
    }
    next.run(req).await
}

/// Axum Middleware: Violation guard.
///
/// Must be layered inside `load_session`. Re-reads the persisted violation
/// count of the session's student and ends the session when it is already
/// over the threshold. The roster is left untouched; only the session goes.
pub async fn violation_guard(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let session = req.extensions().get::<Session>().cloned();

    if let Some(session) = session {
        match roster::persisted_violations(
            state.store.as_ref(),
            &session.username,
            &state.config.default_pool,
        )
        .await
        {
            Ok(Some(count)) if count > state.config.max_violations => {
                tracing::warn!(
                    "Blocking {}: {} persisted violations exceed {}",
                    session.username,
                    count,
                    state.config.max_violations
                );
                state.sessions.remove(session.id).await;
                return logout_redirect(state.config.secure_cookies);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Violation guard could not read roster: {}", e);
            }
        }
    }

    next.run(req).await
}

/// Extractor for the session injected by `load_session`.
pub struct CurrentSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(parts.extensions.get::<Session>().cloned()))
    }
}
