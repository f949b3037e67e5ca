// src/handlers/auth.rs

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    services::roster,
    state::AppState,
    utils::{
        hash::verify_password,
        session::{CurrentSession, logout_redirect, session_cookie},
    },
    views,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const ALREADY_SUBMITTED: &str = "You have already submitted the test. You cannot login again.";
const BLOCKED: &str = "You are blocked due to excessive violations. Contact admin.";

/// Login form as posted by the login page.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(rename = "Username", default)]
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[serde(rename = "Password", default)]
    #[validate(length(min = 1))]
    pub password: String,
}

/// Renders the login page with an optional message.
async fn render_login(state: &AppState, status: StatusCode, error: Option<&str>) -> Response {
    let departments = match roster::departments(state.store.as_ref(), &state.config.default_pool).await {
        Ok(departments) => departments,
        Err(e) => {
            tracing::warn!("Could not list departments: {}", e);
            Vec::new()
        }
    };
    let page = views::login_page(&departments, state.config.exam_duration_min, error);
    (status, Html(page.into_string())).into_response()
}

/// Shows the login form.
pub async fn login_page(State(state): State<AppState>) -> Response {
    render_login(&state, StatusCode::OK, None).await
}

/// Authenticates a student and opens their exam session.
///
/// Rejected with a message on the login page when the credentials do not
/// match, the attempt was already submitted, or the student is over the
/// violation threshold.
pub async fn login(State(state): State<AppState>, Form(mut form): Form<LoginForm>) -> Response {
    form.username = form.username.trim().to_string();
    form.password = form.password.trim().to_string();

    if form.validate().is_err() {
        return render_login(&state, StatusCode::UNAUTHORIZED, Some(INVALID_CREDENTIALS)).await;
    }
    let LoginForm { username, password } = form;

    let student = match roster::find_student(state.store.as_ref(), &username, &state.config.default_pool).await {
        Ok(student) => student,
        Err(e) => {
            tracing::error!("Login lookup failed for {}: {}", username, e);
            let status = e.status();
            return render_login(&state, status, Some(e.public_message())).await;
        }
    };

    let Some(student) = student else {
        tracing::info!("Login rejected for unknown user {}", username);
        return render_login(&state, StatusCode::UNAUTHORIZED, Some(INVALID_CREDENTIALS)).await;
    };

    match verify_password(&password, &student.password) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Login rejected for {}: wrong password", username);
            return render_login(&state, StatusCode::UNAUTHORIZED, Some(INVALID_CREDENTIALS)).await;
        }
        Err(e) => {
            tracing::error!("Password check failed for {}: {}", username, e);
            return render_login(&state, StatusCode::UNAUTHORIZED, Some(INVALID_CREDENTIALS)).await;
        }
    }

    if student.submitted {
        tracing::info!("Login rejected for {}: already submitted", username);
        return render_login(&state, StatusCode::FORBIDDEN, Some(ALREADY_SUBMITTED)).await;
    }

    if student.violations > state.config.max_violations {
        tracing::info!("Login rejected for {}: {} violations", username, student.violations);
        return render_login(&state, StatusCode::FORBIDDEN, Some(BLOCKED)).await;
    }

    let session = state.sessions.create(&student).await;
    tracing::info!("{} logged in (department {})", student.username, student.department);

    (
        [(header::SET_COOKIE, session_cookie(session.id, state.config.secure_cookies))],
        Redirect::to("/instructions"),
    )
        .into_response()
}

/// Ends the session and returns to the login page.
pub async fn logout(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    if let Some(session) = session {
        state.sessions.remove(session.id).await;
        tracing::info!("{} logged out", session.username);
    }
    logout_redirect(state.config.secure_cookies)
}
