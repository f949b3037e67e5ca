// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exam, integrity},
    state::AppState,
    utils::session::{load_session, violation_guard},
};

/// Assembles the main application router.
///
/// * Login and violation endpoints stay reachable for blocked students.
/// * Every other page passes the violation guard first.
/// * Applies global middleware (Trace, no-cache headers, session loading).
pub fn create_router(state: AppState) -> Router {
    let open_routes = Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/violation", post(integrity::violation))
        .route("/violation-beacon", post(integrity::violation_beacon));

    let guarded_routes = Router::new()
        .route("/instructions", get(exam::instructions))
        .route("/exam", get(exam::exam_page).post(exam::submit_exam))
        .route("/logout", get(auth::logout))
        .route("/heartbeat", post(integrity::heartbeat))
        .route_layer(middleware::from_fn_with_state(state.clone(), violation_guard));

    let no_cache = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ));

    Router::new()
        .merge(open_routes)
        .merge(guarded_routes)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        // Global Middleware (applied from outside in)
        .layer(no_cache)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
