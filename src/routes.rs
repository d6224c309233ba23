// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{session, survey},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Public survey routes (fetch, start, intent classification).
/// * Session routes keyed by response id; every call carries the participant token.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.cors_origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route(
            "/{response_id}",
            get(session::get_session).post(session::handle_action),
        )
        .route("/{response_id}/submit", post(session::submit_survey))
        .route("/{response_id}/message", post(session::handle_message));

    let survey_routes = Router::new()
        .route("/intent", post(survey::classify_intent))
        .route("/{unique_id}", get(survey::get_survey))
        .route("/{unique_id}/start", post(survey::start_session))
        .nest("/response", session_routes);

    Router::new()
        .nest("/api/survey", survey_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; anything else is an explicit list.
fn allowed_origins(configured: &[String]) -> AllowOrigin {
    if configured.iter().any(|origin| origin == "*") {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    AllowOrigin::list(origins)
}
