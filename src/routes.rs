// src/routes.rs

use axum::{
    Router, http::Method,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, stats, transfer},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (attempts, stats, transfer).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (record store + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:5173".parse().unwrap(),
        "http://127.0.0.1:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let attempt_routes = Router::new()
        .route(
            "/",
            get(attempts::list_attempts).post(attempts::create_attempt),
        )
        .route(
            "/{id}",
            put(attempts::update_attempt).delete(attempts::delete_attempt),
        );

    let stats_routes = Router::new().route("/", get(stats::get_stats));

    let transfer_routes = Router::new()
        .route("/export/json", get(transfer::export_json))
        .route("/export/csv", get(transfer::export_csv))
        .route("/import", post(transfer::import_attempts));

    Router::new()
        .nest("/api/attempts", attempt_routes)
        .nest("/api/stats", stats_routes)
        .nest("/api", transfer_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
