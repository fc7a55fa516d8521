use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication
    let public = Router::new()
        .route("/health", get(handlers::system::health_check))
        .route("/metrics", get(handlers::system::metrics));

    // Dashboard API: Bearer token required when API_TOKEN is set
    let protected = Router::new()
        // Users
        .route("/api/user/portfolio", get(handlers::portfolio::get_portfolio))
        .route(
            "/api/user/model",
            get(handlers::user_model::get_user_model).post(handlers::user_model::set_user_model),
        )
        // Models
        .route("/api/models", get(handlers::models::list))
        // Bots (proxied to the backend)
        .route("/api/bots", get(handlers::bots::list).post(handlers::bots::create))
        .route("/api/bots/personalize", post(handlers::bots::personalize))
        .route("/api/bots/:id", get(handlers::bots::detail).delete(handlers::bots::remove))
        // Market data
        .route("/api/crypto", get(handlers::crypto::quotes))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
