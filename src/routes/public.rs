use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: monitoring, the auth flow that creates a
/// session, and read-only listing access.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/register
        .route("/api/auth/register", post(handlers::register))
        // POST /api/auth/login
        // Sets the `accessToken` cookie the access gate reads on later navigations.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        .route("/api/auth/logout", post(handlers::logout))
        // GET /api/listings?<anything>
        .route("/api/listings", get(handlers::get_listings))
        // GET /api/listings/search?location=&minPrice=&maxPrice=&bedrooms=&page=&perPage=
        .route("/api/listings/search", get(handlers::search_listings))
        // GET /api/listings/{id}
        .route("/api/listings/{id}", get(handlers::get_listing))
}
