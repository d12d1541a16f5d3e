use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, put},
};

/// Admin Router Module
///
/// Moderation and oversight endpoints, nested under `/api/admin`. Every handler
/// resolves the `Principal` itself and refuses non-admins with 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/users
        .route("/users", get(handlers::get_users))
        // GET /api/admin/users/{id}
        .route("/users/{id}", get(handlers::get_user))
        // PUT /api/admin/users/{id}/block
        .route("/users/{id}/block", put(handlers::block_user))
        // PATCH /api/admin/users/{id}/activate
        .route("/users/{id}/activate", patch(handlers::activate_user))
        // GET /api/admin/requests
        .route("/requests", get(handlers::get_all_requests))
        // GET /api/admin/revenue
        .route("/revenue", get(handlers::get_revenue))
}
