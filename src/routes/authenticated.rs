use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// API routes for any signed-in user. The `Principal` extractor layered over this
/// router rejects anonymous calls with 401; per-role checks (tenant, landlord)
/// happen inside the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        .route("/api/me", get(handlers::get_me))
        // PATCH /api/profile
        .route("/api/profile", patch(handlers::update_profile))
        // POST /api/change-password
        .route("/api/change-password", post(handlers::change_password))
        // --- Landlord listing management ---
        .route("/api/listings", post(handlers::create_listing))
        .route(
            "/api/listings/{id}",
            patch(handlers::update_listing).delete(handlers::delete_listing),
        )
        // --- Rental requests ---
        // POST /api/requests (tenant)
        .route("/api/requests", post(handlers::create_rental_request))
        // GET /api/requests/tenant (tenant)
        .route("/api/requests/tenant", get(handlers::get_tenant_requests))
        // GET /api/requests/landlord (landlord)
        .route("/api/requests/landlord", get(handlers::get_landlord_requests))
        // PATCH /api/requests/{id}/status (landlord, admin)
        .route(
            "/api/requests/{id}/status",
            patch(handlers::update_request_status),
        )
}
