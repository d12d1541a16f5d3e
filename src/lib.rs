use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Route access gate: roles, principals, the policy table and its decisions.
pub mod access;
// Session token extraction and identity resolution.
pub mod auth;
// Forwarding client for the external BasaFinder API.
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listings;
pub mod models;

// Module for routing segregation (Public, Authenticated, Admin, Pages).
pub mod routes;
use access::Principal;
use routes::{admin, authenticated, pages, public};

// --- Public Re-exports ---

pub use access::{AccessDecision, AccessPolicy, Role};
pub use auth::{IdentityService, IdentityState};
pub use backend::{BackendApi, BackendState, HttpBackend};
pub use config::AppConfig;

/// ApiDoc
///
/// OpenAPI document for the proxy API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::logout, handlers::get_me,
        handlers::get_listings, handlers::search_listings, handlers::get_listing,
        handlers::create_listing, handlers::update_listing, handlers::delete_listing,
        handlers::update_profile, handlers::change_password,
        handlers::get_tenant_requests, handlers::get_landlord_requests,
        handlers::create_rental_request, handlers::update_request_status,
        handlers::get_users, handlers::get_user, handlers::block_user,
        handlers::activate_user, handlers::get_all_requests, handlers::get_revenue
    ),
    components(
        schemas(
            models::Listing, models::ListingPage, models::ApiEnvelope, models::LoginRequest,
            models::UpdateProfileRequest, models::ChangePasswordRequest,
            models::RequestStatusUpdate, access::Principal, access::Role,
        )
    ),
    tags(
        (name = "basa-gateway", description = "BasaFinder gateway API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable per-process state. The route policy is loaded once at startup
/// and read concurrently by every gate evaluation.
#[derive(Clone)]
pub struct AppState {
    /// Proxy target for API calls.
    pub backend: BackendState,
    /// Session token → principal resolution.
    pub identity: IdentityState,
    /// Route policy table and gated path set.
    pub policy: Arc<AccessPolicy>,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for Arc<AccessPolicy> {
    fn from_ref(app_state: &AppState) -> Arc<AccessPolicy> {
        app_state.policy.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated API router: extracting `Principal` rejects anonymous
/// callers with 401 before any handler runs. The resolved principal is stored in
/// the request extensions so handler extractors reuse it for this request.
async fn auth_middleware(principal: Principal, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// access_gate
///
/// Route Access Gate for page navigation. Ungated paths pass straight through
/// without touching the identity service. Gated paths resolve the principal (fail
/// closed) and either continue, redirect to login with `redirectPath`, or redirect home.
async fn access_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !state.policy.is_gated(&path) {
        return next.run(request).await;
    }

    let headers = request.headers().clone();
    let principal = auth::resolve_principal(&headers, &state).await;
    let decision = state.policy.decide(&path, principal.as_ref());

    tracing::debug!(
        %path,
        role = principal.as_ref().and_then(|p| p.role).map_or("none", |r| r.as_str()),
        ?decision,
        "access gate decision"
    );

    match state.policy.redirect_location(&decision) {
        None => next.run(request).await,
        Some(location) => Redirect::temporary(&location).into_response(),
    }
}

/// create_router
///
/// Assembles the routing structure, scoped middleware, the access gate and the
/// observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest("/api/admin", admin::admin_routes())
        .merge(pages::page_routes())
        // The gate wraps every route and the page fallback; it only acts on gated paths.
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, URI and the `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
