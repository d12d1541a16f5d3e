use crate::{
    AppState,
    access::{Principal, Role},
    auth::{SESSION_COOKIE, SessionToken},
    backend::ApiResponse,
    config::Env,
    error::ProxyError,
    listings::{self, ListingQuery},
    models::{
        ApiEnvelope, ChangePasswordRequest, Listing, ListingPage, LoginRequest,
        RequestStatusUpdate, UpdateProfileRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Rejects the call unless the principal holds one of `roles`.
fn require_role(principal: &Principal, roles: &[Role]) -> Result<(), ProxyError> {
    if principal.has_any_role(roles) {
        Ok(())
    } else {
        tracing::debug!(id = %principal.id, role = ?principal.role, "role check failed");
        Err(ProxyError::Forbidden)
    }
}

fn session_cookie(value: &str, env: &Env, max_age: Option<u32>) -> Option<HeaderValue> {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, value);
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if *env == Env::Production {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

// --- Auth ---

/// register
///
/// [Public Route] Forwards a registration form to the API unchanged.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = serde_json::Value,
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse, ProxyError> {
    state.backend.register(payload).await
}

/// login
///
/// [Public Route] Forwards credentials and, when the API issues an access token,
/// stores it in the `accessToken` session cookie used by the access gate.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses((status = 200, description = "Logged in; session cookie set", body = ApiEnvelope))
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ProxyError> {
    let body = serde_json::to_value(&payload).map_err(|_| ProxyError::InvalidBody)?;
    let upstream = state.backend.login(body).await?;

    let token = upstream
        .body
        .pointer("/data/accessToken")
        .and_then(Value::as_str)
        .filter(|_| upstream.status.is_success())
        .map(str::to_string);

    let mut response = upstream.into_response();
    if let Some(cookie) = token.and_then(|t| session_cookie(&t, &state.config.env, None)) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// logout
///
/// [Public Route] Expires the session cookie. Nothing is sent upstream.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cookie cleared", body = ApiEnvelope))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = Json(serde_json::json!({ "success": true, "message": "Logged out" }))
        .into_response();
    if let Some(cookie) = session_cookie("", &state.config.env, Some(0)) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// get_me
///
/// [Authenticated Route] Returns the principal the gateway resolved for this caller.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Resolved principal", body = Principal),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_me(principal: Principal) -> Json<Principal> {
    Json(principal)
}

// --- Listings ---

/// get_listings
///
/// [Public Route] Lists listings. The query string is forwarded verbatim.
#[utoipa::path(
    get,
    path = "/api/listings",
    responses((status = 200, description = "Listings", body = ApiEnvelope))
)]
pub async fn get_listings(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse, ProxyError> {
    state.backend.get_listings(query.as_deref()).await
}

/// search_listings
///
/// [Public Route] Fetches the full catalogue and filters/paginates it in the gateway.
/// A non-success upstream answer is relayed unchanged.
#[utoipa::path(
    get,
    path = "/api/listings/search",
    params(ListingQuery),
    responses(
        (status = 200, description = "One page of matching listings", body = ListingPage),
        (status = 502, description = "Upstream unreachable or malformed")
    )
)]
pub async fn search_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, ProxyError> {
    let upstream = state.backend.get_listings(None).await?;
    if !upstream.status.is_success() {
        return Ok(upstream.into_response());
    }

    let data = upstream.body.get("data").cloned().unwrap_or(Value::Null);
    let catalogue: Vec<Listing> = serde_json::from_value(data).map_err(|e| {
        tracing::warn!(error = %e, "listing catalogue did not match the expected shape");
        ProxyError::InvalidBody
    })?;

    Ok(Json(listings::search(&catalogue, &query)).into_response())
}

/// get_listing
///
/// [Public Route] Retrieves a single listing.
#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses((status = 200, description = "Listing", body = ApiEnvelope))
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ProxyError> {
    state.backend.get_listing(&id).await
}

/// create_listing
///
/// [Authenticated Route] Landlords (and admins) publish a listing.
#[utoipa::path(
    post,
    path = "/api/listings",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Upstream answer", body = ApiEnvelope),
        (status = 403, description = "Not a landlord or admin")
    )
)]
pub async fn create_listing(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Landlord, Role::Admin])?;
    state.backend.create_listing(token.as_deref(), payload).await
}

/// update_listing
///
/// [Authenticated Route] Ownership is enforced by the API; the gateway checks the role.
#[utoipa::path(
    patch,
    path = "/api/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    request_body = serde_json::Value,
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn update_listing(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Landlord, Role::Admin])?;
    state.backend.update_listing(token.as_deref(), &id, payload).await
}

/// delete_listing
#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn delete_listing(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Landlord, Role::Admin])?;
    state.backend.delete_listing(token.as_deref(), &id).await
}

// --- Profile ---

/// update_profile
///
/// [Authenticated Route] Any signed-in user edits their own profile.
#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn update_profile(
    _principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<ApiResponse, ProxyError> {
    state.backend.update_profile(token.as_deref(), payload).await
}

/// change_password
#[utoipa::path(
    post,
    path = "/api/change-password",
    request_body = ChangePasswordRequest,
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn change_password(
    _principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse, ProxyError> {
    state.backend.change_password(token.as_deref(), payload).await
}

// --- Rental Requests ---

/// get_tenant_requests
///
/// [Authenticated Route] The tenant's own rental requests.
#[utoipa::path(
    get,
    path = "/api/requests/tenant",
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn get_tenant_requests(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Tenant])?;
    state.backend.get_tenant_requests(token.as_deref()).await
}

/// get_landlord_requests
///
/// [Authenticated Route] Requests made against the landlord's listings.
#[utoipa::path(
    get,
    path = "/api/requests/landlord",
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn get_landlord_requests(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Landlord])?;
    state.backend.get_landlord_requests(token.as_deref()).await
}

/// create_rental_request
///
/// [Authenticated Route] Tenants ask to rent a listing. The body is forwarded as-is.
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Upstream answer", body = ApiEnvelope),
        (status = 403, description = "Not a tenant")
    )
)]
pub async fn create_rental_request(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Tenant])?;
    state
        .backend
        .create_rental_request(token.as_deref(), payload)
        .await
}

/// update_request_status
///
/// [Authenticated Route] Landlords and admins approve or reject a request.
#[utoipa::path(
    patch,
    path = "/api/requests/{id}/status",
    params(("id" = String, Path, description = "Rental request id")),
    request_body = RequestStatusUpdate,
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn update_request_status(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RequestStatusUpdate>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Landlord, Role::Admin])?;
    state
        .backend
        .update_request_status(token.as_deref(), &id, payload)
        .await
}

// --- Admin ---

/// get_users
///
/// [Admin Route] Every registered user.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "Upstream answer", body = ApiEnvelope),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_users(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Admin])?;
    state.backend.get_users(token.as_deref()).await
}

/// get_user
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn get_user(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Admin])?;
    state.backend.get_user(token.as_deref(), &id).await
}

/// block_user
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/block",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn block_user(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Admin])?;
    state.backend.block_user(token.as_deref(), &id).await
}

/// activate_user
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/activate",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn activate_user(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Admin])?;
    state.backend.activate_user(token.as_deref(), &id).await
}

/// get_all_requests
///
/// [Admin Route] Every rental request on the platform.
#[utoipa::path(
    get,
    path = "/api/admin/requests",
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn get_all_requests(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Admin])?;
    state.backend.get_all_requests(token.as_deref()).await
}

/// get_revenue
///
/// [Admin Route] Payment totals for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/revenue",
    responses((status = 200, description = "Upstream answer", body = ApiEnvelope))
)]
pub async fn get_revenue(
    principal: Principal,
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
) -> Result<ApiResponse, ProxyError> {
    require_role(&principal, &[Role::Admin])?;
    state.backend.get_revenue(token.as_deref()).await
}
