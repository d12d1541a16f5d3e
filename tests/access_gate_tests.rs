use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use basa_gateway::{
    AccessDecision, AccessPolicy, AppConfig, AppState, HttpBackend, IdentityService,
    access::Principal, create_router, error::IdentityError,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tower::ServiceExt;

// --- Stub Identity Services ---

/// Knows a fixed set of tokens and counts how often it is asked.
#[derive(Default)]
struct StaticIdentity {
    known: HashMap<String, Principal>,
    calls: AtomicUsize,
}

impl StaticIdentity {
    fn with_roles() -> Self {
        let mut known = HashMap::new();
        for role in ["tenant", "landlord", "admin", "superuser"] {
            known.insert(format!("tok-{}", role), Principal::new(format!("{}-1", role), role));
        }
        Self {
            known,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn resolve(&self, token: &str) -> Result<Principal, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.known.get(token).cloned().ok_or(IdentityError::Missing)
    }
}

/// Never answers in time.
struct StalledIdentity;

#[async_trait]
impl IdentityService for StalledIdentity {
    async fn resolve(&self, _token: &str) -> Result<Principal, IdentityError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Principal::new("late", "admin"))
    }
}

// --- Helpers ---

fn app_state(identity: Arc<dyn IdentityService>) -> AppState {
    let mut config = AppConfig::default();
    config.identity_timeout = Duration::from_millis(50);
    AppState {
        // Page navigation never reaches the upstream API.
        backend: Arc::new(HttpBackend::new(reqwest::Client::new(), "http://127.0.0.1:9")),
        identity,
        policy: Arc::new(AccessPolicy::default()),
        config,
    }
}

async fn navigate(state: AppState, path: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("accessToken={}", token));
    }
    create_router(state)
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// --- Gate Decisions (pure) ---

#[test]
fn anonymous_gated_paths_redirect_to_login_except_entry_pages() {
    let policy = AccessPolicy::default();
    for path in ["/admin", "/admin/users", "/tenants/dashboard", "/landlords", "/create-listing"] {
        assert_eq!(
            policy.decide(path, None),
            AccessDecision::RedirectToLogin {
                redirect_path: path.to_string()
            }
        );
    }
    assert_eq!(policy.decide("/login", None), AccessDecision::Allow);
    assert_eq!(policy.decide("/register", None), AccessDecision::Allow);
}

#[test]
fn each_role_reaches_only_its_own_area() {
    let policy = AccessPolicy::default();
    let cases = [
        ("tenant", "/tenants/dashboard", true),
        ("tenant", "/landlords/listings", false),
        ("tenant", "/admin/dashboard", false),
        ("landlord", "/landlords/listings", true),
        ("landlord", "/create-listing", true),
        ("landlord", "/tenants/requests", false),
        ("admin", "/admin/dashboard", true),
        ("admin", "/admin", true),
        ("admin", "/landlords/dashboard", false),
    ];
    for (role, path, allowed) in cases {
        let principal = Principal::new("u-1", role);
        let expected = if allowed {
            AccessDecision::Allow
        } else {
            AccessDecision::RedirectToHome
        };
        assert_eq!(policy.decide(path, Some(&principal)), expected, "{} -> {}", role, path);
    }
}

#[test]
fn decisions_are_idempotent() {
    let policy = AccessPolicy::default();
    let landlord = Principal::new("l-1", "landlord");
    for path in ["/landlords/listings", "/admin/users", "/login"] {
        assert_eq!(
            policy.decide(path, Some(&landlord)),
            policy.decide(path, Some(&landlord))
        );
        assert_eq!(policy.decide(path, None), policy.decide(path, None));
    }
}

// --- Gate Behaviour Through The Router ---

#[tokio::test]
async fn anonymous_admin_page_redirects_to_login_with_return_path() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/admin/users", None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectPath=/admin/users");
}

#[tokio::test]
async fn tenant_reaches_tenant_dashboard() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/tenants/dashboard", Some("tok-tenant")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tenant_is_sent_home_from_admin_dashboard() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/admin/dashboard", Some("tok-tenant")).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn login_page_is_reachable_without_a_session() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn landlord_listings_page_depends_on_role() {
    let identity = Arc::new(StaticIdentity::with_roles());

    let response = navigate(
        app_state(identity.clone()),
        "/landlords/listings",
        Some("tok-landlord"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = navigate(app_state(identity), "/landlords/listings", Some("tok-tenant")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn unknown_role_is_sent_home() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/admin/dashboard", Some("tok-superuser")).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn unrecognised_token_fails_closed() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/tenants/requests", Some("forged")).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectPath=/tenants/requests");
}

#[tokio::test]
async fn stalled_identity_service_fails_closed() {
    let state = app_state(Arc::new(StalledIdentity));
    let response = navigate(state, "/admin/dashboard", Some("tok-admin")).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectPath=/admin/dashboard");
}

#[tokio::test]
async fn ungated_paths_never_consult_identity() {
    let identity = Arc::new(StaticIdentity::with_roles());
    for path in ["/", "/listings", "/faq", "/profile"] {
        let response = navigate(app_state(identity.clone()), path, Some("tok-tenant")).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
    }
    assert_eq!(identity.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn anonymous_gated_lookup_skips_identity_call() {
    let identity = Arc::new(StaticIdentity::with_roles());
    let _ = navigate(app_state(identity.clone()), "/admin/dashboard", None).await;
    assert_eq!(identity.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn gated_path_without_a_page_still_redirects() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/admin/does-not-exist", None).await;
    assert_eq!(location(&response), "/login?redirectPath=/admin/does-not-exist");
}

#[tokio::test]
async fn allowed_but_unknown_page_renders_not_found() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/admin/does-not-exist", Some("tok-admin")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gated_path_with_query_delimiters_keeps_its_return_path() {
    let state = app_state(Arc::new(StaticIdentity::with_roles()));
    let response = navigate(state, "/tenants/a&b+c", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirectPath=/tenants/a%26b%2Bc");
}

// --- Authenticated API ---

#[tokio::test]
async fn authenticated_api_call_resolves_identity_once() {
    let identity = Arc::new(StaticIdentity::with_roles());
    let response = navigate(app_state(identity.clone()), "/api/me", Some("tok-landlord")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let principal: Principal = serde_json::from_slice(&body).unwrap();
    assert_eq!(principal, Principal::new("landlord-1", "landlord"));
    assert_eq!(identity.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn authenticated_api_call_without_session_is_unauthorized() {
    let identity = Arc::new(StaticIdentity::with_roles());
    let response = navigate(app_state(identity.clone()), "/api/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(identity.calls.load(Ordering::SeqCst), 0);
}
