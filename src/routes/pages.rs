use crate::AppState;
use axum::{
    Router,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse},
    routing::get,
};

/// Navigation pages and their titles. Access to gated ones is decided by the
/// access gate before routing ever reaches these handlers.
const PAGES: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/login", "Login"),
    ("/register", "Register"),
    ("/listings", "Rental Listings"),
    ("/listings/{id}", "Listing Details"),
    ("/blog", "Blog"),
    ("/contact", "Contact"),
    ("/faq", "FAQ"),
    ("/profile", "Profile"),
    ("/payment/my-payments", "My Payments"),
    ("/rental-house-request", "Rental House Request"),
    ("/create-listing", "Create Listing"),
    ("/admin/dashboard", "Admin Dashboard"),
    ("/admin/review-listings", "Review Listings"),
    ("/admin/users", "Manage Users"),
    ("/landlords/dashboard", "Landlord Dashboard"),
    ("/landlords/listings", "My Listings"),
    ("/tenants/dashboard", "Tenant Dashboard"),
    ("/tenants/requests", "My Requests"),
    ("/tenants/create", "New Rental Request"),
];

fn shell(title: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{} | BasaFinder</title></head>\
         <body><main id=\"app\" data-page=\"{}\"></main></body></html>",
        title, title
    ))
}

/// page_routes
///
/// One GET route per page, plus a 404 shell for everything else.
pub fn page_routes() -> Router<AppState> {
    PAGES
        .iter()
        .fold(Router::new(), |router, &(path, title)| {
            router.route(path, get(move || async move { shell(title) }))
        })
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(path = %uri.path(), "no page for path");
    (StatusCode::NOT_FOUND, shell("Page Not Found"))
}
