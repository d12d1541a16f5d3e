/// Router Module Index
///
/// Splits the gateway into security-segregated routers. API access control is
/// applied per module; page navigation is guarded by the access gate layered over
/// the whole application in `create_router`.

/// Routes accessible to anyone: health, auth forwarding, read-only listings.
pub mod public;

/// API routes behind the `Principal` extractor middleware.
pub mod authenticated;

/// API routes restricted to the `admin` role, nested under `/api/admin`.
pub mod admin;

/// Navigation pages rendered as HTML shells.
pub mod pages;
