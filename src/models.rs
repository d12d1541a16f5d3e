use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Upstream Schemas ---

/// Listing
///
/// A rental listing as returned by the BasaFinder API (`/landlords/listings`).
/// Only the fields the gateway filters on are required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub rent_amount: f64,
    pub bedrooms: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
}

/// ApiEnvelope
///
/// The `{ success, message, data }` shape every upstream endpoint answers with.
/// Used for documentation; proxied bodies are forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
}

// --- Request Payloads ---

/// LoginRequest
///
/// Credentials forwarded to `/auth/login`. The password is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateProfileRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone_number: String,
    pub address: String,
}

/// ChangePasswordRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// RequestStatusUpdate
///
/// Landlord/admin decision on a rental request. `landlordPhone` is shared with the
/// tenant when a request is approved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RequestStatusUpdate {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_phone: Option<String>,
}

// --- Gateway Responses ---

/// PageMarker
///
/// One entry of the pagination strip: a page number or a gap, serialized as the
/// number itself or `"..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Page(n) => serializer.serialize_u64(*n as u64),
            PageMarker::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// ListingPage
///
/// One page of filtered listings (GET /api/listings/search).
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    #[ts(type = "Array<number | \"...\">")]
    #[schema(value_type = Vec<Object>)]
    pub page_numbers: Vec<PageMarker>,
}
