use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{
    error::ProxyError,
    models::{ChangePasswordRequest, RequestStatusUpdate, UpdateProfileRequest},
};

/// ApiResponse
///
/// An upstream answer relayed as-is: same status, same JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// BackendApi
///
/// The operations the gateway forwards to the BasaFinder REST API. Tokens are the
/// caller's session token, passed through untouched; `None` sends no credentials.
#[async_trait]
pub trait BackendApi: Send + Sync {
    // --- Auth ---
    async fn register(&self, body: Value) -> Result<ApiResponse, ProxyError>;
    async fn login(&self, body: Value) -> Result<ApiResponse, ProxyError>;

    // --- Listings ---
    // `query` is the raw query string (without `?`) forwarded to the listing index.
    async fn get_listings(&self, query: Option<&str>) -> Result<ApiResponse, ProxyError>;
    async fn get_listing(&self, id: &str) -> Result<ApiResponse, ProxyError>;
    async fn create_listing(
        &self,
        token: Option<&str>,
        body: Value,
    ) -> Result<ApiResponse, ProxyError>;
    async fn update_listing(
        &self,
        token: Option<&str>,
        id: &str,
        body: Value,
    ) -> Result<ApiResponse, ProxyError>;
    async fn delete_listing(
        &self,
        token: Option<&str>,
        id: &str,
    ) -> Result<ApiResponse, ProxyError>;

    // --- Profile ---
    async fn update_profile(
        &self,
        token: Option<&str>,
        body: UpdateProfileRequest,
    ) -> Result<ApiResponse, ProxyError>;
    async fn change_password(
        &self,
        token: Option<&str>,
        body: ChangePasswordRequest,
    ) -> Result<ApiResponse, ProxyError>;

    // --- Rental Requests ---
    async fn get_tenant_requests(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError>;
    async fn get_landlord_requests(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError>;
    async fn get_all_requests(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError>;
    async fn create_rental_request(
        &self,
        token: Option<&str>,
        body: Value,
    ) -> Result<ApiResponse, ProxyError>;
    async fn update_request_status(
        &self,
        token: Option<&str>,
        id: &str,
        body: RequestStatusUpdate,
    ) -> Result<ApiResponse, ProxyError>;

    // --- User Administration ---
    async fn get_users(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError>;
    async fn get_user(&self, token: Option<&str>, id: &str) -> Result<ApiResponse, ProxyError>;
    async fn block_user(&self, token: Option<&str>, id: &str) -> Result<ApiResponse, ProxyError>;
    async fn activate_user(&self, token: Option<&str>, id: &str) -> Result<ApiResponse, ProxyError>;
    async fn get_revenue(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError>;
}

/// BackendState
///
/// Shared handle to the proxy target.
pub type BackendState = Arc<dyn BackendApi>;

/// HttpBackend
///
/// `BackendApi` over HTTP with reqwest. The client carries the request timeout.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, token),
            None => builder,
        }
    }

    async fn dispatch(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse, ProxyError> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                tracing::warn!(%url, error = %e, "upstream body is not JSON");
                ProxyError::InvalidBody
            })?
        };

        tracing::debug!(%url, status = status.as_u16(), "upstream call finished");
        Ok(ApiResponse { status, body })
    }
}

/// path_segment
///
/// Guards ids interpolated into upstream paths against escaping their segment.
fn path_segment(id: &str) -> Result<&str, ProxyError> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '?', '#', '\\']) {
        return Err(ProxyError::InvalidSegment);
    }
    Ok(id)
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn register(&self, body: Value) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::POST, "/auth/register", None).json(&body))
            .await
    }

    async fn login(&self, body: Value) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::POST, "/auth/login", None).json(&body))
            .await
    }

    async fn get_listings(&self, query: Option<&str>) -> Result<ApiResponse, ProxyError> {
        let path = match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("/landlords/listings?{}", query),
            None => "/landlords/listings".to_string(),
        };
        self.dispatch(self.request(Method::GET, &path, None)).await
    }

    async fn get_listing(&self, id: &str) -> Result<ApiResponse, ProxyError> {
        let path = format!("/landlords/listings/{}", path_segment(id)?);
        self.dispatch(self.request(Method::GET, &path, None)).await
    }

    async fn create_listing(
        &self,
        token: Option<&str>,
        body: Value,
    ) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::POST, "/landlords/listings", token).json(&body))
            .await
    }

    async fn update_listing(
        &self,
        token: Option<&str>,
        id: &str,
        body: Value,
    ) -> Result<ApiResponse, ProxyError> {
        let path = format!("/landlords/listings/{}", path_segment(id)?);
        self.dispatch(self.request(Method::PATCH, &path, token).json(&body))
            .await
    }

    async fn delete_listing(
        &self,
        token: Option<&str>,
        id: &str,
    ) -> Result<ApiResponse, ProxyError> {
        let path = format!("/landlords/listings/{}", path_segment(id)?);
        self.dispatch(self.request(Method::DELETE, &path, token)).await
    }

    async fn update_profile(
        &self,
        token: Option<&str>,
        body: UpdateProfileRequest,
    ) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::PATCH, "/update-profile", token).json(&body))
            .await
    }

    async fn change_password(
        &self,
        token: Option<&str>,
        body: ChangePasswordRequest,
    ) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::POST, "/change-password", token).json(&body))
            .await
    }

    async fn get_tenant_requests(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::GET, "/tenants/requests", token))
            .await
    }

    async fn get_landlord_requests(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::GET, "/landlord/requests", token))
            .await
    }

    async fn get_all_requests(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::GET, "/landlords/requests", token))
            .await
    }

    async fn create_rental_request(
        &self,
        token: Option<&str>,
        body: Value,
    ) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::POST, "/tenants/create", token).json(&body))
            .await
    }

    async fn update_request_status(
        &self,
        token: Option<&str>,
        id: &str,
        body: RequestStatusUpdate,
    ) -> Result<ApiResponse, ProxyError> {
        let path = format!("/requests/{}/status", path_segment(id)?);
        self.dispatch(self.request(Method::PATCH, &path, token).json(&body))
            .await
    }

    async fn get_users(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::GET, "/users", token)).await
    }

    async fn get_user(&self, token: Option<&str>, id: &str) -> Result<ApiResponse, ProxyError> {
        let path = format!("/users/{}", path_segment(id)?);
        self.dispatch(self.request(Method::GET, &path, token)).await
    }

    async fn block_user(&self, token: Option<&str>, id: &str) -> Result<ApiResponse, ProxyError> {
        let path = format!("/users/{}", path_segment(id)?);
        self.dispatch(self.request(Method::PUT, &path, token)).await
    }

    async fn activate_user(
        &self,
        token: Option<&str>,
        id: &str,
    ) -> Result<ApiResponse, ProxyError> {
        let path = format!("/users/{}", path_segment(id)?);
        self.dispatch(self.request(Method::PATCH, &path, token)).await
    }

    async fn get_revenue(&self, token: Option<&str>) -> Result<ApiResponse, ProxyError> {
        self.dispatch(self.request(Method::GET, "/payment/revenue", token))
            .await
    }
}
