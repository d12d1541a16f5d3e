use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    access::Principal,
    config::{AppConfig, Env},
    error::IdentityError,
};

/// Name of the cookie carrying the session token between navigations.
pub const SESSION_COOKIE: &str = "accessToken";

/// Developer bypass headers, honoured only in `Env::Local`.
const DEV_ROLE_HEADER: &str = "x-user-role";
const DEV_ID_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of the access tokens issued by the BasaFinder API.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id on the upstream API.
    #[serde(rename = "userId", alias = "sub")]
    pub user_id: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// IdentityService
///
/// Exchanges a session token for the principal behind it. One attempt per call;
/// callers bound it with a timeout and treat every error as "no principal".
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Principal, IdentityError>;
}

/// IdentityState
///
/// Shared handle to whichever identity service the gateway was configured with.
pub type IdentityState = Arc<dyn IdentityService>;

/// JwtIdentityService
///
/// Verifies HS256 access tokens locally with the secret shared with the API.
pub struct JwtIdentityService {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityService for JwtIdentityService {
    async fn resolve(&self, token: &str) -> Result<Principal, IdentityError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(Principal::new(data.claims.user_id, &data.claims.role))
    }
}

#[derive(Deserialize)]
struct IdentityEnvelope {
    data: Option<IdentityRecord>,
}

#[derive(Deserialize)]
struct IdentityRecord {
    #[serde(alias = "_id")]
    id: String,
    role: String,
}

/// RemoteIdentityService
///
/// Asks the API who owns the token (`GET /auth/me`). The token is sent raw in
/// `Authorization`, the way the API expects it.
pub struct RemoteIdentityService {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteIdentityService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityService for RemoteIdentityService {
    async fn resolve(&self, token: &str) -> Result<Principal, IdentityError> {
        let response = self
            .client
            .get(format!("{}/auth/me", self.base_url))
            .header(header::AUTHORIZATION, token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Rejected(status));
        }

        let record = response
            .json::<IdentityEnvelope>()
            .await?
            .data
            .ok_or(IdentityError::Missing)?;

        Ok(Principal::new(record.id, &record.role))
    }
}

/// Builds the identity service selected by the configuration: local JWT verification
/// when a secret is configured, otherwise the remote lookup.
pub fn identity_from_config(config: &AppConfig, client: reqwest::Client) -> IdentityState {
    match &config.jwt_secret {
        Some(secret) => Arc::new(JwtIdentityService::new(secret)),
        None => Arc::new(RemoteIdentityService::new(client, config.api_base_url.clone())),
    }
}

/// session_token
///
/// Pulls the session token from the `accessToken` cookie, falling back to the
/// `Authorization` header (with or without a `Bearer ` prefix).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

fn dev_bypass(headers: &HeaderMap) -> Option<Principal> {
    let role = headers.get(DEV_ROLE_HEADER)?.to_str().ok()?;
    let id = headers
        .get(DEV_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("local-dev");
    Some(Principal::new(id, role))
}

/// resolve_principal
///
/// Resolves the caller's principal from request headers. Absent token means no
/// identity call at all; failures and timeouts collapse to `None` (fail closed).
pub async fn resolve_principal<S>(headers: &HeaderMap, state: &S) -> Option<Principal>
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let config = AppConfig::from_ref(state);

    if config.env == Env::Local {
        if let Some(principal) = dev_bypass(headers) {
            tracing::debug!(id = %principal.id, "principal taken from developer bypass header");
            return Some(principal);
        }
    }

    let token = session_token(headers)?;
    let identity = IdentityState::from_ref(state);

    match tokio::time::timeout(config.identity_timeout, identity.resolve(&token)).await {
        Ok(Ok(principal)) => Some(principal),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "identity resolution failed; treating caller as anonymous");
            None
        }
        Err(_) => {
            tracing::warn!(error = %IdentityError::TimedOut, "treating caller as anonymous");
            None
        }
    }
}

/// Principal Extractor
///
/// Makes `Principal` usable as a handler argument on API routes. A principal already
/// resolved earlier in the same request is reused. Rejects with 401 when no principal
/// resolves; role checks stay inside the handlers.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }
        resolve_principal(&parts.headers, state)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// SessionToken
///
/// The raw session token, if any, for forwarding to the API. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(session_token(&parts.headers)))
    }
}
