use std::{env, time::Duration};

/// AppConfig
///
/// Holds the gateway's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers and the access gate pull it out of the shared
/// state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the developer identity bypass and log format.
    pub env: Env,
    // Base URL of the external BasaFinder REST API (no trailing slash).
    pub api_base_url: String,
    // Shared secret for local JWT verification. When absent, identities are
    // resolved by asking the external API instead.
    pub jwt_secret: Option<String>,
    // Upper bound on a single identity resolution call.
    pub identity_timeout: Duration,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Optional JSON file replacing the built-in route policy.
    pub policy_file: Option<String>,
    // Page unauthenticated visitors are redirected to.
    pub login_path: String,
}

/// Env
///
/// Runtime context. `Local` enables the `x-user-role` developer bypass and pretty logs;
/// `Production` disables the bypass and emits JSON logs.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 3000;

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: LOCAL_API_BASE_URL.to_string(),
            jwt_secret: None,
            identity_timeout: Duration::from_millis(DEFAULT_IDENTITY_TIMEOUT_MS),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            policy_file: None,
            login_path: "/login".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `BASE_API_URL` is missing, and in any environment
    /// when `IDENTITY_TIMEOUT_MS` is not a number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => {
                env::var("BASE_API_URL").expect("FATAL: BASE_API_URL must be set in production.")
            }
            Env::Local => {
                env::var("BASE_API_URL").unwrap_or_else(|_| LOCAL_API_BASE_URL.to_string())
            }
        };

        let identity_timeout = match env::var("IDENTITY_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse()
                    .expect("FATAL: IDENTITY_TIMEOUT_MS must be a whole number of milliseconds."),
            ),
            Err(_) => Duration::from_millis(DEFAULT_IDENTITY_TIMEOUT_MS),
        };

        Self {
            env,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            identity_timeout,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            policy_file: env::var("ROUTE_POLICY_FILE").ok(),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
        }
    }
}
