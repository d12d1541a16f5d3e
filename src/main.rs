use basa_gateway::{
    AccessPolicy, AppState, BackendState, HttpBackend,
    auth::identity_from_config,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on any single call to the upstream API.
const UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// main
///
/// Loads configuration, initializes logging, builds the route policy and the
/// upstream clients, then serves the gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise verbose defaults for local work.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "basa_gateway=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);

    // 3. Route policy, loaded once and shared read-only.
    let policy = AccessPolicy::load(config.policy_file.as_deref())
        .expect("FATAL: route policy could not be loaded")
        .with_login_path(config.login_path.clone());
    tracing::info!(
        source = config.policy_file.as_deref().unwrap_or("built-in"),
        "Route policy loaded"
    );

    // 4. Upstream clients
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
        .build()
        .expect("FATAL: failed to build HTTP client");

    let identity = identity_from_config(&config, client.clone());
    tracing::info!(
        mode = if config.jwt_secret.is_some() { "jwt" } else { "remote" },
        timeout_ms = config.identity_timeout.as_millis() as u64,
        "Identity resolution configured"
    );
    let backend = Arc::new(HttpBackend::new(client, config.api_base_url.clone())) as BackendState;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        backend,
        identity,
        policy: Arc::new(policy),
        config,
    };

    // 5. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
