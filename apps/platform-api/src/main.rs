//! Lattice platform API server.
//!
//! Wires the shared substrate (Postgres pool, Redis cache), the auth engine,
//! and the webhook/email delivery workers into one process, then serves the
//! routers until shutdown.

mod config;
mod health;
mod logging;
mod routes;
mod state;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use config::Config;
use health::health_handler;
use state::AppState;

use lattice_api_auth::{
    auth_router, ApiKeyService, AuthService, AuthState, MfaService, MockOAuthProvider,
    MockOtpMailer, OAuthService, OtpService, TokenConfig, TokenService,
};
use lattice_cache::CacheClient;
use lattice_db::{run_migrations, DbPool, DbPoolOptions};
use lattice_email::{EmailQueueService, EmailWorker, MockTransport};
use lattice_webhooks::{DeliveryDispatcher, WebhookService, WebhookWorker};

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        env = %config.app_env,
        "Starting lattice platform API"
    );

    match &config.tls {
        Some(tls) => {
            info!(
                cert = %tls.cert_path,
                root = %tls.root_path,
                "Transport certificate material configured; clients must present \
                 certificates signed by the trusted authority"
            );
        }
        None => {
            // Permitted only as a startup fallback; make it impossible to miss.
            warn!(
                target: "security",
                "TRANSPORT SECURITY DISABLED: no certificate material configured, \
                 serving plaintext. Do not run this way in production."
            );
            if config.app_env.is_production() {
                eprintln!("Error: refusing to start without transport certificates in production");
                std::process::exit(1);
            }
        }
    }

    // Shared substrate
    info!("Connecting to PostgreSQL...");
    let db = match DbPool::connect_with_options(&config.database_url, DbPoolOptions::default())
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error: database connection failed: {e}");
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(e) = run_migrations(&db).await {
            eprintln!("Error: migration failed: {e}");
            std::process::exit(1);
        }
    }

    info!("Connecting to Redis...");
    let cache = match CacheClient::connect(&config.redis_url).await {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("Error: cache connection failed: {e}");
            std::process::exit(1);
        }
    };

    // Auth engine
    let token_service = TokenService::new(
        TokenConfig {
            private_key_pem: config.jwt_private_key.clone(),
            public_key_pem: config.jwt_public_key.clone(),
            issuer: config.jwt_issuer.clone(),
        },
        cache.clone(),
    );
    let auth_service = AuthService::new(db.inner().clone(), token_service.clone());
    let auth_state = AuthState {
        auth: auth_service.clone(),
        tokens: token_service.clone(),
        api_keys: ApiKeyService::new(db.inner().clone()),
        mfa: MfaService::new(db.inner().clone(), config.jwt_issuer.clone()),
        otp: OtpService::new(cache.clone(), Arc::new(MockOtpMailer::new())),
        oauth: OAuthService::new(
            db.inner().clone(),
            cache.clone(),
            auth_service,
            Arc::new(MockOAuthProvider::new()),
            config.default_tenant_id,
        ),
    };

    // Delivery engines
    let webhook_service = WebhookService::new(db.inner().clone(), config.webhook_secret_mode);
    let email_service = EmailQueueService::new(db.inner().clone());

    let shutdown = CancellationToken::new();

    let dispatcher = match DeliveryDispatcher::new(db.inner().clone()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let webhook_worker = WebhookWorker::new(dispatcher, shutdown.clone());
    let webhook_handle = tokio::spawn(webhook_worker.run());

    let email_worker = EmailWorker::new(
        email_service.clone(),
        Arc::new(MockTransport::new()),
        shutdown.clone(),
    );
    let email_handle = tokio::spawn(email_worker.run());

    // HTTP surface
    let app_state = AppState {
        db: db.clone(),
        cache: cache.clone(),
        webhooks: webhook_service,
        email: email_service,
    };

    let platform = routes::platform_router()
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            lattice_api_auth::auth_middleware,
        ))
        .with_state(app_state.clone());

    let app = Router::new()
        .route("/healthz", get(health_handler))
        .with_state(app_state)
        .merge(auth_router(auth_state))
        .merge(platform);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "Platform API listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = serve_result {
        tracing::error!(error = %e, "Server error");
    }

    // Stop the workers and let in-flight batches finish.
    info!("Shutting down workers...");
    shutdown.cancel();
    let _ = webhook_handle.await;
    let _ = email_handle.await;

    db.close().await;
    info!("Shutdown complete");
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
