pub mod handlers;
pub mod middleware;
pub mod types;


use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::account::{Argon2Hasher, CredentialHasher, CredentialStore, HashError, OtpIssuer};
use crate::config::{ApiConfig, ConfigError};
use crate::notify::{ConsoleNotifier, MailRelayNotifier, Notifier, NotifyError};
use crate::resume::ResumeStore;
use crate::session::SessionIssuer;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid hashing configuration: {0}")]
    Hashing(#[from] HashError),
    #[error("mail relay setup failed: {0}")]
    Notify(#[from] NotifyError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

/// Shared state handed to every handler. Each store sits behind its own
/// lock; handlers never hold a lock across an `.await`.
#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<Mutex<CredentialStore>>,
    pub resumes: Arc<Mutex<ResumeStore>>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub otp: OtpIssuer,
    pub sessions: Arc<SessionIssuer>,
    pub notifier: Arc<dyn Notifier>,
    pub expose_otp: bool,
}

impl ApiState {
    /// Fresh, empty stores
    pub fn new(
        hasher: Arc<dyn CredentialHasher>,
        otp: OtpIssuer,
        sessions: SessionIssuer,
        notifier: Arc<dyn Notifier>,
        expose_otp: bool,
    ) -> Self {
        Self {
            accounts: Arc::new(Mutex::new(CredentialStore::new())),
            resumes: Arc::new(Mutex::new(ResumeStore::new())),
            hasher,
            otp,
            sessions: Arc::new(sessions),
            notifier,
            expose_otp,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, StartupError> {
        config.validate()?;
        let hashing = &config.hashing;
        let hasher = Argon2Hasher::new(hashing.memory_kib, hashing.iterations, hashing.parallelism)?;

        let notifier: Arc<dyn Notifier> = match &config.mail.relay_url {
            Some(url) => {
                let from = config
                    .mail
                    .from
                    .clone()
                    .unwrap_or_else(|| "no-reply@localhost".to_string());
                info!("✉️ Email relay configured for: {} ({})", config.mail.service, url);
                Arc::new(MailRelayNotifier::new(
                    url,
                    &from,
                    &config.mail.service,
                    Duration::from_secs(config.mail.timeout_secs),
                )?)
            }
            None => {
                info!("✉️ Email relay not configured - OTPs will be logged to console only (dev mode)");
                Arc::new(ConsoleNotifier)
            }
        };

        if config.auth.expose_otp {
            warn!("EXPOSE_OTP is enabled: OTPs are returned in API responses");
        }

        Ok(Self::new(
            Arc::new(hasher),
            OtpIssuer::new(config.auth.otp_ttl_secs),
            SessionIssuer::new(config.auth.jwt_secret.as_bytes(), config.auth.token_ttl_secs),
            notifier,
            config.auth.expose_otp,
        ))
    }
}

pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/api/auth/verify-token", get(handlers::verify_token))
        .route(
            "/api/resumes",
            get(handlers::list_resumes).post(handlers::create_resume),
        )
        .route(
            "/api/resumes/:id",
            put(handlers::update_resume).delete(handlers::delete_resume),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_token));

    Router::new()
        .route("/", get(handlers::health))
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/verify-otp", post(handlers::verify_otp))
        .route("/api/auth/send-otp", post(handlers::send_otp))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    state: ApiState,
    bind_addr: String,
}

impl ApiServer {
    pub fn new(state: ApiState, bind_addr: String) -> Self {
        Self { state, bind_addr }
    }

    pub async fn start(self) -> Result<(), StartupError> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|source| StartupError::Bind {
                addr: self.bind_addr.clone(),
                source,
            })?;

        let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();
        info!("✅ Resume Builder API Server running on {}", self.bind_addr);
        info!("🔗 Health Check: http://localhost:{}/", port);
        for endpoint in handlers::ENDPOINTS {
            info!("   {}", endpoint);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(StartupError::Serve)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
