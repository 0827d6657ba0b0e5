//! Application state and factory
//!
//! This module wires the key ring, the collaborator stores and the token
//! service together, and provides the factory for the Actix-web application.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, HttpResponse,
};
use log::info;

use ta_core::{
    errors::DomainResult,
    repositories::{
        AcceptAllAccounts, ClusterKeyStore, InMemoryClusterKeyStore, InMemorySessionStore,
        SessionStore,
    },
    services::{
        clock::{Clock, SystemClock},
        token::{KeyRing, TokenService, TokenServiceConfig},
    },
};
use ta_infra::cache::{RedisClient, RedisClusterKeyStore, RedisSessionStore};
use ta_shared::config::{AppConfig, AuthConfig, CacheType, TrustedLoginConfig};

use crate::config::CookieSettings;
use crate::middleware::TrustedAuth;
use crate::routes;

/// State shared by every worker
pub struct AppState {
    pub token_service: Arc<TokenService>,
    pub cookies: CookieSettings,
    pub login: TrustedLoginConfig,
}

impl AppState {
    pub fn new(token_service: Arc<TokenService>, auth: &AuthConfig) -> Self {
        Self {
            token_service,
            cookies: CookieSettings::from_auth(auth),
            login: auth.login.clone(),
        }
    }
}

/// Build the token service and its collaborators from configuration
///
/// The key ring is loaded (and rotated if due) before this returns, so the
/// first request never pays for it.
pub async fn build_state(config: &AppConfig) -> DomainResult<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (cluster, sessions): (Arc<dyn ClusterKeyStore>, Arc<dyn SessionStore>) =
        match config.cache.cache_type {
            CacheType::Redis => {
                let client = RedisClient::new(config.cache.redis.clone()).await?;
                (
                    Arc::new(RedisClusterKeyStore::new(client.clone(), clock.clone())),
                    Arc::new(RedisSessionStore::new(client)),
                )
            }
            CacheType::Memory => {
                info!("Using process-local key and session stores; tokens will not validate on other nodes");
                (
                    Arc::new(InMemoryClusterKeyStore::new()),
                    Arc::new(InMemorySessionStore::new()),
                )
            }
        };

    let key_ring = Arc::new(KeyRing::new(&config.auth.token, cluster, clock.clone())?);
    key_ring.initialize().await?;

    let token_service = TokenService::new(
        TokenServiceConfig::from(&config.auth),
        key_ring,
        sessions,
        Arc::new(AcceptAllAccounts::new()),
        clock,
    )?;

    Ok(AppState::new(Arc::new(token_service), &config.auth))
}

/// Create and configure the application
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let trusted_auth = TrustedAuth::new(state.token_service.clone(), state.cookies.clone());
    let login = state.login.clone();

    App::new()
        .app_data(state)
        // Logger is outermost
        .wrap(trusted_auth)
        .wrap(Logger::default())
        .route("/health", web::get().to(health_check))
        .configure(|cfg| routes::configure(cfg, &login))
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "trusted-auth-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "not_found",
        "message": "The requested resource was not found"
    }))
}
