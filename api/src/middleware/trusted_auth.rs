//! Trusted authentication middleware.
//!
//! Every request is run through the token service before it reaches a
//! handler. The middleware gathers what the client presented (server-trust
//! header, peer address, token cookie, session cookie), stores the resulting
//! identity as an [`AuthContext`] in the request extensions and, when the
//! token was close to expiry, sends a reissued token back as a cookie.
//!
//! Requests that carry nothing valid pass through anonymously; handlers that
//! need a user ask for [`AuthContext`] and get a 401 otherwise.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use log::warn;
use std::{
    future::{ready, Ready},
    net::SocketAddr,
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use ta_core::{
    domain::entities::SERVER_TOKEN_HEADER,
    domain::value_objects::{CredentialSource, PresentedCredentials, TrustedUser},
    services::token::TokenService,
};

use crate::config::CookieSettings;
use crate::dto::error::unauthorized;

/// Identity established for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    /// Channel that proved the identity
    pub source: CredentialSource,
}

impl From<TrustedUser> for AuthContext {
    fn from(user: TrustedUser) -> Self {
        Self {
            user_id: user.user_id,
            source: user.source,
        }
    }
}

/// Trusted authentication middleware factory
#[derive(Clone)]
pub struct TrustedAuth {
    token_service: Arc<TokenService>,
    cookies: CookieSettings,
}

impl TrustedAuth {
    pub fn new(token_service: Arc<TokenService>, cookies: CookieSettings) -> Self {
        Self {
            token_service,
            cookies,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TrustedAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TrustedAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedAuthMiddleware {
            service: Rc::new(service),
            token_service: Arc::clone(&self.token_service),
            cookies: self.cookies.clone(),
        }))
    }
}

/// Trusted authentication middleware service
pub struct TrustedAuthMiddleware<S> {
    service: Rc<S>,
    token_service: Arc<TokenService>,
    cookies: CookieSettings,
}

impl<S, B> Service<ServiceRequest> for TrustedAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token_service = Arc::clone(&self.token_service);
        let cookies = self.cookies.clone();

        Box::pin(async move {
            let credentials = extract_credentials(&req, &cookies);
            let authentication = token_service.authenticate(&credentials).await;

            if let Some(user) = authentication.user {
                req.extensions_mut().insert(AuthContext::from(user));
            }

            let mut res = service.call(req).await?;

            // A handler that already set the token cookie (login, logout) wins
            if let Some(token) = authentication.refreshed {
                if !sets_cookie(res.response(), &cookies.token_cookie) {
                    if let Err(e) = res.response_mut().add_cookie(&cookies.token(token)) {
                        warn!("Failed to attach refreshed trusted token: {}", e);
                    }
                }
            }

            Ok(res)
        })
    }
}

/// Collect the credentials a request presents
fn extract_credentials(req: &ServiceRequest, cookies: &CookieSettings) -> PresentedCredentials {
    let mut credentials = PresentedCredentials::new();

    if let Some(header) = req
        .headers()
        .get(SERVER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        credentials = credentials.with_server_token(header);
    }

    for host in peer_names(req.peer_addr()) {
        credentials = credentials.with_remote_host(host);
    }

    // A stale path-scoped cookie may share the name with a valid one
    let secure = req.connection_info().scheme() == "https";
    let token_values: Vec<String> = req
        .cookies()
        .map(|all| {
            all.iter()
                .filter(|c| c.name() == cookies.token_cookie)
                .map(|c| c.value().to_string())
                .collect()
        })
        .unwrap_or_default();
    for value in token_values {
        credentials = credentials.with_cookie(value, secure);
    }

    if let Some(cookie) = req.cookie(&cookies.session_cookie) {
        if !cookie.value().is_empty() {
            credentials = credentials.with_session(cookie.value());
        }
    }

    credentials
}

/// Names a peer is known by; loopback peers are also `localhost`
pub fn peer_names(peer: Option<SocketAddr>) -> Vec<String> {
    let Some(addr) = peer else {
        return Vec::new();
    };
    let ip = addr.ip();
    let mut names = vec![ip.to_string()];
    if ip.is_loopback() {
        names.push("localhost".to_string());
    }
    names
}

fn sets_cookie<B>(response: &HttpResponse<B>, name: &str) -> bool {
    response.cookies().any(|c| c.name() == name)
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                Error::from(InternalError::from_response("Authentication required", unauthorized()))
            });

        ready(result)
    }
}

/// Extractor for optional authentication
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let auth = req.extensions().get::<AuthContext>().cloned();
        ready(Ok(OptionalAuth(auth)))
    }
}
