use actix_web::{http::header::LOCATION, web, HttpRequest, HttpResponse};
use log::{error, info, warn};
use ta_core::domain::value_objects::{IssuedToken, LoginOutcome};

use crate::app::AppState;
use crate::dto::auth::TrustedLoginQuery;
use crate::dto::error::internal_error;
use crate::middleware::{peer_names, OptionalAuth};

/// Handler for GET {registration_path}
///
/// The fronting authenticator has already established who the user is,
/// either as an identity the middleware accepted or through the configured
/// remote-user header. The header is only believed when the peer is on the
/// server-trust safe-host list. This endpoint turns that identity into
/// trusted credentials and sends the browser on to `d`.
///
/// # Query
/// - `d`: destination, defaults to the configured default destination
///
/// # Responses
/// - 302 to the destination, with the token or session cookie set
/// - 302 to the no-user location when the asserted user has no account
/// - 302 to the destination without credentials when nobody was asserted
/// - 500 when credentials could not be issued
pub async fn trusted_login(
    req: HttpRequest,
    auth: OptionalAuth,
    query: web::Query<TrustedLoginQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let destination = query
        .d
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(state.login.default_destination.as_str());

    let user_id = auth
        .0
        .map(|a| a.user_id)
        .or_else(|| asserted_remote_user(&req, &state));

    let Some(user_id) = user_id else {
        info!("Trusted login without an asserted user, nothing issued");
        return redirect(destination);
    };

    match state.token_service.login(&user_id).await {
        Ok(LoginOutcome::UnknownUser) => redirect(&no_user_location(
            &state.login.no_user_redirect_format,
            destination,
        )),
        Ok(LoginOutcome::Issued(issued)) => {
            let cookie = match issued {
                IssuedToken::Cookie(token) => state.cookies.token(token),
                IssuedToken::Session(session_id) => state.cookies.session(session_id),
            };
            HttpResponse::Found()
                .insert_header((LOCATION, sanitize_location(destination)))
                .cookie(cookie)
                .finish()
        }
        Err(e) => {
            error!("Failed to issue trusted credentials for {}: {}", user_id, e);
            internal_error("Failed to issue trusted credentials")
        }
    }
}

/// The remote-user header, if a fronting authenticator may have set it
fn asserted_remote_user(req: &HttpRequest, state: &AppState) -> Option<String> {
    let header = state.login.remote_user_header.trim();
    if header.is_empty() {
        return None;
    }
    let user_id = remote_user(req, header)?;

    let peer = peer_names(req.peer_addr());
    if !state.token_service.server_trust().is_safe_host(&peer) {
        warn!(
            "Ignoring {} header for {} from untrusted peer {:?}",
            header, user_id, peer
        );
        return None;
    }
    Some(user_id)
}

fn remote_user(req: &HttpRequest, header: &str) -> Option<String> {
    req.headers()
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, sanitize_location(location)))
        .finish()
}

/// Strip line breaks so a destination can never split the response headers
fn sanitize_location(location: &str) -> String {
    location.replace(['\r', '\n'], " ")
}

/// Fill `{0}` in the no-user format with the form-encoded destination
fn no_user_location(format: &str, destination: &str) -> String {
    format.replace("{0}", &form_encode(destination))
}

/// `application/x-www-form-urlencoded` encoding of a single value
fn form_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'*' | b'_' => {
                encoded.push(byte as char)
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
