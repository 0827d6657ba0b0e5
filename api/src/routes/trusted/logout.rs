use actix_web::{web, HttpRequest, HttpResponse};
use log::error;
use ta_core::domain::value_objects::Revocation;

use crate::app::AppState;
use crate::dto::auth::LogoutResponse;
use crate::dto::error::internal_error;

/// Handler for POST {registration_path}/logout
///
/// Drops the trusted credentials held for the client. In cookie mode the
/// token cookie is overwritten with a value that never decodes and expired;
/// in session mode the server-side marker is removed and the session cookie
/// expired.
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "message": "Logged out successfully"
/// }
/// ```
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let session_id = req
        .cookie(&state.cookies.session_cookie)
        .map(|c| c.value().to_string())
        .filter(|id| !id.is_empty());

    let cookie = match state.token_service.revoke(session_id.as_deref()).await {
        Ok(Revocation::ExpireCookie(value)) => state.cookies.revoked_token(value),
        Ok(Revocation::SessionCleared) => state.cookies.revoked_session(),
        Err(e) => {
            error!("Failed to revoke trusted credentials: {}", e);
            return internal_error("Failed to revoke trusted credentials");
        }
    };

    HttpResponse::Ok().cookie(cookie).json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    })
}
