use actix_web::HttpResponse;

use crate::dto::auth::MeResponse;
use crate::middleware::AuthContext;

/// Handler for GET /api/v1/me
///
/// Returns the identity the trusted authentication middleware established.
///
/// # Errors
/// - 401 Unauthorized: No valid trusted credentials presented
pub async fn me(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        user_id: auth.user_id,
        source: auth.source,
    })
}
