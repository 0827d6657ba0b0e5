use actix_web::{http::StatusCode, HttpResponse};
pub use ta_shared::errors::{error_codes, ErrorResponse};

// Extension trait for ErrorResponse to add actix-web specific methods
pub trait ErrorResponseExt {
    fn to_response(&self, status: StatusCode) -> HttpResponse;
}

impl ErrorResponseExt for ErrorResponse {
    fn to_response(&self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// The response every failed authentication check turns into
pub fn unauthorized() -> HttpResponse {
    ErrorResponse::unauthenticated().to_response(StatusCode::UNAUTHORIZED)
}

pub fn internal_error(message: impl Into<String>) -> HttpResponse {
    ErrorResponse::new(error_codes::INTERNAL_ERROR, message)
        .to_response(StatusCode::INTERNAL_SERVER_ERROR)
}
