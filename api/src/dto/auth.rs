use serde::{Deserialize, Serialize};
use ta_core::domain::value_objects::CredentialSource;

/// Query accepted by the trusted login endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrustedLoginQuery {
    /// Where to send the browser once credentials are in place
    pub d: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub source: CredentialSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}
