//! Authentication configuration: trusted tokens, server trust and sessions

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Default shared secret shipped with the server. Must be replaced before
/// the server-trust channel is exposed to other hosts.
pub const DEFAULT_SHARED_SECRET: &str = "default-setting-change-before-use";

/// Highest ring size the token wire format can address (one decimal digit)
pub const MAX_RING_SIZE: usize = 10;

/// Where an issued trusted token is kept between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// Signed token handed to the client as a cookie
    Cookie,
    /// Marker kept server side, referenced by a session cookie
    Session,
}

impl std::str::FromStr for TokenStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cookie" => Ok(TokenStorage::Cookie),
            "session" => Ok(TokenStorage::Session),
            _ => Err(format!("Invalid token storage: {}", s)),
        }
    }
}

/// Trusted token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrustedTokenConfig {
    /// Cookie or session backed tokens
    #[serde(default = "default_storage")]
    pub storage: TokenStorage,

    /// Only accept token cookies that arrived over a secure channel
    #[serde(default)]
    pub secure_cookie: bool,

    /// Token time to live in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: i64,

    /// Name of the token cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// File the local key ring is persisted to
    #[serde(default = "default_token_file")]
    pub token_file: String,

    /// Number of key slots in the ring
    #[serde(default = "default_ring_size")]
    pub ring_size: usize,

    /// Identifier of this server within the cluster
    #[serde(default = "default_server_id")]
    pub server_id: String,
}

impl Default for TrustedTokenConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            secure_cookie: false,
            ttl_ms: default_ttl_ms(),
            cookie_name: default_cookie_name(),
            token_file: default_token_file(),
            ring_size: default_ring_size(),
            server_id: default_server_id(),
        }
    }
}

impl TrustedTokenConfig {
    /// Create a configuration for a named server
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            ..Default::default()
        }
    }

    /// Set the token TTL in minutes
    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl_ms = minutes * 60_000;
        self
    }

    /// Set the storage mode
    pub fn with_storage(mut self, storage: TokenStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Set the key ring file
    pub fn with_token_file(mut self, path: impl Into<String>) -> Self {
        self.token_file = path.into();
        self
    }

    /// Whether tokens are session backed
    pub fn uses_session(&self) -> bool {
        self.storage == TokenStorage::Session
    }

    /// Check the values the token format and key ring depend on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_ms <= 0 {
            return Err(ConfigError::Invalid {
                field: "ttl_ms".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.ring_size == 0 || self.ring_size > MAX_RING_SIZE {
            return Err(ConfigError::Invalid {
                field: "ring_size".to_string(),
                reason: format!("must be between 1 and {}", MAX_RING_SIZE),
            });
        }
        if self.server_id.is_empty() || self.server_id.contains('@') {
            return Err(ConfigError::Invalid {
                field: "server_id".to_string(),
                reason: "must be non-empty and must not contain '@'".to_string(),
            });
        }
        if self.cookie_name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "cookie_name".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Server to server trust configuration (`x-sakai-token` header)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerTrustConfig {
    /// Accept trusted tokens from servers
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Secret shared by every trusted server
    #[serde(default = "default_shared_secret")]
    pub shared_secret: String,

    /// `;` separated list of hosts allowed to present the header
    #[serde(default = "default_safe_hosts")]
    pub safe_hosts: String,
}

impl Default for ServerTrustConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shared_secret: default_shared_secret(),
            safe_hosts: default_safe_hosts(),
        }
    }
}

impl ServerTrustConfig {
    /// Create a configuration with a shared secret
    pub fn new(shared_secret: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            ..Default::default()
        }
    }

    /// Set the safe hosts from a list
    pub fn with_safe_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = hosts.into_iter().map(|h| h.as_ref().to_string()).collect();
        self.safe_hosts = format!(";{};", joined.join(";"));
        self
    }

    /// The allow-list as individual host names
    pub fn safe_host_list(&self) -> Vec<String> {
        self.safe_hosts
            .split(';')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.shared_secret == DEFAULT_SHARED_SECRET
    }
}

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Session timeout in seconds
    pub timeout: u64,

    /// Session cookie name
    pub cookie_name: String,

    /// Session cookie secure flag (HTTPS only)
    pub secure: bool,

    /// Session cookie SameSite attribute
    pub same_site: String,

    /// Session cookie HttpOnly flag
    #[serde(default = "default_true")]
    pub http_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: 3600,  // 1 hour
            cookie_name: String::from("trusted-session"),
            secure: false,  // Set to true in production
            same_site: String::from("Lax"),
            http_only: true,
        }
    }
}

/// Trusted login endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrustedLoginConfig {
    /// Path the trusted login endpoint is mounted at
    #[serde(default = "default_registration_path")]
    pub registration_path: String,

    /// Where to redirect when no destination is given
    #[serde(default = "default_destination")]
    pub default_destination: String,

    /// Redirect used when the asserted user has no account; `{0}` is
    /// replaced by the encoded destination
    #[serde(default = "default_no_user_redirect_format")]
    pub no_user_redirect_format: String,

    /// Header set by the fronting authenticator carrying the remote user;
    /// only believed from server-trust safe hosts, empty disables it
    #[serde(default = "default_remote_user_header")]
    pub remote_user_header: String,
}

impl Default for TrustedLoginConfig {
    fn default() -> Self {
        Self {
            registration_path: default_registration_path(),
            default_destination: default_destination(),
            no_user_redirect_format: default_no_user_redirect_format(),
            remote_user_header: default_remote_user_header(),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Trusted token configuration
    #[serde(default)]
    pub token: TrustedTokenConfig,

    /// Server trust configuration
    #[serde(default)]
    pub server_trust: ServerTrustConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Trusted login endpoint configuration
    #[serde(default)]
    pub login: TrustedLoginConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let storage = std::env::var("TRUSTED_TOKEN_STORAGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_storage);
        let secure_cookie = std::env::var("TRUSTED_TOKEN_SECURE_COOKIE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);
        let ttl_ms = std::env::var("TRUSTED_TOKEN_TTL_MS")
            .unwrap_or_else(|_| default_ttl_ms().to_string())
            .parse()
            .unwrap_or_else(|_| default_ttl_ms());
        let ring_size = std::env::var("TRUSTED_TOKEN_RING_SIZE")
            .unwrap_or_else(|_| default_ring_size().to_string())
            .parse()
            .unwrap_or_else(|_| default_ring_size());

        let token = TrustedTokenConfig {
            storage,
            secure_cookie,
            ttl_ms,
            cookie_name: std::env::var("TRUSTED_TOKEN_COOKIE_NAME")
                .unwrap_or_else(|_| default_cookie_name()),
            token_file: std::env::var("TRUSTED_TOKEN_FILE")
                .unwrap_or_else(|_| default_token_file()),
            ring_size,
            server_id: std::env::var("TRUSTED_SERVER_ID")
                .unwrap_or_else(|_| default_server_id()),
        };

        let server_trust = ServerTrustConfig {
            enabled: std::env::var("TRUSTED_SERVER_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            shared_secret: std::env::var("TRUSTED_SERVER_SECRET")
                .unwrap_or_else(|_| default_shared_secret()),
            safe_hosts: std::env::var("TRUSTED_SERVER_SAFE_HOSTS")
                .unwrap_or_else(|_| default_safe_hosts()),
        };

        let session = SessionConfig {
            secure: secure_cookie,
            ..Default::default()
        };

        let login = TrustedLoginConfig {
            registration_path: std::env::var("TRUSTED_LOGIN_PATH")
                .unwrap_or_else(|_| default_registration_path()),
            default_destination: std::env::var("TRUSTED_LOGIN_DESTINATION")
                .unwrap_or_else(|_| default_destination()),
            ..Default::default()
        };

        Self {
            token,
            server_trust,
            session,
            login,
        }
    }

    /// Validate the whole authentication configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token.validate()?;
        if self.server_trust.enabled && self.server_trust.shared_secret.is_empty() {
            return Err(ConfigError::Invalid {
                field: "server_trust.shared_secret".to_string(),
                reason: "must be set when server trust is enabled".to_string(),
            });
        }
        if !self.login.registration_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "login.registration_path".to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        Ok(())
    }
}

fn default_storage() -> TokenStorage {
    TokenStorage::Cookie
}

fn default_ttl_ms() -> i64 {
    1_200_000  // 20 minutes
}

fn default_cookie_name() -> String {
    String::from("sakai-trusted-authn")
}

fn default_token_file() -> String {
    String::from("sling/cookie-keystore.bin")
}

fn default_ring_size() -> usize {
    5
}

fn default_server_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_shared_secret() -> String {
    String::from(DEFAULT_SHARED_SECRET)
}

fn default_safe_hosts() -> String {
    String::from(";localhost;")
}

fn default_registration_path() -> String {
    String::from("/system/trustedauth")
}

fn default_destination() -> String {
    String::from("/dev")
}

fn default_no_user_redirect_format() -> String {
    String::from("/system/trustedauth-nouser?u={0}")
}

fn default_remote_user_header() -> String {
    String::from("x-remote-user")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_config_default() {
        let config = TrustedTokenConfig::default();
        assert_eq!(config.ttl_ms, 1_200_000);
        assert_eq!(config.ring_size, 5);
        assert_eq!(config.cookie_name, "sakai-trusted-authn");
        assert_eq!(config.storage, TokenStorage::Cookie);
        assert!(!config.secure_cookie);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_config_builder() {
        let config = TrustedTokenConfig::new("node1")
            .with_ttl_minutes(30)
            .with_storage(TokenStorage::Session)
            .with_token_file("/tmp/keys.bin");

        assert_eq!(config.server_id, "node1");
        assert_eq!(config.ttl_ms, 1_800_000);
        assert!(config.uses_session());
        assert_eq!(config.token_file, "/tmp/keys.bin");
    }

    #[test]
    fn test_ring_size_is_bounded_by_wire_format() {
        let mut config = TrustedTokenConfig::new("node1");
        config.ring_size = 10;
        assert!(config.validate().is_ok());

        config.ring_size = 11;
        assert!(config.validate().is_err());

        config.ring_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_id_must_not_contain_separator() {
        let config = TrustedTokenConfig::new("node@1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = TrustedTokenConfig::new("node1");
        config.ttl_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_safe_host_list() {
        let config = ServerTrustConfig::default();
        assert_eq!(config.safe_host_list(), vec!["localhost".to_string()]);

        let config = ServerTrustConfig::new("secret").with_safe_hosts(["app1", "10.0.0.2"]);
        assert_eq!(config.safe_hosts, ";app1;10.0.0.2;");
        assert_eq!(
            config.safe_host_list(),
            vec!["app1".to_string(), "10.0.0.2".to_string()]
        );
    }

    #[test]
    fn test_default_secret_detected() {
        assert!(ServerTrustConfig::default().is_using_default_secret());
        assert!(!ServerTrustConfig::new("s3cret").is_using_default_secret());
    }

    #[test]
    fn test_token_storage_from_str() {
        assert_eq!("cookie".parse::<TokenStorage>().unwrap(), TokenStorage::Cookie);
        assert_eq!("SESSION".parse::<TokenStorage>().unwrap(), TokenStorage::Session);
        assert!("header".parse::<TokenStorage>().is_err());
    }

    #[test]
    fn test_auth_config_validate_rejects_empty_secret() {
        let mut config = AuthConfig::default();
        config.server_trust.shared_secret = String::new();
        assert!(config.validate().is_err());

        config.server_trust.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout, 3600);
        assert_eq!(config.cookie_name, "trusted-session");
        assert!(config.http_only);
        assert!(!config.secure);
    }
}
