//! Server-to-server trust over a static shared secret
//!
//! A trusted peer sends `x-sakai-token: <hex hmac>;<user id>;<timestamp>`
//! where the HMAC-SHA1 is computed over `<user id>;<timestamp>` with the
//! shared secret. The header is honoured only from allow-listed hosts.

use tracing::warn;

use ta_shared::config::ServerTrustConfig;

use crate::domain::entities::ServerTrustCredential;
use crate::errors::TokenError;

use super::codec::{hmac_sha1_hex, signatures_match};

/// Verifies and produces server-trust header values
#[derive(Clone)]
pub struct ServerTrustValidator {
    enabled: bool,
    shared_secret: String,
    safe_hosts: Vec<String>,
}

impl std::fmt::Debug for ServerTrustValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTrustValidator")
            .field("enabled", &self.enabled)
            .field("safe_hosts", &self.safe_hosts)
            .finish()
    }
}

impl ServerTrustValidator {
    pub fn new(config: &ServerTrustConfig) -> Self {
        if config.enabled && config.is_using_default_secret() {
            warn!("Server trust is enabled with the default shared secret, change it before exposing this server");
        }
        Self {
            enabled: config.enabled,
            shared_secret: config.shared_secret.clone(),
            safe_hosts: config.safe_host_list(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether any of the names the peer is known by is allow-listed
    pub fn is_safe_host(&self, hosts: &[String]) -> bool {
        hosts
            .iter()
            .map(|h| h.trim())
            .any(|h| self.safe_hosts.iter().any(|safe| safe == h))
    }

    /// Check a header value presented by a peer known as `hosts`
    ///
    /// Returns the asserted user id.
    pub fn validate(&self, header: &str, hosts: &[String]) -> Result<String, TokenError> {
        let result = self.check(header, hosts);
        if let Err(e) = &result {
            warn!(
                kind = e.kind(),
                hosts = ?hosts,
                "Rejected server trust header"
            );
        }
        result
    }

    fn check(&self, header: &str, hosts: &[String]) -> Result<String, TokenError> {
        if !self.enabled || !self.is_safe_host(hosts) {
            return Err(TokenError::UntrustedHost {
                host: hosts.first().cloned().unwrap_or_default(),
            });
        }

        let credential = ServerTrustCredential::parse(header)?;
        let message = ServerTrustCredential::message(&credential.user_id, credential.timestamp);
        let expected = hmac_sha1_hex(self.shared_secret.as_bytes(), &message)?;
        if !signatures_match(&expected, &credential.signature) {
            return Err(TokenError::InvalidSignature);
        }

        Ok(credential.user_id)
    }

    /// Build a header value asserting `user_id` at `timestamp`
    pub fn sign(&self, user_id: &str, timestamp: i64) -> Result<String, TokenError> {
        if user_id.is_empty() || user_id.contains(';') {
            return Err(TokenError::InvalidTokenFormat);
        }
        let message = ServerTrustCredential::message(user_id, timestamp);
        let signature = hmac_sha1_hex(self.shared_secret.as_bytes(), &message)?;
        Ok(format!("{};{}", signature, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    fn validator() -> ServerTrustValidator {
        ServerTrustValidator::new(
            &ServerTrustConfig::new("s3cret").with_safe_hosts(["localhost", "10.0.0.5"]),
        )
    }

    #[test]
    fn test_sign_then_validate() {
        let v = validator();
        let header = v.sign("alice", 1_700_000_000_000).unwrap();
        assert!(header.ends_with(";alice;1700000000000"));
        assert_eq!(v.validate(&header, &hosts(&["10.0.0.5"])), Ok("alice".to_string()));
    }

    #[test]
    fn test_known_signature() {
        // HMAC-SHA1("key", "The quick brown fox jumps over the lazy dog")
        assert_eq!(
            hmac_sha1_hex(b"key", "The quick brown fox jumps over the lazy dog").unwrap(),
            "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }

    #[test]
    fn test_untrusted_host_is_checked_first() {
        let v = validator();
        let err = v.validate("garbage", &hosts(&["evil.example"])).unwrap_err();
        assert_eq!(
            err,
            TokenError::UntrustedHost {
                host: "evil.example".to_string()
            }
        );
    }

    #[test]
    fn test_host_match_is_exact() {
        let v = validator();
        let header = v.sign("alice", 1).unwrap();
        assert!(v.validate(&header, &hosts(&["localhost.evil"])).is_err());
        assert!(v.validate(&header, &hosts(&["10.0.0"])).is_err());
        assert!(v.validate(&header, &hosts(&["127.0.0.1", "localhost"])).is_ok());
    }

    #[test]
    fn test_disabled_channel_rejects_everything() {
        let mut config = ServerTrustConfig::new("s3cret");
        config.enabled = false;
        let v = ServerTrustValidator::new(&config);
        let header = v.sign("alice", 1).unwrap();

        assert!(matches!(
            v.validate(&header, &hosts(&["localhost"])),
            Err(TokenError::UntrustedHost { .. })
        ));
    }

    #[test]
    fn test_malformed_headers() {
        let v = validator();
        let local = hosts(&["localhost"]);
        assert_eq!(v.validate("sig;alice", &local), Err(TokenError::InvalidTokenFormat));
        assert_eq!(v.validate("sig;alice;1;2", &local), Err(TokenError::InvalidTokenFormat));
        assert_eq!(v.validate("sig;alice;later", &local), Err(TokenError::InvalidTokenFormat));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let other = ServerTrustValidator::new(&ServerTrustConfig::new("other"));
        let header = other.sign("alice", 1).unwrap();
        assert_eq!(
            validator().validate(&header, &hosts(&["localhost"])),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_user_is_invalid_signature() {
        let v = validator();
        let header = v.sign("alice", 1).unwrap().replace("alice", "admin");
        assert_eq!(
            v.validate(&header, &hosts(&["localhost"])),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_sign_rejects_separator_in_user() {
        assert!(validator().sign("a;b", 1).is_err());
        assert!(validator().sign("", 1).is_err());
    }
}
