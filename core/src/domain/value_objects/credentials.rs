//! Credentials extracted from an incoming request by the HTTP layer.

/// A trusted-token cookie as it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedCookie {
    pub value: String,
    /// Whether the request came over a secure channel
    pub secure: bool,
}

/// Everything the token service looks at when authenticating a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedCredentials {
    /// Raw `x-sakai-token` header value
    pub server_token: Option<String>,
    /// Names the peer host is known by (address, hostname, aliases)
    pub remote_hosts: Vec<String>,
    /// Every token cookie of the configured name, in request order
    pub cookies: Vec<PresentedCookie>,
    /// Session id from the session cookie
    pub session_id: Option<String>,
}

impl PresentedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_token(mut self, header: impl Into<String>) -> Self {
        self.server_token = Some(header.into());
        self
    }

    pub fn with_remote_host(mut self, host: impl Into<String>) -> Self {
        self.remote_hosts.push(host.into());
        self
    }

    pub fn with_cookie(mut self, value: impl Into<String>, secure: bool) -> Self {
        self.cookies.push(PresentedCookie {
            value: value.into(),
            secure,
        });
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}
