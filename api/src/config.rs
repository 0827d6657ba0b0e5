use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use ta_shared::config::{AppConfig, AuthConfig, ConfigError};

/// Load and validate the whole configuration tree from the environment
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config = AppConfig::from_env();
    config.validate()?;
    Ok(config)
}

/// How trusted credentials are carried in cookies
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub token_cookie: String,
    pub session_cookie: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl CookieSettings {
    pub fn from_auth(config: &AuthConfig) -> Self {
        Self {
            token_cookie: config.token.cookie_name.clone(),
            session_cookie: config.session.cookie_name.clone(),
            secure: config.token.secure_cookie || config.session.secure,
            http_only: config.session.http_only,
            same_site: parse_same_site(&config.session.same_site),
        }
    }

    /// Cookie carrying a freshly issued or refreshed token
    pub fn token(&self, value: impl Into<String>) -> Cookie<'static> {
        self.build(self.token_cookie.clone(), value.into())
    }

    /// Cookie naming the server-side session that holds the credentials
    pub fn session(&self, session_id: impl Into<String>) -> Cookie<'static> {
        self.build(self.session_cookie.clone(), session_id.into())
    }

    /// Token cookie overwritten with `value` and expired on arrival
    pub fn revoked_token(&self, value: impl Into<String>) -> Cookie<'static> {
        let mut cookie = self.build(self.token_cookie.clone(), value.into());
        cookie.set_max_age(CookieDuration::ZERO);
        cookie
    }

    pub fn revoked_session(&self) -> Cookie<'static> {
        let mut cookie = self.build(self.session_cookie.clone(), String::new());
        cookie.set_max_age(CookieDuration::ZERO);
        cookie
    }

    fn build(&self, name: String, value: String) -> Cookie<'static> {
        Cookie::build(name, value)
            .path("/")
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site)
            .finish()
    }
}

fn parse_same_site(value: &str) -> SameSite {
    match value.to_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}
