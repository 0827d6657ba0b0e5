//! Deployment environment and log filter selection

use serde::{Deserialize, Serialize};
use std::env;

/// Where this node is running
///
/// Production refuses configurations that are only safe on a single
/// developer machine (see [`super::AppConfig::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Read `APP_ENV`, falling back to development
    pub fn from_env() -> Self {
        env::var("APP_ENV")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// Log filter handed to the logger at startup; `RUST_LOG` still wins
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default level for every crate
    pub level: String,

    /// Level for the key ring and token service, which log every rotation
    /// and rejected credential
    #[serde(default)]
    pub token_level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            token_level: None,
        }
    }
}

impl LoggingConfig {
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: String::from("info"),
                token_level: Some(String::from("debug")),
            },
            Environment::Staging => Self::default(),
            Environment::Production => Self {
                level: String::from("warn"),
                token_level: Some(String::from("info")),
            },
        }
    }

    /// `env_logger` filter directive, e.g. `warn,ta_core=info`
    pub fn filter(&self) -> String {
        match &self.token_level {
            Some(token_level) => format!("{},ta_core={}", self.level, token_level),
            None => self.level.clone(),
        }
    }
}
