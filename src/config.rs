//! Environment configuration

use crate::error::TrackerError;
use crate::Result;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Service settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,
    /// `token:uid[:role]` entries for the static token verifier
    pub auth_tokens: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            auth_tokens: String::new(),
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                TrackerError::ConfigError(format!("Invalid port '{}': {}", raw, e))
            })?,
            None => DEFAULT_PORT,
        };

        let bind_addr = lookup("BIND_ADDR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let cors_origins: Vec<String> = lookup("TRACKER_CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            port,
            cors_origins: if cors_origins.is_empty() {
                vec!["*".to_string()]
            } else {
                cors_origins
            },
            auth_tokens: lookup("TRACKER_AUTH_TOKENS").unwrap_or_default(),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
