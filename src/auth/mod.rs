//! Bearer-token authentication
//!
//! Token verification is an external capability behind `TokenVerifier`.
//! The bundled `StaticTokenVerifier` resolves tokens from a fixed table,
//! which is enough for local runs and tests.

use crate::error::TrackerError;
use crate::models::Role;
use crate::Result;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use tracing::warn;

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Fails with `Forbidden` unless the caller has the staff role
    pub fn require_staff(&self) -> Result<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(TrackerError::Forbidden(format!("{} is not staff", self.uid)))
        }
    }
}

/// Trait for token verification
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser>;
}

/// Token table loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, uid: &str, role: Role) -> Self {
        self.tokens.insert(
            token.to_string(),
            AuthenticatedUser {
                uid: uid.to_string(),
                email: None,
                name: None,
                role,
            },
        );
        self
    }

    /// Parse `token:uid[:role]` entries separated by commas
    pub fn from_entries(raw: &str) -> Result<Self> {
        let mut verifier = Self::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let (token, uid, role) = match parts.as_slice() {
                [token, uid] => (*token, *uid, Role::User),
                [token, uid, role] => (*token, *uid, parse_role(role)?),
                _ => {
                    return Err(TrackerError::ConfigError(format!(
                        "Auth token entry must look like token:uid[:role], got '{}'",
                        entry
                    )))
                }
            };

            if token.is_empty() || uid.is_empty() {
                return Err(TrackerError::ConfigError(format!(
                    "Auth token entry has an empty token or uid: '{}'",
                    entry
                )));
            }

            verifier = verifier.with_token(token, uid, role);
        }

        Ok(verifier)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        self.tokens.get(token).cloned().ok_or_else(|| {
            warn!("Rejected unknown bearer token");
            TrackerError::Unauthorized
        })
    }
}

fn parse_role(raw: &str) -> Result<Role> {
    match raw.to_lowercase().as_str() {
        "user" => Ok(Role::User),
        "staff" => Ok(Role::Staff),
        other => Err(TrackerError::ConfigError(format!("Unknown role '{}'", other))),
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
