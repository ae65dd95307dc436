use crate::config::AuthConfig;
use crate::error::ApiError;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::collections::HashMap;

/// Narrow credential seam: resolves a bearer token to an owner id.
///
/// Token issuance and lifecycle are out of scope; tokens are injected
/// configuration, exactly like provider keys.
pub struct CredentialVerifier {
    tokens: HashMap<String, String>,
    admin_token: String,
}

impl CredentialVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|t| (t.token.clone(), t.user_id.clone()))
            .collect();
        Self {
            tokens,
            admin_token: config.admin_token.clone(),
        }
    }

    /// Resolve the caller's owner id, or 401.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }

    /// Admin operations use a dedicated token, never an ordinary credential.
    pub fn authenticate_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
        if !self.admin_token.is_empty() && token == self.admin_token {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
