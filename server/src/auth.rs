//! Static API key gate.
//!
//! With no key configured every request passes. With a key configured every
//! path except the public allow-list (health and info) must carry it in the
//! `X-API-Key` header.

use axum::{extract::Request, middleware::Next, response::Response, Extension};
use std::sync::Arc;
use tracing::warn;

use crate::error::TransportError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Shared secret; `None` disables authentication
    pub api_key: Option<String>,
    /// Paths that bypass the gate
    public_paths: Vec<String>,
}

impl AuthConfig {
    /// Create a config for an app mounted under `base_path`.
    pub fn new(api_key: Option<String>, base_path: &str) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            public_paths: vec![format!("{}/health", base_path), format!("{}/info", base_path)],
        }
    }

    /// Authentication disabled.
    pub fn disabled() -> Self {
        Self::new(None, "")
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    /// Check a presented key against the configured one.
    pub fn check(&self, presented: Option<&str>) -> Result<(), TransportError> {
        let Some(expected) = &self.api_key else {
            return Ok(());
        };
        match presented {
            None => Err(TransportError::Unauthorized),
            Some(key) if key == expected => Ok(()),
            Some(_) => Err(TransportError::Forbidden),
        }
    }
}

/// Authentication middleware.
pub async fn auth_middleware(
    Extension(config): Extension<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, TransportError> {
    if !config.enabled() || config.is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = config.check(presented) {
        warn!(
            "Auth: Rejected {} {}: {}",
            request.method(),
            request.uri().path(),
            e
        );
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_disabled() {
        let config = AuthConfig::disabled();

        assert!(!config.enabled());
        assert!(config.check(None).is_ok());
        assert!(config.check(Some("anything")).is_ok());
    }

    #[test]
    fn test_empty_key_disables_auth() {
        assert!(!AuthConfig::new(Some(String::new()), "").enabled());
    }

    #[test]
    fn test_check_key() {
        let config = AuthConfig::new(Some("secret".to_string()), "");

        assert!(matches!(config.check(None), Err(TransportError::Unauthorized)));
        assert!(matches!(
            config.check(Some("wrong")),
            Err(TransportError::Forbidden)
        ));
        assert!(config.check(Some("secret")).is_ok());
    }

    #[test]
    fn test_public_paths_follow_base_path() {
        let config = AuthConfig::new(Some("secret".to_string()), "/gateway");

        assert!(config.is_public("/gateway/health"));
        assert!(config.is_public("/gateway/info"));
        assert!(!config.is_public("/health"));
        assert!(!config.is_public("/gateway/mcp"));
    }
}
