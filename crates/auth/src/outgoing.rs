//! Header acquisition for outgoing calls (runtime engine, callback URLs).

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;

use crate::claims::JwtClaims;
use crate::jwt::encode_hs256;
use crate::PrincipalId;

/// Header name/value pairs to attach to an outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders(BTreeMap<String, String>);

impl AuthHeaders {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bearer(token: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        Self(headers)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceAuthenticationError {
    #[error("failed to obtain service credentials: {0}")]
    Credentials(String),

    #[error("failed to sign service token: {0}")]
    Signing(String),
}

/// Source of authentication headers for outgoing requests.
///
/// `external` distinguishes calls leaving the deployment (callback URLs) from
/// calls to sibling services (the runtime engine).
#[async_trait::async_trait]
pub trait AuthHeaderProvider: Send + Sync + 'static {
    async fn auth_headers(&self, external: bool) -> Result<AuthHeaders, ServiceAuthenticationError>;
}

/// No authentication configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuthHeaders;

#[async_trait::async_trait]
impl AuthHeaderProvider for NoAuthHeaders {
    async fn auth_headers(&self, _external: bool) -> Result<AuthHeaders, ServiceAuthenticationError> {
        Ok(AuthHeaders::empty())
    }
}

/// A pre-issued bearer token, sent on every outgoing call.
#[derive(Clone)]
pub struct StaticBearerToken {
    token: String,
}

impl StaticBearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticBearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBearerToken").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AuthHeaderProvider for StaticBearerToken {
    async fn auth_headers(&self, _external: bool) -> Result<AuthHeaders, ServiceAuthenticationError> {
        if self.token.trim().is_empty() {
            return Err(ServiceAuthenticationError::Credentials(
                "configured service token is empty".to_string(),
            ));
        }
        Ok(AuthHeaders::bearer(&self.token))
    }
}

/// Mints a short-lived HS256 token for the service principal on each call.
pub struct ServiceTokenMinter {
    secret: Vec<u8>,
    principal: PrincipalId,
    ttl: chrono::Duration,
}

impl ServiceTokenMinter {
    pub fn new(secret: impl Into<Vec<u8>>, principal: PrincipalId) -> Self {
        Self {
            secret: secret.into(),
            principal,
            ttl: chrono::Duration::minutes(5),
        }
    }
}

impl std::fmt::Debug for ServiceTokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTokenMinter")
            .field("principal", &self.principal)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AuthHeaderProvider for ServiceTokenMinter {
    async fn auth_headers(&self, external: bool) -> Result<AuthHeaders, ServiceAuthenticationError> {
        let claims = JwtClaims::new(self.principal, Utc::now(), self.ttl);
        let token = encode_hs256(&self.secret, &claims)
            .map_err(|e| ServiceAuthenticationError::Signing(e.to_string()))?;
        tracing::debug!(principal = %self.principal, external, "minted service token");
        Ok(AuthHeaders::bearer(&token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{Hs256JwtValidator, JwtValidator};

    #[tokio::test]
    async fn no_auth_yields_empty_headers() {
        let headers = NoAuthHeaders.auth_headers(true).await.unwrap();
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn static_token_is_sent_as_bearer() {
        let headers = StaticBearerToken::new("abc").auth_headers(true).await.unwrap();
        assert_eq!(headers.get("Authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn empty_static_token_fails_acquisition() {
        let err = StaticBearerToken::new("  ").auth_headers(true).await.unwrap_err();
        assert!(matches!(err, ServiceAuthenticationError::Credentials(_)));
    }

    #[tokio::test]
    async fn minted_token_validates_with_shared_secret() {
        let principal = PrincipalId::new();
        let minter = ServiceTokenMinter::new(b"shared".to_vec(), principal);
        let headers = minter.auth_headers(false).await.unwrap();

        let token = headers
            .get("Authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap();
        let claims = Hs256JwtValidator::new("shared").validate(token, Utc::now()).unwrap();
        assert_eq!(claims.sub, principal);
    }
}
