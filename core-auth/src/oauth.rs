//! OAuth 2.0 Refresh Token Exchange
//!
//! This module implements the refresh token grant (RFC 6749 §6) against the
//! Microsoft identity platform token endpoint.
//!
//! # Overview
//!
//! The exchange:
//! - Sends one form-encoded POST with the client credentials and refresh token
//! - Decodes the token record (access token, refresh token, type, expiry hints)
//! - Never retries; a failure is returned to the caller as-is
//!
//! # Security
//!
//! - Never logs sensitive values (tokens, client secret)
//! - `OAuthConfig` redacts its secret in `Debug`
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, TokenExchange};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string(),
//!     redirect_uri: "http://localhost:8080".to_string(),
//!     grant_type: "refresh_token".to_string(),
//!     token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string(),
//! };
//!
//! let exchange = TokenExchange::new(config, http_client);
//! let tokens = exchange.refresh_access_token("stored-refresh-token").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// OAuth 2.0 client configuration for the token endpoint.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Application (client) ID
    pub client_id: String,
    /// Client secret; empty for public clients
    pub client_secret: String,
    /// Redirect URI registered for the application; empty to omit
    pub redirect_uri: String,
    /// Grant type sent with the exchange, normally `refresh_token`
    pub grant_type: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("grant_type", &self.grant_type)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Exchanges refresh tokens for access tokens.
pub struct TokenExchange {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl TokenExchange {
    /// Create a new token exchange with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - OAuth client configuration
    /// * `http_client` - HTTP client for making token requests
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the form fields for a token request, in wire order.
    fn form_fields<'a>(&'a self, refresh_token: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut fields = vec![("client_id", self.config.client_id.as_str())];

        if !self.config.redirect_uri.is_empty() {
            fields.push(("redirect_uri", self.config.redirect_uri.as_str()));
        }

        if !self.config.client_secret.is_empty() {
            fields.push(("client_secret", self.config.client_secret.as_str()));
        }

        fields.push(("refresh_token", refresh_token));
        fields.push(("grant_type", self.config.grant_type.as_str()));
        fields
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - The refresh token from previous authentication
    ///
    /// # Returns
    ///
    /// New OAuth tokens. When the endpoint does not rotate the refresh token,
    /// the one passed in is carried over.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token endpoint cannot be reached ([`AuthError::NetworkError`])
    /// - The endpoint rejects the request ([`AuthError::TokenRefreshFailed`])
    /// - The response is not a token record ([`AuthError::InvalidTokenResponse`])
    #[instrument(skip(self, refresh_token), fields(token_url = %self.config.token_url))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        debug!("Refreshing access token");

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .form(&self.form_fields(refresh_token))
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .json::<TokenErrorResponse>()
                .map(|e| e.to_string())
                .or_else(|_| response.text())
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status = status, error = %error_body, "Token endpoint rejected refresh");

            return Err(AuthError::TokenRefreshFailed(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;

        if token_response.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse(
                "access_token is empty".to_string(),
            ));
        }

        info!(
            expires_in = token_response.expires_in,
            ext_expires_in = ?token_response.ext_expires_in,
            "Successfully refreshed token"
        );

        Ok(token_response.into_tokens(refresh_token))
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ext_expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_tokens(self, previous_refresh_token: &str) -> OAuthTokens {
        let refresh_token = self
            .refresh_token
            .unwrap_or_else(|| previous_refresh_token.to_string());

        OAuthTokens::new(self.access_token, refresh_token, self.expires_in)
            .with_token_type(self.token_type.unwrap_or_else(|| "Bearer".to_string()))
            .with_scope(self.scope)
    }
}

/// Error body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl fmt::Display for TokenErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

fn default_expires_in() -> i64 {
    3600 // Default to 1 hour if not specified
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn test_config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "s3cret".to_string(),
            redirect_uri: "http://localhost:8080".to_string(),
            grant_type: "refresh_token".to_string(),
            token_url: "https://login.example.com/token".to_string(),
        }
    }

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        }
    }

    #[tokio::test]
    async fn test_refresh_sends_form_encoded_credentials() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Post);
            assert_eq!(req.url, "https://login.example.com/token");
            assert_eq!(
                req.headers.get("Content-Type"),
                Some(&"application/x-www-form-urlencoded".to_string())
            );
            let body = String::from_utf8(req.body.unwrap().to_vec()).unwrap();
            assert_eq!(
                body,
                "client_id=client-123&redirect_uri=http%3A%2F%2Flocalhost%3A8080\
                 &client_secret=s3cret&refresh_token=old-refresh&grant_type=refresh_token"
            );

            Ok(response(
                200,
                r#"{
                    "token_type": "Bearer",
                    "scope": "Files.Read.All offline_access",
                    "expires_in": 3599,
                    "ext_expires_in": 3599,
                    "access_token": "EwB4A8l6",
                    "refresh_token": "new-refresh"
                }"#,
            ))
        });

        let exchange = TokenExchange::new(test_config(), Arc::new(mock_http));
        let tokens = exchange.refresh_access_token("old-refresh").await.unwrap();

        assert_eq!(tokens.access_token, "EwB4A8l6");
        assert_eq!(tokens.refresh_token, "new-refresh");
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(
            tokens.scope,
            Some("Files.Read.All offline_access".to_string())
        );
        assert!(!tokens.is_expired());
    }

    #[tokio::test]
    async fn test_public_client_omits_empty_fields() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            let body = String::from_utf8(req.body.unwrap().to_vec()).unwrap();
            assert!(!body.contains("client_secret"));
            assert!(!body.contains("redirect_uri"));
            Ok(response(200, r#"{"access_token": "token"}"#))
        });

        let config = OAuthConfig {
            client_secret: String::new(),
            redirect_uri: String::new(),
            ..test_config()
        };
        let exchange = TokenExchange::new(config, Arc::new(mock_http));
        let tokens = exchange.refresh_access_token("keep-me").await.unwrap();

        // Refresh token is carried over when not rotated
        assert_eq!(tokens.refresh_token, "keep-me");
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                400,
                r#"{"error": "invalid_grant", "error_description": "AADSTS70000: expired"}"#,
            ))
        });

        let exchange = TokenExchange::new(test_config(), Arc::new(mock_http));
        let result = exchange.refresh_access_token("stale").await;

        match result {
            Err(AuthError::TokenRefreshFailed(msg)) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("invalid_grant"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(503, "Service Unavailable")));

        let exchange = TokenExchange::new(test_config(), Arc::new(mock_http));
        let result = exchange.refresh_access_token("refresh").await;

        assert!(matches!(result, Err(AuthError::TokenRefreshFailed(msg)) if msg.contains("Service Unavailable")));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Err(BridgeError::Connection("connection refused".to_string()))
        });

        let exchange = TokenExchange::new(test_config(), Arc::new(mock_http));
        let result = exchange.refresh_access_token("refresh").await;

        assert!(matches!(result, Err(AuthError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_malformed_response_is_invalid_token_response() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, "<html>login</html>")));

        let exchange = TokenExchange::new(test_config(), Arc::new(mock_http));
        let result = exchange.refresh_access_token("refresh").await;

        assert!(matches!(result, Err(AuthError::InvalidTokenResponse(_))));
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let debug = format!("{:?}", test_config());
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("client-123"));
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let json = r#"{
            "access_token": "token"
        }"#;

        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600); // Default value
        assert_eq!(response.ext_expires_in, None);
    }
}
