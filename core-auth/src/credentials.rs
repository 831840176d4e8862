//! Run-scoped credentials.
//!
//! [`SessionCredentials`] authenticates once when constructed and then serves
//! the same bearer token for the rest of the run. There is no refresh on
//! expiry; a run is expected to finish well inside the token lifetime.

use crate::error::Result;
use crate::oauth::{OAuthConfig, TokenExchange};
use crate::types::OAuthTokens;
use bridge_traits::http::HttpClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Source of the bearer token attached to drive API requests.
pub trait CredentialProvider: Send + Sync {
    /// Current access token, without the `Bearer ` prefix.
    fn access_token(&self) -> String;
}

/// Credentials obtained by a single refresh token exchange.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    tokens: OAuthTokens,
}

impl SessionCredentials {
    /// Exchange `refresh_token` for an access token.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`](crate::AuthError) from the exchange. Callers treat
    /// it as fatal: nothing downstream can run without a token.
    pub async fn authenticate(
        config: OAuthConfig,
        refresh_token: &str,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let exchange = TokenExchange::new(config, http_client);
        let tokens = exchange.refresh_access_token(refresh_token).await?;

        match tokens.time_until_expiry() {
            Some(remaining) => info!(
                expires_in_secs = remaining.num_seconds(),
                "Authenticated with Microsoft Graph"
            ),
            None => warn!("Token endpoint returned an already expired access token"),
        }

        Ok(Self { tokens })
    }

    /// Wrap an already issued token set.
    pub fn from_tokens(tokens: OAuthTokens) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &OAuthTokens {
        &self.tokens
    }
}

impl CredentialProvider for SessionCredentials {
    fn access_token(&self) -> String {
        self.tokens.access_token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
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

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client".to_string(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            grant_type: "refresh_token".to_string(),
            token_url: "https://login.example.com/token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_exposes_access_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(r#"{"access_token": "EwB4", "expires_in": 3600}"#),
            })
        });

        let credentials = SessionCredentials::authenticate(config(), "refresh", Arc::new(mock_http))
            .await
            .unwrap();

        assert_eq!(credentials.access_token(), "EwB4");
        assert_eq!(credentials.tokens().refresh_token, "refresh");
    }

    #[tokio::test]
    async fn test_authenticate_failure_propagates() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 401,
                headers: HashMap::new(),
                body: Bytes::from(r#"{"error": "invalid_client"}"#),
            })
        });

        let result =
            SessionCredentials::authenticate(config(), "refresh", Arc::new(mock_http)).await;

        assert!(matches!(result, Err(AuthError::TokenRefreshFailed(_))));
    }

    #[test]
    fn test_from_tokens() {
        let credentials = SessionCredentials::from_tokens(OAuthTokens::new(
            "token".to_string(),
            "refresh".to_string(),
            60,
        ));

        let provider: &dyn CredentialProvider = &credentials;
        assert_eq!(provider.access_token(), "token");
    }
}
