use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth 2.0 token set.
///
/// Contains the access token, refresh token, and expiration time
/// for an authenticated session.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new(
///     "access_token".to_string(),
///     "refresh_token".to_string(),
///     3600, // 1 hour
/// );
/// assert!(!tokens.is_expired());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: String,
    /// Token type reported by the endpoint, normally `Bearer`
    pub token_type: String,
    /// Space separated scopes granted to the token
    pub scope: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    /// Create a new bearer token set expiring `expires_in` seconds from now
    ///
    /// Lifetimes past the range of [`DateTime`] saturate at its bounds.
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .unwrap_or(if expires_in < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });

        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            scope: None,
            expires_at,
        }
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// Check if the access token is expired or will expire within five minutes
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(300)
    }

    /// Check if the access token is expired with a custom buffer
    ///
    /// # Arguments
    ///
    /// * `buffer_seconds` - Number of seconds before expiration to consider expired
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        let threshold = Duration::try_seconds(buffer_seconds)
            .and_then(|buffer| self.expires_at.checked_sub_signed(buffer));

        match threshold {
            Some(threshold) => Utc::now() >= threshold,
            // Out of range: a huge positive buffer covers any expiry
            None => buffer_seconds > 0,
        }
    }

    /// Get the time remaining until token expiration
    ///
    /// Returns `None` if the token is already expired.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let now = Utc::now();
        if now >= self.expires_at {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
