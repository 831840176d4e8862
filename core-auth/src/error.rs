use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error while contacting token endpoint: {0}")]
    NetworkError(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Authentication error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
