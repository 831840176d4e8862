//! Error types for the OneDrive provider

use thiserror::Error;

/// OneDrive provider errors
///
/// Every variant is recoverable at the traversal level: the affected target
/// or branch is skipped and the walk continues.
#[derive(Error, Debug)]
pub enum OneDriveError {
    /// Graph returned a non-success status
    #[error("Graph API error (status {status_code}): {code}: {message}")]
    ApiError {
        status_code: u16,
        code: String,
        message: String,
    },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The reader returned a listing where an item was expected, or the reverse
    #[error("Unexpected response for {path}: expected {expected}")]
    UnexpectedShape { path: String, expected: &'static str },

    /// Transport failure
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

impl OneDriveError {
    /// Whether Graph reported the path as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, OneDriveError::ApiError { status_code: 404, .. })
    }
}

/// Result type for OneDrive operations
pub type Result<T> = std::result::Result<T, OneDriveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_error_display() {
        let error = OneDriveError::ApiError {
            status_code: 404,
            code: "itemNotFound".to_string(),
            message: "The resource could not be found.".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Graph API error (status 404): itemNotFound: The resource could not be found."
        );
        assert!(error.is_not_found());
    }

    #[test]
    fn test_bridge_error_conversion() {
        let error: OneDriveError = BridgeError::Timeout("30s elapsed".to_string()).into();

        assert!(matches!(error, OneDriveError::BridgeError(BridgeError::Timeout(_))));
        assert!(!error.is_not_found());
    }
}
