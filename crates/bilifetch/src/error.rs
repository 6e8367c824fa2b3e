//! Error types for bilifetch

use thiserror::Error;

/// Errors that can occur during retrieval operations
#[derive(Debug, Error)]
pub enum Error {
    /// Identifier failed validation before any network call
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Content is absent or has been removed
    #[error("content not found: {0}")]
    NotFound(String),

    /// Content is private or otherwise restricted
    #[error("access denied: {0}")]
    Forbidden(String),

    /// The platform rejected the request with HTTP 412
    #[error("request rejected by the platform (HTTP 412), slow down and retry later")]
    RateLimited,

    /// Operation requires a session cookie and none was configured
    #[error("this operation requires a session cookie")]
    Unauthenticated,

    /// Unexpected HTTP status outside the API envelope
    #[error("unexpected HTTP status {0}")]
    BadStatus(u16),

    /// Transport failure: timeout, connect error, malformed body
    #[error("request failed: {0}")]
    Network(String),

    /// Non-zero API status code, with a friendly message where known
    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    /// Page fetched but every critical field was missing
    #[error("could not extract expected fields: {0}")]
    Extraction(String),

    /// Video carries no retrievable cid for its danmaku track
    #[error("video has no retrievable cid; pass one explicitly")]
    MissingCid,

    /// Headless browser could not be launched or driven
    #[error("browser automation unavailable: {0}")]
    BrowserUnavailable(String),

    /// Failed to build the HTTP client
    #[error("failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

/// Friendly messages for well-known API status codes
const API_CODE_MESSAGES: &[(i64, &str)] = &[
    (-404, "content does not exist or has been deleted"),
    (-403, "access denied, content may be private"),
    (-400, "bad request parameters"),
    (-101, "account not logged in"),
    (-102, "account banned"),
];

impl Error {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Network("request timed out".to_string())
        } else if err.is_connect() {
            Error::Network("failed to connect to server".to_string())
        } else {
            Error::Network(err.to_string())
        }
    }

    /// Map a non-zero API status code to a domain error
    ///
    /// -404 and -403 become [`Error::NotFound`] / [`Error::Forbidden`];
    /// other mapped codes keep their friendly text, unmapped codes fall back
    /// to the platform-supplied message.
    pub fn from_api_code(code: i64, message: &str) -> Self {
        let friendly = API_CODE_MESSAGES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, m)| *m);

        match code {
            -404 => Error::NotFound(friendly.unwrap_or(message).to_string()),
            -403 => Error::Forbidden(friendly.unwrap_or(message).to_string()),
            _ => Error::Api {
                code,
                message: friendly
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        if message.is_empty() {
                            "unknown error".to_string()
                        } else {
                            message.to_string()
                        }
                    }),
            },
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_code_table() {
        assert!(matches!(Error::from_api_code(-404, "raw"), Error::NotFound(_)));
        assert!(matches!(Error::from_api_code(-403, "raw"), Error::Forbidden(_)));

        match Error::from_api_code(-101, "raw") {
            Error::Api { code, message } => {
                assert_eq!(code, -101);
                assert_eq!(message, "account not logged in");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_api_code_fallback_message() {
        match Error::from_api_code(-999, "server hiccup") {
            Error::Api { code, message } => {
                assert_eq!(code, -999);
                assert_eq!(message, "server hiccup");
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        match Error::from_api_code(-999, "") {
            Error::Api { message, .. } => assert_eq!(message, "unknown error"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::Unauthenticated.to_string(),
            "this operation requires a session cookie"
        );
        assert_eq!(Error::BadStatus(500).to_string(), "unexpected HTTP status 500");
        assert!(Error::RateLimited.to_string().contains("412"));
    }
}
