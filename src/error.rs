//! Error types for the DHIS2 client
//!
//! Two kinds matter to callers: [`Error::Client`] for misuse detected locally
//! before (or independent of) any network call, and [`Error::Request`] for a
//! non-success response from the server. Transport and parsing failures pass
//! through in their own variants.

use thiserror::Error;

/// The main error type for the DHIS2 client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Local (client-side) Errors
    // ============================================================================
    /// Local misuse detected before or without a network call
    #[error("Client error: {message}")]
    Client {
        /// What was wrong
        message: String,
    },

    // ============================================================================
    // API Errors
    // ============================================================================
    /// Non-success response from the server
    #[error("code: {code}, url: {url}, description: {description}")]
    Request {
        /// HTTP status code
        code: u16,
        /// Final request URL
        url: String,
        /// Raw response body
        description: String,
    },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    /// Transport failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unparseable URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    /// Invalid JSON
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid CSV in a local file
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Response with an unexpected shape
    #[error("Failed to decode response: {message}")]
    Decode {
        /// What was unexpected
        message: String,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a client error
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
        }
    }

    /// Create an API request error
    pub fn request(code: u16, url: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Request {
            code,
            url: url.into(),
            description: description.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// True for misuse detected before talking to the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// True when the server answered with a non-success status
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    /// HTTP status code of a request error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { code, .. } => Some(*code),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for the DHIS2 client
pub type Result<T> = std::result::Result<T, Error>;
