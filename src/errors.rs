/*!
 * Error types for the lune-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The API answered without any completion text
    #[error("API returned an empty completion")]
    EmptyResponse,
}

impl ProviderError {
    /// Map a reqwest transport error onto the provider error kinds
    pub fn from_reqwest(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(format!("{}: {}", provider, error))
        } else if error.is_connect() {
            Self::ConnectionError(format!("{}: {}", provider, error))
        } else if error.is_decode() {
            Self::ParseError(format!("{}: {}", provider, error))
        } else {
            Self::RequestFailed(format!("{}: {}", provider, error))
        }
    }

    /// Map a non-success HTTP status onto the provider error kinds
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors that can occur while reading or writing script files
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The configured encoding label is not known to encoding_rs
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// The file contains byte sequences invalid for the encoding
    #[error("Failed to decode {path} as {encoding}")]
    Decode {
        /// File being decoded
        path: String,
        /// Encoding name
        encoding: String,
    },

    /// The translated text contains characters the encoding cannot represent
    #[error("Failed to encode {path} as {encoding}")]
    Encode {
        /// File being encoded
        path: String,
        /// Encoding name
        encoding: String,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model declined to translate the line
    #[error("Model refused to translate the line")]
    Refused,

    /// The reply is implausibly long compared to the input
    #[error("Reply of {reply_chars} chars exceeds {max_ratio}x the input of {input_chars} chars")]
    OversizedReply {
        /// Characters in the cleaned reply
        reply_chars: usize,
        /// Characters in the input line
        input_chars: usize,
        /// Allowed reply/input ratio
        max_ratio: usize,
    },

    /// Every attempt failed; carries the last failure
    #[error("Translation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        #[source]
        last: Box<TranslationError>,
    },
}
