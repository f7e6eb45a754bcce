//! Error types and handling for ejp-knx
//!
//! Every failure in a run is terminal. Components return these errors with `?`
//! and only the binary entry point decides to stop the process.

use thiserror::Error;

/// Result type alias for ejp-knx operations
pub type Result<T> = std::result::Result<T, EjpError>;

/// Main error type for ejp-knx
#[derive(Debug, Error)]
pub enum EjpError {
    /// Configuration file could not be opened or read
    #[error("File access error: {path} - {message}")]
    FileAccess { path: String, message: String },

    /// Configuration document is malformed or has the wrong shape
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A loaded value is outside its accepted range
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Transport failure talking to the tariff API
    #[error("Network error: {message}")]
    Network { message: String },

    /// Tariff API body is not the expected JSON document
    #[error("Response decode error: {message}")]
    ResponseDecode { message: String },

    /// Group address text is not a valid KNX group address
    #[error("Address format error: {address} - {message}")]
    AddressFormat { address: String, message: String },

    /// Bus connection or write failure
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl EjpError {
    /// Create a new file access error
    pub fn file_access<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        EjpError::FileAccess {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        EjpError::Parse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        EjpError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        EjpError::Network {
            message: message.into(),
        }
    }

    /// Create a new response decode error
    pub fn response_decode<S: Into<String>>(message: S) -> Self {
        EjpError::ResponseDecode {
            message: message.into(),
        }
    }

    /// Create a new address format error
    pub fn address_format<A: Into<String>, S: Into<String>>(address: A, message: S) -> Self {
        EjpError::AddressFormat {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        EjpError::Transport {
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for EjpError {
    fn from(err: serde_yaml::Error) -> Self {
        EjpError::parse(err.to_string())
    }
}

impl From<serde_json::Error> for EjpError {
    fn from(err: serde_json::Error) -> Self {
        EjpError::response_decode(err.to_string())
    }
}

impl From<reqwest::Error> for EjpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return EjpError::response_decode(err.to_string());
        }
        if err.is_timeout() {
            return EjpError::network(format!("request timed out: {}", err));
        }
        EjpError::network(err.to_string())
    }
}
