use std::string::FromUtf8Error;

use thiserror::Error;

use crate::result_code::ResultCode;

/// Main error type for ldapwire operations
#[derive(Error, Debug)]
pub enum LdapError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unknown result code: {0}")]
    UnknownResultCode(i64),

    #[error("Control {oid}: {message}")]
    Control { oid: String, message: String },

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("SASL bind failed with {code}: {message}")]
    SaslBind { code: ResultCode, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LdapError {
    /// Shorthand for a decode failure
    pub fn decode(message: impl Into<String>) -> Self {
        LdapError::Decode(message.into())
    }

    /// Shorthand for a construction-time validation failure
    pub fn invalid_request(message: impl Into<String>) -> Self {
        LdapError::InvalidRequest(message.into())
    }
}

/// Result type alias for ldapwire operations
pub type LdapResult<T> = Result<T, LdapError>;
