//! Error type for policy construction, signing and renewal.

use thiserror::Error;

use crate::policy::OptionKey;

/// Stable error codes (used in test vectors and HTTP bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Option name outside the allow-list.
    UnknownOption,
    /// One or more call names outside the vocabulary, or `call` is not a list.
    InvalidCallList,
    /// Expiry could not be coerced to an instant.
    InvalidExpiry,
    /// Renewal attempted without an associated secret.
    NotSignedYet,
    /// Argument of the wrong shape.
    InvalidArgument,
    /// Canonical document or HMAC setup failed.
    Encoding,
}

impl ErrorKind {
    /// String representation used in JSON bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnknownOption => "UNKNOWN_OPTION",
            ErrorKind::InvalidCallList => "INVALID_CALL_LIST",
            ErrorKind::InvalidExpiry => "INVALID_EXPIRY",
            ErrorKind::NotSignedYet => "NOT_SIGNED_YET",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Encoding => "ENCODING",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Everything that can go wrong while building or signing a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid security policy option: \"{option}\" is not one of {}", OptionKey::allowed_list())]
    UnknownOption { option: String },

    #[error("invalid security policy allowed calls: {detail}")]
    InvalidCallList {
        detail: String,
        /// Offending entries, in the order they were supplied.
        invalid: Vec<String>,
    },

    #[error("invalid security policy expiry: {reason}")]
    InvalidExpiry {
        reason: String,
        #[source]
        source: Option<chrono::ParseError>,
    },

    #[error("this policy hasn't been signed yet, so it can't be renewed")]
    NotSignedYet,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("encoding: {0}")]
    Encoding(String),
}

impl PolicyError {
    /// Map to a stable code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PolicyError::UnknownOption { .. } => ErrorKind::UnknownOption,
            PolicyError::InvalidCallList { .. } => ErrorKind::InvalidCallList,
            PolicyError::InvalidExpiry { .. } => ErrorKind::InvalidExpiry,
            PolicyError::NotSignedYet => ErrorKind::NotSignedYet,
            PolicyError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            PolicyError::Encoding(_) => ErrorKind::Encoding,
        }
    }

    pub(crate) fn invalid_calls(invalid: Vec<String>) -> Self {
        PolicyError::InvalidCallList {
            detail: invalid.join(", "),
            invalid,
        }
    }

    pub(crate) fn call_not_a_list() -> Self {
        PolicyError::InvalidCallList {
            detail: "\"call\" option must be an array".into(),
            invalid: Vec::new(),
        }
    }

    pub(crate) fn expiry(reason: impl Into<String>) -> Self {
        PolicyError::InvalidExpiry {
            reason: reason.into(),
            source: None,
        }
    }
}
