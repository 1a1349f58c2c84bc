//! Error types for ciscoauth.

use thiserror::Error;

/// Main error type for all ciscoauth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A pin-requiring method was invoked without a pin.
    #[error("method '{0}' requires a pin")]
    PinRequired(&'static str),

    /// Authentication request token did not match any known request kind.
    #[error("unknown authentication request kind: {0}")]
    UnknownRequestKind(String),

    /// Keypad key outside the accepted set (digits, '*', '#').
    #[error("invalid keypad key: {0:?}")]
    InvalidKey(char),

    /// Keypad key index outside the 0-11 keypad layout.
    #[error("invalid keypad key index: {0}")]
    InvalidKeyIndex(usize),

    /// Keypad input while a submission is being checked.
    #[error("keypad is disabled while a submission is pending")]
    SubmissionPending,

    /// Handler was built outside a Tokio runtime.
    #[error("no tokio runtime available for the retry timer")]
    NoRuntime,
}

/// Result type alias using AuthError.
pub type Result<T> = std::result::Result<T, AuthError>;
