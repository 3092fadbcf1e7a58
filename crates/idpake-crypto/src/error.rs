//! Error types for cryptographic operations

use thiserror::Error;

/// Result type alias using CryptoError
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during enrollment or key exchange.
///
/// Every error is fatal to its session: state is dropped (secret scalars
/// zeroized) and no key material is emitted. `AuthenticationFailure`
/// deliberately carries no detail, so a wrong password cannot be told apart
/// from a tampered message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Caller-supplied input is unusable (identity too long, bad record path)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A received or stored byte string fails validation
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The peer could not prove knowledge of the password or identity
    #[error("authentication failure")]
    AuthenticationFailure,

    /// Failure inside an underlying library
    #[error("internal error: {0}")]
    Internal(String),
}
