//! Exit code constants

use idpake_crypto::CryptoError;
use idpake_net::NetError;

/// Success exit code
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Authentication failure
pub const AUTH_FAILURE: i32 = 2;

/// Network error
pub const NETWORK_ERROR: i32 = 4;

/// Map an error chain onto an exit code.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if matches!(
        err.downcast_ref::<CryptoError>(),
        Some(CryptoError::AuthenticationFailure)
    ) {
        AUTH_FAILURE
    } else if err.downcast_ref::<NetError>().is_some() {
        NETWORK_ERROR
    } else {
        ERROR
    }
}
