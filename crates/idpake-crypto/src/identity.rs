//! Fixed-width identity encoding
//!
//! Identities are at most [`MAX_ID`] bytes and are right-padded with NUL to
//! exactly [`MAX_ID`]. All comparisons and hashes run over the full padded
//! width, so `"alice"` and `"alice\0"` are the same party and `"alice"` under
//! two different networks are not (the network tag is hashed alongside).

use std::fmt;

use crate::error::{CryptoError, Result};

/// Maximum identity length in bytes
pub const MAX_ID: usize = 16;

/// A NUL-padded identity, always exactly [`MAX_ID`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Identity([u8; MAX_ID]);

impl Identity {
    /// Pad `id` to [`MAX_ID`] bytes. Fails if it is longer than that.
    pub fn new(id: &[u8]) -> Result<Self> {
        if id.len() > MAX_ID {
            return Err(CryptoError::InvalidArgument(format!(
                "identity length should be <= {}, got {}",
                MAX_ID,
                id.len()
            )));
        }
        let mut padded = [0u8; MAX_ID];
        padded[..id.len()].copy_from_slice(id);
        Ok(Self(padded))
    }

    /// Wrap an already-padded identity, e.g. one read off the wire.
    pub fn from_padded(padded: [u8; MAX_ID]) -> Self {
        Self(padded)
    }

    /// Full padded width, the form that is hashed and sent.
    pub fn as_bytes(&self) -> &[u8; MAX_ID] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(MAX_ID);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pad_short_identity() {
        let id = Identity::new(b"alice").unwrap();
        assert_eq!(&id.as_bytes()[..5], b"alice");
        assert!(id.as_bytes()[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_full_width_identity() {
        let id = Identity::new(b"0123456789abcdef").unwrap();
        assert_eq!(id.as_bytes(), b"0123456789abcdef");
    }

    #[test]
    fn test_too_long_rejected() {
        assert!(Identity::new(b"0123456789abcdefg").is_err());
    }

    #[test]
    fn test_display_trims_padding() {
        let id = Identity::new(b"bob").unwrap();
        assert_eq!(id.to_string(), "bob");
    }

    proptest! {
        #[test]
        fn prop_padding(id in "[a-zA-Z0-9]{0,16}") {
            let padded = Identity::new(id.as_bytes()).unwrap();
            prop_assert_eq!(&padded.as_bytes()[..id.len()], id.as_bytes());
            prop_assert!(padded.as_bytes()[id.len()..].iter().all(|&b| b == 0));
        }
    }
}
