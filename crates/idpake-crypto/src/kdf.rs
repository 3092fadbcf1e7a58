//! Argon2id password hashing for enrollment
//!
//! Enrollment stretches the password once, offline, with a network-derived
//! salt. The parameter profiles mirror libsodium's `OPSLIMIT`/`MEMLIMIT`
//! pairs; `SENSITIVE` is the enrollment default, `INTERACTIVE` exists so
//! tests do not spend seconds per record.

use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{CryptoError, Result};

/// Salt width consumed by Argon2id (prefix of a 32-byte tagged hash).
pub const SALT_BYTES: usize = 16;

/// An Argon2id cost profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwHashProfile {
    /// Number of passes
    pub t_cost: u32,
    /// Memory in KiB
    pub m_cost_kib: u32,
}

impl PwHashProfile {
    /// libsodium `OPSLIMIT_SENSITIVE` / `MEMLIMIT_SENSITIVE` (4 passes, 1 GiB)
    pub const SENSITIVE: Self = Self {
        t_cost: 4,
        m_cost_kib: 1_048_576,
    };

    /// libsodium `OPSLIMIT_INTERACTIVE` / `MEMLIMIT_INTERACTIVE` (2 passes, 64 MiB)
    pub const INTERACTIVE: Self = Self {
        t_cost: 2,
        m_cost_kib: 65_536,
    };
}

/// Argon2id over `password`, salted with the first [`SALT_BYTES`] of `salt`,
/// filling `out` (32 or 64 bytes depending on the caller's reduction).
pub fn password_hash(
    out: &mut [u8],
    password: &[u8],
    salt: &[u8; 32],
    profile: PwHashProfile,
) -> Result<()> {
    let params = Params::new(profile.m_cost_kib, profile.t_cost, 1, Some(out.len()))
        .map_err(|e| CryptoError::Internal(format!("argon2 params: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    argon2
        .hash_password_into(password, &salt[..SALT_BYTES], out)
        .map_err(|e| CryptoError::Internal(format!("argon2: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let salt = [7u8; 32];
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        password_hash(&mut a, b"open sesame", &salt, PwHashProfile::INTERACTIVE).unwrap();
        password_hash(&mut b, b"open sesame", &salt, PwHashProfile::INTERACTIVE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_salt_matters() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        password_hash(&mut a, b"pwd", &[0u8; 32], PwHashProfile::INTERACTIVE).unwrap();
        password_hash(&mut b, b"pwd", &[1u8; 32], PwHashProfile::INTERACTIVE).unwrap();
        assert_ne!(a.to_vec(), b.to_vec());
    }
}
