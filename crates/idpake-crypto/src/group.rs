//! Ristretto255 scalar and point helpers
//!
//! Thin wrappers over `curve25519-dalek` giving the suite one place that
//! owns encoding widths and validation behavior. Deserialization validates;
//! scalar multiplication rejects an identity result the way libsodium's
//! `crypto_scalarmult_ristretto255` does, so a degenerate peer contribution
//! is fatal instead of silently collapsing the key space.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand_core::OsRng;

use crate::error::{CryptoError, Result};

/// Scalar encoding width
pub const SCALAR_BYTES: usize = 32;
/// Point encoding width
pub const POINT_BYTES: usize = 32;
/// Non-reduced scalar width (uniform hash image)
pub const WIDE_BYTES: usize = 64;

/// Uniformly random scalar.
pub fn scalar_random() -> Scalar {
    Scalar::random(&mut OsRng)
}

/// Reduce a 64-byte hash image to a scalar.
pub fn scalar_reduce(wide: &[u8; WIDE_BYTES]) -> Scalar {
    Scalar::from_bytes_mod_order_wide(wide)
}

/// Decode a scalar from its canonical 32-byte encoding.
pub fn scalar_decode(bytes: &[u8; SCALAR_BYTES]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(*bytes))
        .ok_or_else(|| CryptoError::InvalidEncoding("non-canonical scalar".into()))
}

/// `s·G` for the Ristretto255 basepoint `G`.
pub fn base_mul(s: &Scalar) -> RistrettoPoint {
    RistrettoPoint::mul_base(s)
}

/// Map a 64-byte hash image uniformly onto the group.
pub fn point_from_hash(wide: &[u8; WIDE_BYTES]) -> RistrettoPoint {
    RistrettoPoint::from_uniform_bytes(wide)
}

/// Decode and validate a 32-byte point encoding.
pub fn point_decode(bytes: &[u8; POINT_BYTES]) -> Result<RistrettoPoint> {
    CompressedRistretto(*bytes)
        .decompress()
        .ok_or_else(|| CryptoError::InvalidEncoding("invalid ristretto255 point".into()))
}

/// Canonical 32-byte point encoding.
pub fn point_encode(p: &RistrettoPoint) -> [u8; POINT_BYTES] {
    p.compress().to_bytes()
}

/// `s·P`, failing if the result is the identity element.
pub fn scalar_mul_point(s: &Scalar, p: &RistrettoPoint) -> Result<RistrettoPoint> {
    let q = s * p;
    if q == RistrettoPoint::identity() {
        return Err(CryptoError::InvalidEncoding(
            "scalar multiplication yielded the identity".into(),
        ));
    }
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_roundtrip() {
        let p = base_mul(&scalar_random());
        let decoded = point_decode(&point_encode(&p)).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn test_invalid_point_rejected() {
        // 0xFF... is not a canonical field element
        assert!(point_decode(&[0xFF; POINT_BYTES]).is_err());
    }

    #[test]
    fn test_identity_result_rejected() {
        let p = base_mul(&scalar_random());
        assert!(scalar_mul_point(&Scalar::ZERO, &p).is_err());
    }

    #[test]
    fn test_from_hash_differs_by_input() {
        let a = point_from_hash(&[1u8; WIDE_BYTES]);
        let b = point_from_hash(&[2u8; WIDE_BYTES]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_scalar_decode_canonical() {
        let s = scalar_random();
        assert_eq!(scalar_decode(&s.to_bytes()).unwrap(), s);
        assert!(scalar_decode(&[0xFF; SCALAR_BYTES]).is_err());
    }
}
