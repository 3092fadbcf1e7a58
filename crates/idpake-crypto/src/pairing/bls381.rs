//! BLS12-381 backend (arkworks)

use ark_bls12_381::{Bls12_381, Fq, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::UniformRand;
use rand::rngs::OsRng;

use crate::error::{CryptoError, Result};

/// Scalar encoding width
pub const ZR_BYTES: usize = 32;
/// Compressed G1 width (one base-field element)
pub const G1_BYTES: usize = 48;
/// Compressed G2 width (two base-field elements)
pub const G2_BYTES: usize = 96;
/// GT width (twelve base-field elements)
pub const GT_BYTES: usize = 576;

/// Scalar in the pairing group order, cleared on drop.
#[derive(Clone)]
pub struct Zr(Fr);

impl Zr {
    /// Uniformly random scalar.
    pub fn random() -> Self {
        Zr(Fr::rand(&mut OsRng))
    }
}

impl Drop for Zr {
    fn drop(&mut self) {
        self.0 = Fr::zero();
    }
}

/// Element of the first pairing source group.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct G1(G1Affine);

impl G1 {
    /// Map a hash output to a curve point.
    ///
    /// Interprets the hash as a little-endian base-field element and walks
    /// x-candidates until one lands on the curve. The cofactor clearing puts
    /// the result in the prime-order subgroup.
    pub fn from_hash(hash: &[u8]) -> Self {
        let mut x = Fq::from_le_bytes_mod_order(hash);
        loop {
            if let Some(p) = G1Affine::get_point_from_x_unchecked(x, false) {
                return G1(p.clear_cofactor());
            }
            x += Fq::one();
        }
    }

    /// `self^exp`
    pub fn pow(&self, exp: &Zr) -> Self {
        G1((G1Projective::from(self.0) * exp.0).into_affine())
    }

    /// Compressed encoding.
    pub fn serialize(&self) -> Result<[u8; G1_BYTES]> {
        serialize_element(&self.0)
    }

    /// Decode a compressed encoding, validating curve and subgroup membership.
    pub fn deserialize(bytes: &[u8; G1_BYTES]) -> Result<Self> {
        G1Affine::deserialize_compressed(&bytes[..])
            .map(G1)
            .map_err(|_| CryptoError::InvalidEncoding("invalid G1 element".into()))
    }
}

/// Element of the second pairing source group.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct G2(G2Affine);

impl G2 {
    /// The built-in generator.
    pub fn generator() -> Self {
        G2(G2Affine::generator())
    }

    /// `self^exp`
    pub fn pow(&self, exp: &Zr) -> Self {
        G2((G2Projective::from(self.0) * exp.0).into_affine())
    }

    /// Identity (point at infinity) test.
    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }

    /// Compressed encoding.
    pub fn serialize(&self) -> Result<[u8; G2_BYTES]> {
        serialize_element(&self.0)
    }

    /// Decode a compressed encoding, validating curve and subgroup membership.
    pub fn deserialize(bytes: &[u8; G2_BYTES]) -> Result<Self> {
        G2Affine::deserialize_compressed(&bytes[..])
            .map(G2)
            .map_err(|_| CryptoError::InvalidEncoding("invalid G2 element".into()))
    }
}

/// Element of the pairing target group.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Gt(PairingOutput<Bls12_381>);

impl Gt {
    /// `e(p, q)`
    pub fn pairing(p: &G1, q: &G2) -> Self {
        Gt(Bls12_381::pairing(p.0, q.0))
    }

    /// Canonical encoding, used only as hash input.
    pub fn serialize(&self) -> Result<[u8; GT_BYTES]> {
        serialize_element(&self.0)
    }
}

fn serialize_element<T: CanonicalSerialize, const N: usize>(element: &T) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    element
        .serialize_compressed(&mut buf[..])
        .map_err(|e| CryptoError::Internal(format!("serialization: {}", e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_g1_roundtrip() {
        let p = G1::from_hash(b"some hash output").pow(&Zr::random());
        let decoded = G1::deserialize(&p.serialize().unwrap()).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn test_g2_roundtrip() {
        let p = G2::generator().pow(&Zr::random());
        let decoded = G2::deserialize(&p.serialize().unwrap()).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(G1::deserialize(&[0xFF; G1_BYTES]).is_err());
        assert!(G2::deserialize(&[0xFF; G2_BYTES]).is_err());
    }

    #[test]
    fn test_generator_not_identity() {
        assert!(!G2::generator().is_identity());
    }

    #[test]
    fn test_bilinearity() {
        // e(H^x, g2) = e(H, g2^x)
        let x = Zr::random();
        let h = G1::from_hash(b"base point");
        let g2 = G2::generator();
        assert_eq!(
            Gt::pairing(&h.pow(&x), &g2),
            Gt::pairing(&h, &g2.pow(&x))
        );
    }
}
