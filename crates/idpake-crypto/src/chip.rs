//! CHIP - identity-bound Schnorr-style PAKE over Ristretto255
//!
//! Enrollment derives a per-identity record from the password: a static key
//! pair `(x, X)`, a password point `Y = y·G` with `y` stretched out of the
//! password, and the aggregate `z = x + y·h` binding identity and network
//! tag. The online exchange is a single message pair `(ID, X, R)` from which
//! both sides derive a common secret `S`, handed to the CPace finisher for
//! the session key. Mismatched passwords or identities yield disjoint `S`
//! values, so CPace simply fails to agree.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};
use crate::group;
use crate::hash::{tagged_hash_32, tagged_hash_64};
use crate::identity::{Identity, MAX_ID};
use crate::kdf::{self, PwHashProfile};
use crate::pake::{cpace, KeyAgreement};

const DSI_SALT: &str = "CHIP-1";
const DSI_ID: &str = "CHIP-2";
const DSI_SECRET: &str = "CHIP-4";

/// First-round message width: identity, static key, ephemeral
pub const HELLO_BYTES: usize = MAX_ID + 2 * group::POINT_BYTES;

/// Fixed-width tail of a record after the NUL-terminated network tag
const RECORD_TAIL: usize = MAX_ID + 2 * group::POINT_BYTES + group::SCALAR_BYTES;

/// A CHIP enrollment record, created offline by a trusted authority.
pub struct Record {
    net: Vec<u8>,
    id: Identity,
    big_x: RistrettoPoint,
    big_y: RistrettoPoint,
    z: Scalar,
}

impl Drop for Record {
    fn drop(&mut self) {
        self.z.zeroize();
    }
}

impl Record {
    /// Derive a record from a password.
    pub fn enroll(
        net: &[u8],
        password: &[u8],
        id: &Identity,
        profile: PwHashProfile,
    ) -> Result<Self> {
        if net.contains(&0) {
            return Err(CryptoError::InvalidArgument(
                "network tag must not contain NUL".into(),
            ));
        }

        // salt = H1(net); y = reduce(Argon2id(password, salt))
        let salt = tagged_hash_32(DSI_SALT, &[net]);
        let mut pwd_hash = [0u8; 64];
        kdf::password_hash(&mut pwd_hash, password, &salt, profile)?;
        let mut y = group::scalar_reduce(&pwd_hash);
        pwd_hash.zeroize();
        let big_y = group::base_mul(&y);

        let mut x = group::scalar_random();
        let big_x = group::base_mul(&x);

        // z = x + y·H2(net, ID, X)
        let h = group::scalar_reduce(&tagged_hash_64(
            DSI_ID,
            &[net, id.as_bytes(), &group::point_encode(&big_x)],
        ));
        let z = x + y * h;
        x.zeroize();
        y.zeroize();

        Ok(Record {
            net: net.to_vec(),
            id: *id,
            big_x,
            big_y,
            z,
        })
    }

    /// Network tag this record belongs to.
    pub fn network(&self) -> &[u8] {
        &self.net
    }

    /// Enrolled identity.
    pub fn identity(&self) -> &Identity {
        &self.id
    }

    /// Serialize as `net ‖ 0 ‖ ID ‖ X ‖ Y ‖ z`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.net.len() + 1 + RECORD_TAIL);
        out.extend_from_slice(&self.net);
        out.push(0);
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&group::point_encode(&self.big_x));
        out.extend_from_slice(&group::point_encode(&self.big_y));
        out.extend_from_slice(&self.z.to_bytes());
        out
    }

    /// Parse and validate a serialized record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| CryptoError::InvalidEncoding("record missing network tag".into()))?;
        let net = bytes[..nul].to_vec();
        let rest = &bytes[nul + 1..];
        if rest.len() != RECORD_TAIL {
            return Err(CryptoError::InvalidEncoding("record truncated".into()));
        }

        let mut id = [0u8; MAX_ID];
        id.copy_from_slice(&rest[..MAX_ID]);
        let mut x_bytes = [0u8; group::POINT_BYTES];
        x_bytes.copy_from_slice(&rest[MAX_ID..MAX_ID + 32]);
        let mut y_bytes = [0u8; group::POINT_BYTES];
        y_bytes.copy_from_slice(&rest[MAX_ID + 32..MAX_ID + 64]);
        let mut z_bytes = [0u8; group::SCALAR_BYTES];
        z_bytes.copy_from_slice(&rest[MAX_ID + 64..]);

        Ok(Record {
            net,
            id: Identity::from_padded(id),
            big_x: group::point_decode(&x_bytes)?,
            big_y: group::point_decode(&y_bytes)?,
            z: group::scalar_decode(&z_bytes)?,
        })
    }
}

/// One side of a CHIP exchange.
///
/// Samples the ephemeral `r` on construction; the record is borrowed
/// read-only for the session's lifetime.
pub struct Exchange<'a> {
    record: &'a Record,
    r: Scalar,
    big_r: RistrettoPoint,
}

impl Drop for Exchange<'_> {
    fn drop(&mut self) {
        self.r.zeroize();
    }
}

impl<'a> Exchange<'a> {
    /// Start an exchange from an enrollment record.
    pub fn start(record: &'a Record) -> Self {
        let r = group::scalar_random();
        let big_r = group::base_mul(&r);
        Exchange { record, r, big_r }
    }

    /// Outgoing first-round message `IDᵢ ‖ Xᵢ ‖ Rᵢ`.
    pub fn hello(&self) -> [u8; HELLO_BYTES] {
        let mut out = [0u8; HELLO_BYTES];
        out[..MAX_ID].copy_from_slice(self.record.id.as_bytes());
        out[MAX_ID..MAX_ID + 32].copy_from_slice(&group::point_encode(&self.record.big_x));
        out[MAX_ID + 32..].copy_from_slice(&group::point_encode(&self.big_r));
        out
    }

    /// Consume the peer's first-round message and derive the CPace leg.
    pub fn receive(self, peer_hello: &[u8; HELLO_BYTES]) -> Result<KeyAgreement> {
        let mut id_bytes = [0u8; MAX_ID];
        id_bytes.copy_from_slice(&peer_hello[..MAX_ID]);
        let id_j = Identity::from_padded(id_bytes);
        let mut xj_bytes = [0u8; group::POINT_BYTES];
        xj_bytes.copy_from_slice(&peer_hello[MAX_ID..MAX_ID + 32]);
        let mut rj_bytes = [0u8; group::POINT_BYTES];
        rj_bytes.copy_from_slice(&peer_hello[MAX_ID + 32..]);

        let xj = group::point_decode(&xj_bytes)?;
        let rj = group::point_decode(&rj_bytes)?;

        let ri_bytes = group::point_encode(&self.big_r);
        let is_first = ri_bytes.as_slice() >= rj_bytes.as_slice();

        // A = Rj^r
        let a = group::scalar_mul_point(&self.r, &rj)?;

        // hj = H2(net, IDj, Xj)
        let hj = group::scalar_reduce(&tagged_hash_64(
            DSI_ID,
            &[&self.record.net, id_j.as_bytes(), &xj_bytes],
        ));

        // B = (Rj · Xj · Y^hj)^(r + zᵢ)
        let base = rj + xj + group::scalar_mul_point(&hj, &self.record.big_y)?;
        let b = group::scalar_mul_point(&(self.r + self.record.z), &base)?;

        let id_i = self.record.id.as_bytes();
        let xi_bytes = group::point_encode(&self.record.big_x);
        let mine: [&[u8]; 3] = [id_i, &xi_bytes, &ri_bytes];
        let theirs: [&[u8]; 3] = [id_j.as_bytes(), &xj_bytes, &rj_bytes];
        let (first, second) = if is_first {
            (mine, theirs)
        } else {
            (theirs, mine)
        };

        let s = tagged_hash_32(
            DSI_SECRET,
            &[
                &group::point_encode(&a),
                &group::point_encode(&b),
                first[0],
                first[1],
                first[2],
                second[0],
                second[1],
                second[2],
            ],
        );

        let pake = cpace::Session::new(
            is_first,
            b"",
            &s,
            id_i,
            id_j.as_bytes(),
            &self.record.net,
        )?;
        Ok(KeyAgreement { pake, peer: id_j })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PROFILE: PwHashProfile = PwHashProfile {
        t_cost: 1,
        m_cost_kib: 8,
    };

    fn enroll(net: &[u8], password: &[u8], id: &[u8]) -> Record {
        Record::enroll(
            net,
            password,
            &Identity::new(id).unwrap(),
            TEST_PROFILE,
        )
        .unwrap()
    }

    fn run(a: &Record, b: &Record) -> ([u8; 32], [u8; 32]) {
        let ex_a = Exchange::start(a);
        let ex_b = Exchange::start(b);
        let hello_a = ex_a.hello();
        let hello_b = ex_b.hello();

        let leg_a = ex_a.receive(&hello_b).unwrap();
        let leg_b = ex_b.receive(&hello_a).unwrap();
        assert_eq!(leg_a.peer_identity(), b.identity());
        assert_eq!(leg_b.peer_identity(), a.identity());

        let msg_a = leg_a.message();
        let msg_b = leg_b.message();
        (leg_a.finish(&msg_b).unwrap(), leg_b.finish(&msg_a).unwrap())
    }

    #[test]
    fn test_agreement() {
        let a = enroll(b"demo", b"open sesame", b"alice");
        let b = enroll(b"demo", b"open sesame", b"bob");
        let (ka, kb) = run(&a, &b);
        assert_eq!(ka, kb);
    }

    #[test]
    fn test_wrong_password_diverges() {
        let a = enroll(b"demo", b"open sesame", b"alice");
        let b = enroll(b"demo", b"open charlatan", b"bob");
        let (ka, kb) = run(&a, &b);
        assert_ne!(ka, kb);
    }

    #[test]
    fn test_network_is_bound() {
        let a = enroll(b"demo", b"open sesame", b"alice");
        let b = enroll(b"prod", b"open sesame", b"bob");
        let (ka, kb) = run(&a, &b);
        assert_ne!(ka, kb);
    }

    #[test]
    fn test_record_roundtrip() {
        let record = enroll(b"demo", b"open sesame", b"alice");
        let parsed = Record::from_bytes(&record.to_bytes()).unwrap();
        assert_eq!(parsed.network(), record.network());
        assert_eq!(parsed.identity(), record.identity());
        assert_eq!(parsed.to_bytes(), record.to_bytes());
    }

    #[test]
    fn test_truncated_record_rejected() {
        let bytes = enroll(b"demo", b"pwd", b"alice").to_bytes();
        assert!(Record::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_nul_in_network_rejected() {
        assert!(Record::enroll(
            b"de\0mo",
            b"pwd",
            &Identity::new(b"alice").unwrap(),
            TEST_PROFILE
        )
        .is_err());
    }

    #[test]
    fn test_tampered_hello_fatal() {
        let a = enroll(b"demo", b"pwd", b"alice");
        let b = enroll(b"demo", b"pwd", b"bob");
        let ex_a = Exchange::start(&a);
        let mut hello_b = Exchange::start(&b).hello();
        hello_b[MAX_ID..].fill(0xFF);
        assert!(ex_a.receive(&hello_b).is_err());
    }
}
