//! CRISP - pairing-based identity-verified PAKE
//!
//! Enrollment lifts the password and the identity into the pairing groups:
//! `A = g₂^x`, `B = H₁(pwd)^x`, `C = H₁(id)^x` under a per-record secret
//! `x`. Online, each side re-blinds its triple with a fresh `r`, exchanges
//! `(ID, A, C)`, computes `t = e(Bᵢ, Aⱼ)` as the shared-secret seed, and
//! proves its identity through the pairing equation
//! `e(Cⱼ, g₂) = e(H₁(IDⱼ), Aⱼ)`. The session key comes out of the CPace
//! finisher, so the pairing check can run while the CPace messages are in
//! flight.

use zeroize::Zeroize;

use crate::error::{CryptoError, Result};
use crate::hash::tagged_hash_32;
use crate::identity::{Identity, MAX_ID};
use crate::kdf::{self, PwHashProfile};
use crate::pairing::{Gt, Zr, G1, G1_BYTES, G2, G2_BYTES};
use crate::pake::{cpace, KeyAgreement};

const DSI_SALT: &str = "CRISP-1";
const DSI_ID: &str = "CRISP-2";
const DSI_SECRET: &str = "CRISP-4";

/// First-round message width: identity, blinded `A`, blinded `C`
pub const HELLO_BYTES: usize = MAX_ID + G2_BYTES + G1_BYTES;

/// Fixed-width tail of a record after the NUL-terminated network tag
const RECORD_TAIL: usize = MAX_ID + 2 * G2_BYTES + 2 * G1_BYTES;

/// A CRISP enrollment record, created offline by a trusted authority.
pub struct Record {
    net: Vec<u8>,
    id: Identity,
    g2: G2,
    a: G2,
    b: G1,
    c: G1,
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

        // salt = H1(net)
        let salt = tagged_hash_32(DSI_SALT, &[net]);
        let mut pwd_hash = [0u8; 32];
        kdf::password_hash(&mut pwd_hash, password, &salt, profile)?;
        let id_hash = tagged_hash_32(DSI_ID, &[net, id.as_bytes()]);

        // A = g₂^x, B = H₁(pwd)^x, C = H₁(id)^x
        let g2 = G2::generator();
        let x = Zr::random();
        let a = g2.pow(&x);
        let b = G1::from_hash(&pwd_hash).pow(&x);
        let c = G1::from_hash(&id_hash).pow(&x);
        pwd_hash.zeroize();

        Ok(Record {
            net: net.to_vec(),
            id: *id,
            g2,
            a,
            b,
            c,
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

    /// Serialize as `net ‖ 0 ‖ ID ‖ g₂ ‖ A ‖ B ‖ C`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.net.len() + 1 + RECORD_TAIL);
        out.extend_from_slice(&self.net);
        out.push(0);
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&self.g2.serialize()?);
        out.extend_from_slice(&self.a.serialize()?);
        out.extend_from_slice(&self.b.serialize()?);
        out.extend_from_slice(&self.c.serialize()?);
        Ok(out)
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
        let mut g2_bytes = [0u8; G2_BYTES];
        g2_bytes.copy_from_slice(&rest[MAX_ID..MAX_ID + G2_BYTES]);
        let mut a_bytes = [0u8; G2_BYTES];
        a_bytes.copy_from_slice(&rest[MAX_ID + G2_BYTES..MAX_ID + 2 * G2_BYTES]);
        let mut b_bytes = [0u8; G1_BYTES];
        b_bytes.copy_from_slice(&rest[MAX_ID + 2 * G2_BYTES..MAX_ID + 2 * G2_BYTES + G1_BYTES]);
        let mut c_bytes = [0u8; G1_BYTES];
        c_bytes.copy_from_slice(&rest[MAX_ID + 2 * G2_BYTES + G1_BYTES..]);

        Ok(Record {
            net,
            id: Identity::from_padded(id),
            g2: G2::deserialize(&g2_bytes)?,
            a: G2::deserialize(&a_bytes)?,
            b: G1::deserialize(&b_bytes)?,
            c: G1::deserialize(&c_bytes)?,
        })
    }
}

/// One side of a CRISP exchange.
///
/// Construction re-blinds the record under a fresh `r`, which is zeroized
/// immediately; the blinded triple is all the session keeps.
pub struct Exchange<'a> {
    record: &'a Record,
    a_bytes: [u8; G2_BYTES],
    c_bytes: [u8; G1_BYTES],
    b: G1,
}

impl<'a> Exchange<'a> {
    /// Start an exchange from an enrollment record.
    pub fn start(record: &'a Record) -> Result<Self> {
        let r = Zr::random();
        let a = record.a.pow(&r);
        let b = record.b.pow(&r);
        let c = record.c.pow(&r);
        drop(r);

        Ok(Exchange {
            record,
            a_bytes: a.serialize()?,
            c_bytes: c.serialize()?,
            b,
        })
    }

    /// Outgoing first-round message `IDᵢ ‖ Aᵢ ‖ Cᵢ`.
    pub fn hello(&self) -> [u8; HELLO_BYTES] {
        let mut out = [0u8; HELLO_BYTES];
        out[..MAX_ID].copy_from_slice(self.record.id.as_bytes());
        out[MAX_ID..MAX_ID + G2_BYTES].copy_from_slice(&self.a_bytes);
        out[MAX_ID + G2_BYTES..].copy_from_slice(&self.c_bytes);
        out
    }

    /// Consume the peer's first-round message.
    ///
    /// Returns the CPace leg together with a [`Verifier`] holding the
    /// pairing check; callers may run the check while the CPace round-trip
    /// is in flight, but must not release the session key before it passes.
    pub fn receive(self, peer_hello: &[u8; HELLO_BYTES]) -> Result<(KeyAgreement, Verifier)> {
        let mut id_bytes = [0u8; MAX_ID];
        id_bytes.copy_from_slice(&peer_hello[..MAX_ID]);
        let id_j = Identity::from_padded(id_bytes);
        let mut aj_bytes = [0u8; G2_BYTES];
        aj_bytes.copy_from_slice(&peer_hello[MAX_ID..MAX_ID + G2_BYTES]);
        let mut cj_bytes = [0u8; G1_BYTES];
        cj_bytes.copy_from_slice(&peer_hello[MAX_ID + G2_BYTES..]);

        let aj = G2::deserialize(&aj_bytes)?;
        let cj = G1::deserialize(&cj_bytes)?;

        // t = e(Bᵢ, Aⱼ)
        let t = Gt::pairing(&self.b, &aj);

        let is_first = self.a_bytes.as_slice() >= aj_bytes.as_slice();

        let id_i = self.record.id.as_bytes();
        let mine: [&[u8]; 3] = [id_i, &self.a_bytes, &self.c_bytes];
        let theirs: [&[u8]; 3] = [id_j.as_bytes(), &aj_bytes, &cj_bytes];
        let (first, second) = if is_first {
            (mine, theirs)
        } else {
            (theirs, mine)
        };

        let s = tagged_hash_32(
            DSI_SECRET,
            &[
                &t.serialize()?,
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

        let verifier = Verifier {
            net: self.record.net.clone(),
            g2: self.record.g2.clone(),
            id_j,
            aj,
            cj,
        };
        Ok((KeyAgreement { pake, peer: id_j }, verifier))
    }
}

/// Deferred identity verification for a CRISP peer.
pub struct Verifier {
    net: Vec<u8>,
    g2: G2,
    id_j: Identity,
    aj: G2,
    cj: G1,
}

impl Verifier {
    /// Check the peer's identity proof; any failure is fatal.
    ///
    /// Rejects a degenerate `Aⱼ` outright (deserialization has already
    /// checked curve and subgroup membership, this catches the identity
    /// element), then requires `e(Cⱼ, g₂) = e(H₁(IDⱼ), Aⱼ)`.
    pub fn verify(self) -> Result<()> {
        if self.aj.is_identity() {
            return Err(CryptoError::AuthenticationFailure);
        }

        let id_hash = tagged_hash_32(DSI_ID, &[&self.net, self.id_j.as_bytes()]);
        let hj = G1::from_hash(&id_hash);
        if Gt::pairing(&self.cj, &self.g2) != Gt::pairing(&hj, &self.aj) {
            return Err(CryptoError::AuthenticationFailure);
        }
        Ok(())
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
        Record::enroll(net, password, &Identity::new(id).unwrap(), TEST_PROFILE).unwrap()
    }

    fn run(a: &Record, b: &Record) -> ([u8; 32], [u8; 32]) {
        let ex_a = Exchange::start(a).unwrap();
        let ex_b = Exchange::start(b).unwrap();
        let hello_a = ex_a.hello();
        let hello_b = ex_b.hello();

        let (leg_a, ver_a) = ex_a.receive(&hello_b).unwrap();
        let (leg_b, ver_b) = ex_b.receive(&hello_a).unwrap();
        ver_a.verify().unwrap();
        ver_b.verify().unwrap();

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
    fn test_identity_forgery_detected() {
        let a = enroll(b"demo", b"pwd", b"alice");
        let b = enroll(b"demo", b"pwd", b"bob");
        let ex_a = Exchange::start(&a).unwrap();
        let mut hello_b = Exchange::start(&b).unwrap().hello();

        // Replace Cⱼ with an unrelated (well-formed) G1 element.
        let forged = G1::from_hash(b"forged").serialize().unwrap();
        hello_b[MAX_ID + G2_BYTES..].copy_from_slice(&forged);

        let (_leg, verifier) = ex_a.receive(&hello_b).unwrap();
        assert_eq!(
            verifier.verify().unwrap_err(),
            CryptoError::AuthenticationFailure
        );
    }

    #[test]
    fn test_malformed_point_fatal() {
        let a = enroll(b"demo", b"pwd", b"alice");
        let b = enroll(b"demo", b"pwd", b"bob");
        let ex_a = Exchange::start(&a).unwrap();
        let mut hello_b = Exchange::start(&b).unwrap().hello();
        hello_b[MAX_ID..MAX_ID + G2_BYTES].fill(0xFF);
        assert!(ex_a.receive(&hello_b).is_err());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = enroll(b"demo", b"pwd", b"alice");
        let parsed = Record::from_bytes(&record.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.network(), record.network());
        assert_eq!(parsed.identity(), record.identity());
        assert_eq!(parsed.to_bytes().unwrap(), record.to_bytes().unwrap());
    }
}
