//! CPace finisher over Ristretto255
//!
//! A password-authenticated DH bound to a pre-existing high-entropy secret
//! (the transcript-derived `S` of CHIP or CRISP) and both identities. The
//! generator is derived from the secret, so peers whose transcripts diverged
//! in any way land on unrelated generators and cannot agree on a key.
//!
//! The generator hash pads `DSI₁ ‖ secret` with NULs to a SHA-512 block
//! boundary, keeping the whole secret inside the first compression-function
//! block. This layout is load-bearing for interop and must not change.

use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};
use crate::group;

const DSI1: &[u8] = b"CRISP-CPace-Ristretto255-1";
const DSI2: &[u8] = b"CRISP-CPace-Ristretto255-2";
const SHA512_BLOCK: usize = 128;

/// Width of the single message each side sends
pub const MSG_BYTES: usize = group::POINT_BYTES;
/// Width of the derived session key
pub const KEY_BYTES: usize = 32;

/// One side of a CPace run.
///
/// Owns the ephemeral scalar `x` and releases (zeroizes) it when the session
/// key is derived or the session is dropped.
pub struct Session {
    is_first: bool,
    sid: Vec<u8>,
    x: Scalar,
    msg: [u8; MSG_BYTES],
}

impl Drop for Session {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

impl Session {
    /// Start a session.
    ///
    /// `is_first` must already be agreed between the peers (both compute it
    /// from first-round values); it fixes the identity and message ordering
    /// inside the hashes. `pwd` is the high-entropy shared secret, `id_i`
    /// the caller's identity, `id_j` the peer's, `extra` optional additional
    /// data bound into the generator (the network tag for CHIP and CRISP).
    pub fn new(
        is_first: bool,
        sid: &[u8],
        pwd: &[u8],
        id_i: &[u8],
        id_j: &[u8],
        extra: &[u8],
    ) -> Result<Self> {
        if id_i.len() > u8::MAX as usize || id_j.len() > u8::MAX as usize {
            return Err(CryptoError::InvalidArgument(format!(
                "identity should be at most {} bytes long",
                u8::MAX
            )));
        }

        let (first_id, second_id) = if is_first { (id_i, id_j) } else { (id_j, id_i) };

        // h = H( DSI1 ‖ pwd ‖ zpad ‖ sid ‖ len(A) ‖ A ‖ len(B) ‖ B ‖ extra )
        let zpad = [0u8; SHA512_BLOCK];
        let pad_len = zpad.len().wrapping_sub(DSI1.len() + pwd.len()) & (zpad.len() - 1);
        let mut st = Sha512::new();
        st.update(DSI1);
        st.update(pwd);
        st.update(&zpad[..pad_len]);
        st.update(sid);
        st.update([first_id.len() as u8]);
        st.update(first_id);
        st.update([second_id.len() as u8]);
        st.update(second_id);
        st.update(extra);
        let mut h: [u8; 64] = st.finalize().into();

        // g = hash2curve(h), X = g^x
        let g = group::point_from_hash(&h);
        h.zeroize();
        let x = group::scalar_random();
        let big_x = group::scalar_mul_point(&x, &g)?;

        Ok(Session {
            is_first,
            sid: sid.to_vec(),
            x,
            msg: group::point_encode(&big_x),
        })
    }

    /// Outgoing message.
    pub fn message(&self) -> [u8; MSG_BYTES] {
        self.msg
    }

    /// Derive the session key from the peer's message.
    ///
    /// Fails if the peer's point does not decode or the DH result is
    /// degenerate; either way the caller cannot tell a malformed message
    /// from a password mismatch.
    pub fn key(self, peer_msg: &[u8; MSG_BYTES]) -> Result<[u8; KEY_BYTES]> {
        let y = group::point_decode(peer_msg)?;

        // K = Y^x
        let k = group::scalar_mul_point(&self.x, &y)?;

        // key = H( DSI2 ‖ sid ‖ K ‖ X_first ‖ X_second )
        let (first_msg, second_msg) = if self.is_first {
            (&self.msg, peer_msg)
        } else {
            (peer_msg, &self.msg)
        };
        let mut st = Sha256::new();
        st.update(DSI2);
        st.update(&self.sid);
        st.update(group::point_encode(&k));
        st.update(first_msg);
        st.update(second_msg);
        Ok(st.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pwd_a: &[u8], pwd_b: &[u8], extra_a: &[u8], extra_b: &[u8]) -> ([u8; 32], [u8; 32]) {
        let a = Session::new(true, b"", pwd_a, b"alice", b"bob", extra_a).unwrap();
        let b = Session::new(false, b"", pwd_b, b"bob", b"alice", extra_b).unwrap();
        let msg_a = a.message();
        let msg_b = b.message();
        (a.key(&msg_b).unwrap(), b.key(&msg_a).unwrap())
    }

    #[test]
    fn test_same_secret_agrees() {
        let (ka, kb) = run(b"shared secret", b"shared secret", b"net", b"net");
        assert_eq!(ka, kb);
    }

    #[test]
    fn test_different_secret_diverges() {
        let (ka, kb) = run(b"shared secret", b"other secret", b"net", b"net");
        assert_ne!(ka, kb);
    }

    #[test]
    fn test_extra_data_is_bound() {
        let (ka, kb) = run(b"shared secret", b"shared secret", b"net-1", b"net-2");
        assert_ne!(ka, kb);
    }

    #[test]
    fn test_role_ordering_is_symmetric() {
        // Both peers claiming first (or second) must not agree.
        let a = Session::new(true, b"", b"s", b"alice", b"bob", b"").unwrap();
        let b = Session::new(true, b"", b"s", b"bob", b"alice", b"").unwrap();
        let msg_a = a.message();
        let msg_b = b.message();
        assert_ne!(a.key(&msg_b).unwrap(), b.key(&msg_a).unwrap());
    }

    #[test]
    fn test_invalid_peer_point_fatal() {
        let a = Session::new(true, b"", b"s", b"alice", b"bob", b"").unwrap();
        assert!(a.key(&[0xFF; MSG_BYTES]).is_err());
    }

    #[test]
    fn test_overlong_identity_rejected() {
        let id = [b'a'; 256];
        assert!(Session::new(true, b"", b"s", &id, b"bob", b"").is_err());
    }
}
