//! OPAQUE - augmented PAKE with a server-held envelope
//!
//! The server stores no password-equivalent: enrollment seals the client's
//! long-term key material in a secretbox whose key `rw` is derived through
//! an OPRF on the password (`β = k_s·α`, `α = r·H₁(pwd)`), so only a client
//! holding the password can unlock it. Online, three flights run an
//! HMQV-style exchange producing a session key and explicit confirmation
//! tags in both directions.
//!
//! Flights: client `(sid, ssid, X_u, α)` → server `(β, X_s, envelope, A_s)`
//! → client `A_u`. The client checks `A_s` before releasing `A_u`; the
//! server checks `A_u` before releasing the session key.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{OsRng, RngCore};
use salsa20::cipher::{KeyIvInit, StreamCipher};
use salsa20::XSalsa20;
use xsalsa20poly1305::aead::{AeadInPlace, KeyInit};
use xsalsa20poly1305::{Nonce, Tag, XSalsa20Poly1305};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};
use crate::group;
use crate::hash::{tagged_hash_32, tagged_hash_64};
use crate::identity::{Identity, MAX_ID};
use crate::mem::ct_eq;

const DSI_OPRF: &str = "OPAQUE-1";
const DSI_UNLOCK: &str = "OPAQUE-2";
const DSI_SSID: &str = "OPAQUE-3";
const DSI_EXPONENT: &str = "OPAQUE-4";
const DSI_KEY: &str = "OPAQUE-5";

/// Sub-session nonce width
pub const SSID_BYTES: usize = 16;
/// Key-confirmation tag width
pub const TAG_BYTES: usize = 32;

const SECRETBOX_MAC_BYTES: usize = 16;
const ENVELOPE_PLAIN_BYTES: usize = group::SCALAR_BYTES + 2 * group::POINT_BYTES;
/// Sealed envelope width (MAC-first, libsodium layout)
pub const ENVELOPE_BYTES: usize = SECRETBOX_MAC_BYTES + ENVELOPE_PLAIN_BYTES;
/// First flight width: `sid ‖ ssid ‖ X_u ‖ α`
pub const REQUEST_BYTES: usize = MAX_ID + SSID_BYTES + 2 * group::POINT_BYTES;
/// Second flight width: `β ‖ X_s ‖ envelope ‖ A_s`
pub const RESPONSE_BYTES: usize = 2 * group::POINT_BYTES + ENVELOPE_BYTES + TAG_BYTES;
/// Server password-file width: `k_s ‖ p_s ‖ P_s ‖ P_u ‖ envelope`
pub const FILE_BYTES: usize = 2 * group::SCALAR_BYTES + 2 * group::POINT_BYTES + ENVELOPE_BYTES;

/// Derive the on-disk record name for a client identity.
///
/// The identity must be alphanumeric; it is lowercased and suffixed with
/// `.pwd`. This is the single line of defense against path traversal, so
/// any other byte is rejected.
pub fn record_filename(sid: &Identity) -> Result<String> {
    let bytes = sid.as_bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(MAX_ID);
    let mut name = String::with_capacity(end + 4);
    for &b in &bytes[..end] {
        if !b.is_ascii_alphanumeric() {
            return Err(CryptoError::InvalidArgument(format!(
                "client ID contains invalid char: {:#04x}",
                b
            )));
        }
        name.push(b.to_ascii_lowercase() as char);
    }
    name.push_str(".pwd");
    Ok(name)
}

/// Per-user server state, created offline at enrollment.
pub struct ServerFile {
    k_s: Scalar,
    p_s: Scalar,
    p_s_pub: RistrettoPoint,
    p_u_pub: RistrettoPoint,
    envelope: [u8; ENVELOPE_BYTES],
}

impl Drop for ServerFile {
    fn drop(&mut self) {
        self.k_s.zeroize();
        self.p_s.zeroize();
    }
}

impl ServerFile {
    /// Enroll a password.
    pub fn enroll(password: &[u8]) -> Result<Self> {
        let k_s = group::scalar_random();
        let p_s = group::scalar_random();
        let mut p_u = group::scalar_random();
        let p_s_pub = group::base_mul(&p_s);
        let p_u_pub = group::base_mul(&p_u);

        // rw = H₂( pwd ‖ H₁(pwd)^k_s )
        let oprf_base = group::point_from_hash(&tagged_hash_64(DSI_OPRF, &[password]));
        let t = group::scalar_mul_point(&k_s, &oprf_base)?;
        let mut rw = tagged_hash_32(DSI_UNLOCK, &[password, &group::point_encode(&t)]);

        let envelope = seal_envelope(&rw, &p_u, &p_u_pub, &p_s_pub)?;
        rw.zeroize();
        p_u.zeroize();

        Ok(ServerFile {
            k_s,
            p_s,
            p_s_pub,
            p_u_pub,
            envelope,
        })
    }

    /// Serialize as `k_s ‖ p_s ‖ P_s ‖ P_u ‖ envelope`.
    ///
    /// `P_s` is not used by the server online; it is carried only so the
    /// file and the sealed envelope describe the same key material.
    pub fn to_bytes(&self) -> [u8; FILE_BYTES] {
        let mut out = [0u8; FILE_BYTES];
        out[..32].copy_from_slice(&self.k_s.to_bytes());
        out[32..64].copy_from_slice(&self.p_s.to_bytes());
        out[64..96].copy_from_slice(&group::point_encode(&self.p_s_pub));
        out[96..128].copy_from_slice(&group::point_encode(&self.p_u_pub));
        out[128..].copy_from_slice(&self.envelope);
        out
    }

    /// Parse and validate a serialized file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FILE_BYTES {
            return Err(CryptoError::InvalidEncoding(format!(
                "password file should be {} bytes, got {}",
                FILE_BYTES,
                bytes.len()
            )));
        }
        let mut k_s = [0u8; 32];
        k_s.copy_from_slice(&bytes[..32]);
        let mut p_s = [0u8; 32];
        p_s.copy_from_slice(&bytes[32..64]);
        let mut p_s_pub = [0u8; 32];
        p_s_pub.copy_from_slice(&bytes[64..96]);
        let mut p_u_pub = [0u8; 32];
        p_u_pub.copy_from_slice(&bytes[96..128]);
        let mut envelope = [0u8; ENVELOPE_BYTES];
        envelope.copy_from_slice(&bytes[128..]);

        Ok(ServerFile {
            k_s: group::scalar_decode(&k_s)?,
            p_s: group::scalar_decode(&p_s)?,
            p_s_pub: group::point_decode(&p_s_pub)?,
            p_u_pub: group::point_decode(&p_u_pub)?,
            envelope,
        })
    }

    /// Answer a client's first flight.
    ///
    /// Returns the response to send and the pending state holding the
    /// session key until the client's confirmation tag arrives.
    pub fn respond(&self, request: &Request) -> Result<(Pending, [u8; RESPONSE_BYTES])> {
        let mut x_s = group::scalar_random();
        let xs_bytes = group::point_encode(&group::base_mul(&x_s));

        // β = α^k_s
        let beta = group::scalar_mul_point(&self.k_s, &request.alpha)?;

        let ssid_pr = tagged_hash_32(
            DSI_SSID,
            &[request.sid.as_bytes(), &request.ssid, &request.alpha_bytes],
        );
        let (e_s, e_u) = exponents(&xs_bytes, &request.xu_bytes, &ssid_pr);

        // K = H( (X_u · P_u^e_u)^(x_s + e_s·p_s) )
        let base = request.xu + group::scalar_mul_point(&e_u, &self.p_u_pub)?;
        let k_point = group::scalar_mul_point(&(x_s + e_s * self.p_s), &base)?;
        x_s.zeroize();
        let mut k = tagged_hash_32(DSI_KEY, &[&group::point_encode(&k_point)]);
        let (sk, a_s, a_u) = expand_keys(&k, &ssid_pr);
        k.zeroize();

        let mut response = [0u8; RESPONSE_BYTES];
        response[..32].copy_from_slice(&group::point_encode(&beta));
        response[32..64].copy_from_slice(&xs_bytes);
        response[64..64 + ENVELOPE_BYTES].copy_from_slice(&self.envelope);
        response[64 + ENVELOPE_BYTES..].copy_from_slice(&a_s);

        Ok((Pending { sk, a_u }, response))
    }
}

/// A parsed and validated client first flight.
pub struct Request {
    sid: Identity,
    ssid: [u8; SSID_BYTES],
    xu: RistrettoPoint,
    xu_bytes: [u8; group::POINT_BYTES],
    alpha: RistrettoPoint,
    alpha_bytes: [u8; group::POINT_BYTES],
}

impl Request {
    /// Parse the first flight, validating both points.
    pub fn parse(bytes: &[u8; REQUEST_BYTES]) -> Result<Self> {
        let mut sid = [0u8; MAX_ID];
        sid.copy_from_slice(&bytes[..MAX_ID]);
        let mut ssid = [0u8; SSID_BYTES];
        ssid.copy_from_slice(&bytes[MAX_ID..MAX_ID + SSID_BYTES]);
        let mut xu_bytes = [0u8; group::POINT_BYTES];
        xu_bytes.copy_from_slice(&bytes[MAX_ID + SSID_BYTES..MAX_ID + SSID_BYTES + 32]);
        let mut alpha_bytes = [0u8; group::POINT_BYTES];
        alpha_bytes.copy_from_slice(&bytes[MAX_ID + SSID_BYTES + 32..]);

        Ok(Request {
            sid: Identity::from_padded(sid),
            ssid,
            xu: group::point_decode(&xu_bytes)?,
            xu_bytes,
            alpha: group::point_decode(&alpha_bytes)?,
            alpha_bytes,
        })
    }

    /// Claimed client identity, used to locate the password file.
    pub fn sid(&self) -> &Identity {
        &self.sid
    }
}

/// Server state awaiting the client's confirmation tag.
pub struct Pending {
    sk: [u8; 32],
    a_u: [u8; TAG_BYTES],
}

impl Drop for Pending {
    fn drop(&mut self) {
        self.sk.zeroize();
    }
}

impl Pending {
    /// Verify the client's tag and release the session key.
    pub fn confirm(self, tag: &[u8; TAG_BYTES]) -> Result<[u8; 32]> {
        if !ct_eq(&self.a_u, tag) {
            return Err(CryptoError::AuthenticationFailure);
        }
        let sk = self.sk;
        Ok(sk)
    }
}

/// Client side of an OPAQUE run.
pub struct Client {
    sid: Identity,
    ssid: [u8; SSID_BYTES],
    password: Vec<u8>,
    r: Scalar,
    x_u: Scalar,
    xu_bytes: [u8; group::POINT_BYTES],
    alpha_bytes: [u8; group::POINT_BYTES],
}

impl Drop for Client {
    fn drop(&mut self) {
        self.r.zeroize();
        self.x_u.zeroize();
        self.password.zeroize();
    }
}

impl Client {
    /// Start a run, producing the first flight.
    pub fn start(password: &[u8], identity: &Identity) -> Result<(Self, [u8; REQUEST_BYTES])> {
        let mut ssid = [0u8; SSID_BYTES];
        OsRng.fill_bytes(&mut ssid);

        let r = group::scalar_random();
        let x_u = group::scalar_random();
        let xu_bytes = group::point_encode(&group::base_mul(&x_u));

        // α = H₁(pwd)^r
        let oprf_base = group::point_from_hash(&tagged_hash_64(DSI_OPRF, &[password]));
        let alpha_bytes = group::point_encode(&group::scalar_mul_point(&r, &oprf_base)?);

        let mut request = [0u8; REQUEST_BYTES];
        request[..MAX_ID].copy_from_slice(identity.as_bytes());
        request[MAX_ID..MAX_ID + SSID_BYTES].copy_from_slice(&ssid);
        request[MAX_ID + SSID_BYTES..MAX_ID + SSID_BYTES + 32].copy_from_slice(&xu_bytes);
        request[MAX_ID + SSID_BYTES + 32..].copy_from_slice(&alpha_bytes);

        Ok((
            Client {
                sid: *identity,
                ssid,
                password: password.to_vec(),
                r,
                x_u,
                xu_bytes,
                alpha_bytes,
            },
            request,
        ))
    }

    /// Process the server's response.
    ///
    /// Returns the session key and the confirmation tag to send back. If the
    /// server's tag (or the envelope) does not verify, the run aborts before
    /// the tag is released, so a wrong password never confirms.
    pub fn finish(self, response: &[u8; RESPONSE_BYTES]) -> Result<([u8; 32], [u8; TAG_BYTES])> {
        let mut beta_bytes = [0u8; group::POINT_BYTES];
        beta_bytes.copy_from_slice(&response[..32]);
        let mut xs_bytes = [0u8; group::POINT_BYTES];
        xs_bytes.copy_from_slice(&response[32..64]);
        let mut envelope = [0u8; ENVELOPE_BYTES];
        envelope.copy_from_slice(&response[64..64 + ENVELOPE_BYTES]);
        let mut a_s = [0u8; TAG_BYTES];
        a_s.copy_from_slice(&response[64 + ENVELOPE_BYTES..]);

        // rw = H₂( pwd ‖ β^(1/r) )
        let beta = group::point_decode(&beta_bytes)?;
        let unblinded = group::scalar_mul_point(&self.r.invert(), &beta)?;
        let mut rw = tagged_hash_32(
            DSI_UNLOCK,
            &[&self.password, &group::point_encode(&unblinded)],
        );
        // P_u is carried in the envelope but not needed by the client online.
        let (mut p_u, _p_u_pub, p_s_pub) = open_envelope(&rw, &envelope)?;
        rw.zeroize();

        let xs = group::point_decode(&xs_bytes)?;
        let ssid_pr = tagged_hash_32(DSI_SSID, &[self.sid.as_bytes(), &self.ssid, &self.alpha_bytes]);
        let (e_s, e_u) = exponents(&xs_bytes, &self.xu_bytes, &ssid_pr);

        // K = H( (X_s · P_s^e_s)^(x_u + e_u·p_u) )
        let base = xs + group::scalar_mul_point(&e_s, &p_s_pub)?;
        let exp = self.x_u + e_u * p_u;
        p_u.zeroize();
        let k_point = group::scalar_mul_point(&exp, &base)?;
        let mut k = tagged_hash_32(DSI_KEY, &[&group::point_encode(&k_point)]);
        let (sk, a_s_expected, a_u) = expand_keys(&k, &ssid_pr);
        k.zeroize();

        if !ct_eq(&a_s_expected, &a_s) {
            return Err(CryptoError::AuthenticationFailure);
        }
        Ok((sk, a_u))
    }
}

fn exponents(
    xs_bytes: &[u8; group::POINT_BYTES],
    xu_bytes: &[u8; group::POINT_BYTES],
    ssid_pr: &[u8; 32],
) -> (Scalar, Scalar) {
    // e_s = H( X_s ‖ "U" ‖ ssid' ), e_u = H( X_u ‖ "S" ‖ ssid' )
    let e_s = group::scalar_reduce(&tagged_hash_64(DSI_EXPONENT, &[xs_bytes, b"U", ssid_pr]));
    let e_u = group::scalar_reduce(&tagged_hash_64(DSI_EXPONENT, &[xu_bytes, b"S", ssid_pr]));
    (e_s, e_u)
}

/// `SK ‖ A_s ‖ A_u = XSalsa20(key = K, nonce = ssid'[..24])`
fn expand_keys(k: &[u8; 32], ssid_pr: &[u8; 32]) -> ([u8; 32], [u8; TAG_BYTES], [u8; TAG_BYTES]) {
    let mut buf = [0u8; 96];
    let mut cipher = XSalsa20::new(
        salsa20::Key::from_slice(k),
        salsa20::XNonce::from_slice(&ssid_pr[..24]),
    );
    cipher.apply_keystream(&mut buf);

    let mut sk = [0u8; 32];
    let mut a_s = [0u8; TAG_BYTES];
    let mut a_u = [0u8; TAG_BYTES];
    sk.copy_from_slice(&buf[..32]);
    a_s.copy_from_slice(&buf[32..64]);
    a_u.copy_from_slice(&buf[64..]);
    buf.zeroize();
    (sk, a_s, a_u)
}

fn seal_envelope(
    rw: &[u8; 32],
    p_u: &Scalar,
    p_u_pub: &RistrettoPoint,
    p_s_pub: &RistrettoPoint,
) -> Result<[u8; ENVELOPE_BYTES]> {
    // Zero nonce: rw is unique per password and the envelope is written
    // exactly once at enrollment, never rewrapped.
    let cipher = XSalsa20Poly1305::new(xsalsa20poly1305::Key::from_slice(rw));
    let mut m = [0u8; ENVELOPE_PLAIN_BYTES];
    m[..32].copy_from_slice(&p_u.to_bytes());
    m[32..64].copy_from_slice(&group::point_encode(p_u_pub));
    m[64..].copy_from_slice(&group::point_encode(p_s_pub));

    let tag = cipher
        .encrypt_in_place_detached(&Nonce::default(), b"", &mut m)
        .map_err(|_| CryptoError::Internal("envelope seal failed".into()))?;

    let mut out = [0u8; ENVELOPE_BYTES];
    out[..SECRETBOX_MAC_BYTES].copy_from_slice(tag.as_slice());
    out[SECRETBOX_MAC_BYTES..].copy_from_slice(&m);
    m.zeroize();
    Ok(out)
}

fn open_envelope(
    rw: &[u8; 32],
    envelope: &[u8; ENVELOPE_BYTES],
) -> Result<(Scalar, RistrettoPoint, RistrettoPoint)> {
    let cipher = XSalsa20Poly1305::new(xsalsa20poly1305::Key::from_slice(rw));
    let mut m = [0u8; ENVELOPE_PLAIN_BYTES];
    m.copy_from_slice(&envelope[SECRETBOX_MAC_BYTES..]);

    cipher
        .decrypt_in_place_detached(
            &Nonce::default(),
            b"",
            &mut m,
            Tag::from_slice(&envelope[..SECRETBOX_MAC_BYTES]),
        )
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    let mut p_u = [0u8; 32];
    p_u.copy_from_slice(&m[..32]);
    let mut p_u_pub = [0u8; 32];
    p_u_pub.copy_from_slice(&m[32..64]);
    let mut p_s_pub = [0u8; 32];
    p_s_pub.copy_from_slice(&m[64..]);
    m.zeroize();

    let result = (
        group::scalar_decode(&p_u)?,
        group::point_decode(&p_u_pub)?,
        group::point_decode(&p_s_pub)?,
    );
    p_u.zeroize();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(enroll_pwd: &[u8], login_pwd: &[u8]) -> Result<([u8; 32], [u8; 32])> {
        let file = ServerFile::enroll(enroll_pwd)?;
        let identity = Identity::new(b"alice")?;

        let (client, request) = Client::start(login_pwd, &identity)?;
        let request = Request::parse(&request)?;
        assert_eq!(request.sid(), &identity);

        let (pending, response) = file.respond(&request)?;
        let (client_sk, a_u) = client.finish(&response)?;
        let server_sk = pending.confirm(&a_u)?;
        Ok((client_sk, server_sk))
    }

    #[test]
    fn test_agreement() {
        let (client_sk, server_sk) = run(b"hunter2", b"hunter2").unwrap();
        assert_eq!(client_sk, server_sk);
    }

    #[test]
    fn test_wrong_password_aborts_client() {
        assert_eq!(
            run(b"hunter2", b"hunter3").unwrap_err(),
            CryptoError::AuthenticationFailure
        );
    }

    #[test]
    fn test_tampered_server_tag_aborts_client() {
        let file = ServerFile::enroll(b"hunter2").unwrap();
        let identity = Identity::new(b"alice").unwrap();
        let (client, request) = Client::start(b"hunter2", &identity).unwrap();
        let request = Request::parse(&request).unwrap();
        let (_pending, mut response) = file.respond(&request).unwrap();
        response[RESPONSE_BYTES - 1] ^= 1;
        assert_eq!(
            client.finish(&response).unwrap_err(),
            CryptoError::AuthenticationFailure
        );
    }

    #[test]
    fn test_wrong_client_tag_aborts_server() {
        let file = ServerFile::enroll(b"hunter2").unwrap();
        let identity = Identity::new(b"alice").unwrap();
        let (client, request) = Client::start(b"hunter2", &identity).unwrap();
        let request = Request::parse(&request).unwrap();
        let (pending, response) = file.respond(&request).unwrap();
        let (_sk, mut a_u) = client.finish(&response).unwrap();
        a_u[0] ^= 1;
        assert_eq!(
            pending.confirm(&a_u).unwrap_err(),
            CryptoError::AuthenticationFailure
        );
    }

    #[test]
    fn test_oprf_unblinding() {
        // r⁻¹·(k_s·(r·H(pwd))) = k_s·H(pwd)
        let base = group::point_from_hash(&tagged_hash_64(DSI_OPRF, &[b"pwd".as_slice()]));
        let k_s = group::scalar_random();
        let r = group::scalar_random();
        let blinded = group::scalar_mul_point(&r, &base).unwrap();
        let evaluated = group::scalar_mul_point(&k_s, &blinded).unwrap();
        let unblinded = group::scalar_mul_point(&r.invert(), &evaluated).unwrap();
        assert_eq!(unblinded, group::scalar_mul_point(&k_s, &base).unwrap());
    }

    #[test]
    fn test_file_roundtrip() {
        let file = ServerFile::enroll(b"hunter2").unwrap();
        let parsed = ServerFile::from_bytes(&file.to_bytes()).unwrap();
        assert_eq!(parsed.to_bytes(), file.to_bytes());
    }

    #[test]
    fn test_short_file_rejected() {
        assert!(ServerFile::from_bytes(&[0u8; FILE_BYTES - 1]).is_err());
    }

    #[test]
    fn test_invalid_request_point_rejected() {
        let identity = Identity::new(b"alice").unwrap();
        let (_client, mut request) = Client::start(b"pwd", &identity).unwrap();
        request[REQUEST_BYTES - 32..].fill(0xFF);
        assert!(Request::parse(&request).is_err());
    }

    #[test]
    fn test_record_filename() {
        assert_eq!(
            record_filename(&Identity::new(b"Alice").unwrap()).unwrap(),
            "alice.pwd"
        );
        assert!(record_filename(&Identity::new(b"../alice").unwrap()).is_err());
        assert!(record_filename(&Identity::new(b"a b").unwrap()).is_err());
    }
}
