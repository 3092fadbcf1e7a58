//! # idpake cryptography core
//!
//! Three interoperating two-party PAKE protocols - CHIP, CRISP and OPAQUE -
//! plus the CPace-Ristretto255 finisher shared by CHIP and CRISP. Two parties
//! holding only a low-entropy password derive a high-entropy session key over
//! a hostile network, with no offline dictionary attack possible on a captured
//! transcript or a compromised enrollment record.
//!
//! The crate covers the offline enrollment step (deriving per-identity
//! records), the online exchange state machines, and the group arithmetic
//! they run on. Transport and file I/O live in the `idpake-net` and `idpake`
//! crates.
//!
//! ## Security properties
//!
//! - Every hash is domain-separated by an ASCII `"<PROTOCOL>-<n>"` label.
//! - Received group elements are validated on deserialization.
//! - Secret scalars are zeroized when their owning session is dropped.
//! - Validation failures are fatal: no partial key is ever emitted, and
//!   a wrong password is indistinguishable from network tampering.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chip;
pub mod crisp;
pub mod error;
pub mod group;
pub mod hash;
pub mod identity;
pub mod kdf;
pub mod mem;
pub mod opaque;
pub mod pairing;
pub mod pake;

pub use error::{CryptoError, Result};
pub use identity::{Identity, MAX_ID};

/// Library version constant
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
