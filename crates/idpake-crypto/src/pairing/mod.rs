//! Asymmetric pairing group abstraction
//!
//! Opaque `Zr`, `G1`, `G2` and `Gt` types over a pairing-friendly curve,
//! exposing exactly what CRISP needs: random scalars, hash-to-G1 via a
//! little-endian field-element mapping, the G2 generator, exponentiation,
//! validating (de)serialization, a G2 identity test, the pairing itself and
//! GT equality.
//!
//! The curve is a compile-time choice between two backends, selected by
//! cargo feature. Scalars are cleared on drop.

#[cfg(all(feature = "bn254", feature = "bls12-381"))]
compile_error!("features `bn254` and `bls12-381` are mutually exclusive");

#[cfg(not(any(feature = "bn254", feature = "bls12-381")))]
compile_error!("enable exactly one pairing backend: `bn254` or `bls12-381`");

#[cfg(feature = "bn254")]
mod bn254;
#[cfg(feature = "bn254")]
pub use bn254::{Gt, G1, G1_BYTES, G2, G2_BYTES, GT_BYTES, Zr, ZR_BYTES};

#[cfg(all(feature = "bls12-381", not(feature = "bn254")))]
mod bls381;
#[cfg(all(feature = "bls12-381", not(feature = "bn254")))]
pub use bls381::{Gt, G1, G1_BYTES, G2, G2_BYTES, GT_BYTES, Zr, ZR_BYTES};
