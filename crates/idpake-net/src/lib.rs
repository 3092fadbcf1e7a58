//! Transport layer for the idpake exchange tools
//!
//! A peer channel with two flavors: UDP toward a remote address, opened by a
//! three-way `SYN`/`SYN_ACK`/`ACK` rendezvous, and a loopback TCP mode for
//! two processes on the same host. Messages are fixed-width and prefixed by
//! a one-byte monotonic counter for loose ordering checks.
//!
//! The channel guarantees only what the protocols need: in-order delivery of
//! exact byte counts for the session's lifetime, and teardown. Timeouts and
//! retries beyond the opener are the caller's problem.

#![forbid(unsafe_code)]

pub mod channel;
pub mod error;

pub use channel::PeerChannel;
pub use error::NetError;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, NetError>;
