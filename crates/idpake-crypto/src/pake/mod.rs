//! PAKE finishers shared by CHIP and CRISP

pub mod cpace;

use crate::error::Result;
use crate::identity::Identity;

/// The CPace leg of a CHIP or CRISP exchange.
///
/// Produced once the transcript secret is fixed; emits one 32-byte message
/// and consumes the peer's to derive the final session key.
pub struct KeyAgreement {
    pub(crate) pake: cpace::Session,
    pub(crate) peer: Identity,
}

impl KeyAgreement {
    /// Outgoing CPace message.
    pub fn message(&self) -> [u8; cpace::MSG_BYTES] {
        self.pake.message()
    }

    /// Peer identity as read from the first-round message.
    pub fn peer_identity(&self) -> &Identity {
        &self.peer
    }

    /// Consume the peer's CPace message and derive the shared session key.
    pub fn finish(self, peer_message: &[u8; cpace::MSG_BYTES]) -> Result<[u8; cpace::KEY_BYTES]> {
        self.pake.key(peer_message)
    }
}
