//! Driving ports (Inbound API)

use super::SignatureVerifier;
use crate::domain::{Accepted, Rejection, Share, SignedQbftMessage};
use std::time::SystemTime;

/// Admission API for inbound consensus messages
pub trait MessageValidationApi: Send + Sync {
    /// Validate a consensus message received from the network.
    ///
    /// `received_at` is sampled once by the caller and used for every timing
    /// decision. `verifier` runs at most once, only after every cheaper check
    /// passed. Signer state changes only when the message is accepted.
    fn validate_consensus_message(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        received_at: SystemTime,
        verifier: &dyn SignatureVerifier,
    ) -> Result<Accepted, Rejection>;
}
