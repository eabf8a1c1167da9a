//! # dv-01-message-validation
//!
//! Admission control for QBFT consensus messages of a distributed-validator
//! node.
//!
//! ## Architecture
//!
//! Every inbound proposal, prepare, commit and round-change message passes
//! through [`MessageValidator`] before it reaches the BFT state machine. The
//! validator has no synchronized clock, so it:
//!
//! - estimates the round the committee should be in from the time elapsed
//!   since the slot started,
//! - remembers per-signer behavior to catch equivocation, regression and
//!   duty-rate abuse,
//! - checks signer sets and justification payloads structurally,
//! - resolves the expected leader of a proposal deterministically.
//!
//! ```text
//! network ──msg──→ [MessageValidator] ──Accepted──→ BFT core
//!                    │     │      │
//!          round estimator │  signer states
//!                    leader selector
//! ```
//!
//! Signature cryptography, duty scheduling and transport are external and
//! reached through the traits in [`ports`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dv_01_message_validation::{
//!     InMemoryDutyStore, MessageValidator, NetworkConfig, ValidationConfig,
//! };
//!
//! let validator = MessageValidator::new(
//!     ValidationConfig::default(),
//!     Arc::new(NetworkConfig::new(genesis_time)),
//!     Arc::new(InMemoryDutyStore::new()),
//! )?;
//!
//! match validator.validate(&share, &msg, SystemTime::now(), &bls_verifier) {
//!     Ok(accepted) => forward(accepted),
//!     Err(rejection) => penalize(rejection.error.kind()),
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Signer state changes only for accepted messages.
//! - The signature verifier runs last and at most once per call.
//! - Messages of different (validator, role) pairs never contend.

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{BeaconSlotTimePolicy, InMemoryDutyStore, NetworkConfig};
pub use domain::{
    hash_data_root, round_robin_proposer, Accepted, BeaconMetadata, CommitteeMember, ConfigError,
    ConsensusDescriptor, CountedKind, InternalError, MessageCounts, MessageId, MessageType,
    QbftMessage, Rejection, RoundTimeEstimator, Share, SignedQbftMessage, SignerState,
    ValidationConfig, ValidationError, ValidationResult,
};
pub use ports::{
    BeaconNetwork, DutyStore, MessageValidationApi, ProposalJustificationVerifier,
    SignatureVerifier, SlotTimePolicy,
};
pub use service::MessageValidator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_config_default() {
        let config = ValidationConfig::default();
        assert_eq!(config.signature_len, 96);
        assert_eq!(config.allowed_rounds_in_future, 1);
        assert!(config.allowed_rounds_in_past.is_none());
    }
}
