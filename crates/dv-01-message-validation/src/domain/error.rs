//! Error types for the message validation subsystem

use super::{CountedKind, MessageType};
use shared_types::{BeaconRole, OperatorId, Round, Slot};
use std::time::Duration;

/// Reasons a consensus message is refused admission.
///
/// Every variant is a deterministic outcome of the message and the signer
/// state it was checked against. Peer-protocol violations and internal
/// faults are kept apart: see [`ValidationError::is_internal`].
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Message identifier belongs to another validator")]
    UnknownValidator,

    #[error("Unexpected consensus message for role {role}")]
    UnexpectedConsensusMessage { role: BeaconRole },

    #[error("Wrong signature size: got {got} bytes, want {want}")]
    WrongSignatureSize { got: usize, want: usize },

    #[error("Zero signature")]
    ZeroSignature,

    #[error("Unknown QBFT message type: {got}")]
    UnknownMessageType { got: u64 },

    #[error("No signers")]
    NoSigners,

    #[error("Signer is not the round leader: got {got}, want {want}")]
    SignerNotLeader { got: OperatorId, want: OperatorId },

    #[error("Non-decided {msg_type} message with {got} signers")]
    NonDecidedWithMultipleSigners { msg_type: MessageType, got: usize },

    #[error("Wrong signers length: got {got}, want between {min} and {max}")]
    WrongSignersLength { got: usize, min: usize, max: usize },

    #[error("Signers are not sorted")]
    SignersNotSorted,

    #[error("Duplicated signer: {signer}")]
    DuplicatedSigner { signer: OperatorId },

    #[error("Zero signer ID")]
    ZeroSigner,

    #[error("Signer {signer} is not in the committee")]
    SignerNotInCommittee { signer: OperatorId },

    #[error("Message received too early: slot {slot} starts in {early_by:?}")]
    EarlyMessage { slot: Slot, early_by: Duration },

    #[error("Message received too late: slot {slot} deadline passed {late_by:?} ago")]
    LateMessage { slot: Slot, late_by: Duration },

    #[error("Signer has already advanced to a later slot: got {got}, want at least {want}")]
    SlotAlreadyAdvanced { got: Slot, want: Slot },

    #[error("Signer has already advanced to a later round: got {got}, want at least {want}")]
    RoundAlreadyAdvanced { got: Round, want: Round },

    #[error("Round too high: got {got}, maximum {want} for role {role}")]
    RoundTooHigh {
        role: BeaconRole,
        got: Round,
        want: Round,
    },

    #[error(
        "Message round is too far from estimated: got {got}, want between {min} and {max} \
         for role {role} ({since_slot_start:?} since slot start)"
    )]
    EstimatedRoundTooFar {
        role: BeaconRole,
        got: Round,
        min: Round,
        max: Round,
        since_slot_start: Duration,
    },

    #[error("Root doesn't match full data hash")]
    InvalidHash,

    #[error("No duty for role {role} at slot {slot}")]
    NoDuty { role: BeaconRole, slot: Slot },

    #[error("Share has no beacon metadata")]
    NoShareMetadata,

    #[error("Too many duties per epoch for role {role}: got {got}, want less than {want}")]
    TooManyDutiesPerEpoch {
        role: BeaconRole,
        got: u64,
        want: u64,
    },

    #[error("Signer sent a different proposal data for the same round")]
    DifferentProposalData,

    #[error("Too many {kind} messages per round: got {got}, limit {limit}")]
    TooManyMessagesPerRound {
        kind: CountedKind,
        got: u64,
        limit: u64,
    },

    #[error("Malformed prepare justifications: {source}")]
    MalformedPrepareJustifications { source: bincode::Error },

    #[error("Unexpected prepare justifications in {msg_type} message")]
    UnexpectedPrepareJustifications { msg_type: MessageType },

    #[error("Malformed round change justifications: {source}")]
    MalformedRoundChangeJustifications { source: bincode::Error },

    #[error("Unexpected round change justifications in {msg_type} message")]
    UnexpectedRoundChangeJustifications { msg_type: MessageType },

    #[error("Invalid proposal justifications: {reason}")]
    InvalidJustifications { reason: String },

    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl ValidationError {
    /// Stable identifier of the rejection reason, used for log fields and
    /// metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownValidator => "unknown-validator",
            Self::UnexpectedConsensusMessage { .. } => "unexpected-role-for-consensus",
            Self::WrongSignatureSize { .. } => "malformed-signature",
            Self::ZeroSignature => "zero-signature",
            Self::UnknownMessageType { .. } => "unknown-message-type",
            Self::NoSigners => "empty-signer-set",
            Self::SignerNotLeader { .. } => "signer-not-leader",
            Self::NonDecidedWithMultipleSigners { .. } => "non-decided-multi-signer",
            Self::WrongSignersLength { .. } => "wrong-signer-set-size",
            Self::SignersNotSorted => "signers-not-sorted",
            Self::DuplicatedSigner { .. } => "duplicate-signer",
            Self::ZeroSigner => "zero-signer",
            Self::SignerNotInCommittee { .. } => "unknown-committee-signer",
            Self::EarlyMessage { .. } => "early-message",
            Self::LateMessage { .. } => "late-message",
            Self::SlotAlreadyAdvanced { .. } => "slot-regressed",
            Self::RoundAlreadyAdvanced { .. } => "round-regressed",
            Self::RoundTooHigh { .. } => "round-exceeds-role-ceiling",
            Self::EstimatedRoundTooFar { .. } => "round-outside-estimated-window",
            Self::InvalidHash => "payload-hash-mismatch",
            Self::NoDuty { .. } => "missing-duty",
            Self::NoShareMetadata => "missing-share-metadata",
            Self::TooManyDutiesPerEpoch { .. } => "duty-rate-exceeded",
            Self::DifferentProposalData => "differing-proposal-payload",
            Self::TooManyMessagesPerRound { .. } => "message-count-exceeded",
            Self::MalformedPrepareJustifications { .. } => "malformed-prepare-justification",
            Self::UnexpectedPrepareJustifications { .. } => "unexpected-prepare-justification",
            Self::MalformedRoundChangeJustifications { .. } => {
                "malformed-roundchange-justification"
            }
            Self::UnexpectedRoundChangeJustifications { .. } => {
                "unexpected-roundchange-justification"
            }
            Self::InvalidJustifications { .. } => "invalid-justifications",
            Self::SignatureVerificationFailed => "signature-verification-failed",
            Self::Internal(e) => e.kind(),
        }
    }

    /// True for faults of this node rather than of the sending peer.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Internal computation faults. These are never the sending peer's fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("Round estimate overflows for elapsed time {elapsed:?}")]
    RoundEstimateOverflow { elapsed: Duration },
}

impl InternalError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoundEstimateOverflow { .. } => "round-estimate-overflow",
        }
    }
}

/// Invalid validation configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Timeout {field} must be non-zero")]
    ZeroTimeout { field: &'static str },

    #[error("Quick round phase overflows: {threshold} rounds of {quick_timeout:?}")]
    QuickPhaseOverflow {
        threshold: Round,
        quick_timeout: Duration,
    },

    #[error("Signature length must be non-zero")]
    ZeroSignatureLength,
}

/// Result type for validation checks
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_not_peer_faults() {
        let err: ValidationError = InternalError::RoundEstimateOverflow {
            elapsed: Duration::MAX,
        }
        .into();
        assert!(err.is_internal());
        assert_eq!(err.kind(), "round-estimate-overflow");

        assert!(!ValidationError::InvalidHash.is_internal());
    }

    #[test]
    fn test_error_display_carries_got_want() {
        let err = ValidationError::SignerNotLeader { got: 1, want: 2 };
        assert_eq!(
            err.to_string(),
            "Signer is not the round leader: got 1, want 2"
        );
        assert_eq!(err.kind(), "signer-not-leader");
    }
}
