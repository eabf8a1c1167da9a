//! Validation outcomes handed back to the caller
//!
//! The descriptor is returned on both paths so the caller can log and count
//! a message without parsing it again.

use super::{MessageType, Share, SignedQbftMessage, ValidationError};
use shared_types::{OperatorId, Round, Slot};

/// Summary of a consensus message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusDescriptor {
    /// `None` for an unknown wire code
    pub msg_type: Option<MessageType>,
    pub round: Round,
    pub signers: Vec<OperatorId>,
    pub committee: Vec<OperatorId>,
}

impl ConsensusDescriptor {
    pub fn new(share: &Share, msg: &SignedQbftMessage) -> Self {
        Self {
            msg_type: msg.message.message_type(),
            round: msg.message.round,
            signers: msg.signers.clone(),
            committee: share.operator_ids(),
        }
    }
}

/// An admitted message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    pub descriptor: ConsensusDescriptor,
    pub slot: Slot,
}

/// A refused message with the reason
#[derive(Debug, thiserror::Error)]
#[error("consensus message rejected at slot {slot}: {error}")]
pub struct Rejection {
    pub descriptor: ConsensusDescriptor,
    pub slot: Slot,
    #[source]
    pub error: ValidationError,
}
