//! QBFT consensus message entities
//!
//! Messages arrive already deserialized from the network layer. The message
//! type travels as its raw wire code so an out-of-vocabulary value can be
//! rejected explicitly instead of failing deserialization.

use bincode::Options;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use shared_types::{BeaconRole, Height, OperatorId, Round, Slot, ValidatorPublicKey};
use std::fmt;

/// SHA-256 root of a full data payload.
pub type Root = [u8; 32];

/// Upper bound on a single encoded justification entry.
pub const MAX_ENCODED_MESSAGE_SIZE: u64 = 8 * 1024 * 1024;

/// QBFT message type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Proposal,
    Prepare,
    Commit,
    RoundChange,
}

impl MessageType {
    /// Wire code of the message type.
    pub fn code(self) -> u64 {
        match self {
            MessageType::Proposal => 0,
            MessageType::Prepare => 1,
            MessageType::Commit => 2,
            MessageType::RoundChange => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Proposal => "proposal",
            MessageType::Prepare => "prepare",
            MessageType::Commit => "commit",
            MessageType::RoundChange => "round_change",
        }
    }
}

impl TryFrom<u64> for MessageType {
    type Error = u64;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MessageType::Proposal),
            1 => Ok(MessageType::Prepare),
            2 => Ok(MessageType::Commit),
            3 => Ok(MessageType::RoundChange),
            other => Err(other),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the consensus instance family a message belongs to: one
/// validator key and one duty role.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    #[serde_as(as = "Bytes")]
    pub validator_pk: ValidatorPublicKey,
    pub role: BeaconRole,
}

impl MessageId {
    pub fn new(validator_pk: ValidatorPublicKey, role: BeaconRole) -> Self {
        Self { validator_pk, role }
    }
}

/// Unsigned QBFT message body
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbftMessage {
    /// Raw wire code, see [`MessageType::code`]
    pub msg_type: u64,
    pub height: Height,
    pub round: Round,
    pub identifier: MessageId,
    #[serde_as(as = "Bytes")]
    pub root: Root,
    pub data_round: Round,
    /// Encoded [`SignedQbftMessage`] round changes
    pub round_change_justification: Vec<Vec<u8>>,
    /// Encoded [`SignedQbftMessage`] prepares
    pub prepare_justification: Vec<Vec<u8>>,
}

impl QbftMessage {
    /// Message type, if the wire code is known.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.msg_type).ok()
    }

    /// Decode the prepare justification bundle.
    pub fn prepare_justifications(&self) -> Result<Vec<SignedQbftMessage>, bincode::Error> {
        decode_all(&self.prepare_justification)
    }

    /// Decode the round change justification bundle.
    pub fn round_change_justifications(&self) -> Result<Vec<SignedQbftMessage>, bincode::Error> {
        decode_all(&self.round_change_justification)
    }
}

/// QBFT message with its (possibly aggregated) signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedQbftMessage {
    pub signature: Vec<u8>,
    /// Strictly increasing operator IDs
    pub signers: Vec<OperatorId>,
    pub message: QbftMessage,
    pub full_data: Vec<u8>,
}

impl SignedQbftMessage {
    /// Slot of the duty the message decides on.
    pub fn slot(&self) -> Slot {
        self.message.height
    }

    /// A commit carrying more than one signer is an aggregated decided message.
    pub fn is_decided(&self) -> bool {
        self.message.message_type() == Some(MessageType::Commit) && self.signers.len() > 1
    }

    /// Whether the message carries a full data payload that must match its root.
    pub fn has_full_data(&self) -> bool {
        let carries = match self.message.message_type() {
            Some(MessageType::Proposal) | Some(MessageType::RoundChange) => true,
            Some(MessageType::Commit) => self.is_decided(),
            Some(MessageType::Prepare) | None => false,
        };
        carries && !self.full_data.is_empty()
    }

    /// Encode for embedding in a justification bundle.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        codec().serialize(self)
    }

    /// Decode a justification bundle entry.
    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        codec().deserialize(bytes)
    }
}

/// SHA-256 of a full data payload.
pub fn hash_data_root(data: &[u8]) -> Root {
    let digest = Sha256::digest(data);
    let mut root = [0u8; 32];
    root.copy_from_slice(&digest);
    root
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ENCODED_MESSAGE_SIZE)
}

fn decode_all(encoded: &[Vec<u8>]) -> Result<Vec<SignedQbftMessage>, bincode::Error> {
    encoded
        .iter()
        .map(|bytes| SignedQbftMessage::decode(bytes))
        .collect()
}
