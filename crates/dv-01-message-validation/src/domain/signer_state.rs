//! # Signer State
//!
//! What the validator remembers about each committee member's consensus
//! messages for one (validator, role) pair.
//!
//! ## Lifecycle
//!
//! - Created lazily, zeroed, on the first admitted message from a signer.
//! - Only moves forward in (slot, round). Messages implying a regression are
//!   rejected before they reach this module.
//! - A new round clears the cached proposal and the message counters.
//! - A new slot additionally counts a duty against the epoch.
//! - Never persisted: after a restart every signer starts from zero state.

use super::MessageCounts;
use shared_types::{OperatorId, Round, Slot};
use std::collections::HashMap;

/// Consensus behavior of one signer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignerState {
    pub slot: Slot,
    pub round: Round,
    /// Duties started within the epoch of `slot`
    pub epoch_duties: u64,
    /// Full data of the first proposal seen in (slot, round)
    pub proposal_data: Option<Vec<u8>>,
    pub message_counts: MessageCounts,
}

impl SignerState {
    /// Advance to a later round of the same slot.
    pub fn reset(&mut self, round: Round) {
        self.round = round;
        self.message_counts = MessageCounts::default();
        self.proposal_data = None;
    }

    /// Advance to a later slot.
    ///
    /// The new slot's duty is counted: the epoch counter restarts at one in
    /// a new epoch and increments otherwise.
    pub fn reset_slot(&mut self, slot: Slot, round: Round, new_epoch: bool) {
        self.slot = slot;
        self.reset(round);
        if new_epoch {
            self.epoch_duties = 1;
        } else {
            self.epoch_duties = self.epoch_duties.saturating_add(1);
        }
    }
}

/// Signer states of one (validator, role) pair.
#[derive(Debug, Default)]
pub struct ConsensusState {
    signers: HashMap<OperatorId, SignerState>,
}

impl ConsensusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a signer, `None` before its first admitted message.
    pub fn get(&self, signer: OperatorId) -> Option<&SignerState> {
        self.signers.get(&signer)
    }

    /// State of a signer, created zeroed if absent.
    pub fn get_or_create(&mut self, signer: OperatorId) -> &mut SignerState {
        self.signers.entry(signer).or_default()
    }

    /// Number of tracked signers
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CountedKind;

    #[test]
    fn test_get_or_create_is_lazy() {
        let mut state = ConsensusState::new();
        assert!(state.get(1).is_none());

        let signer = state.get_or_create(1);
        assert_eq!(*signer, SignerState::default());
        signer.slot = 5;

        assert_eq!(state.get(1).map(|s| s.slot), Some(5));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_reset_keeps_slot_and_duties() {
        let mut signer = SignerState {
            slot: 10,
            round: 1,
            epoch_duties: 2,
            proposal_data: Some(b"block".to_vec()),
            message_counts: MessageCounts::default(),
        };
        signer.message_counts.record(CountedKind::Prepare);

        signer.reset(3);

        assert_eq!(signer.slot, 10);
        assert_eq!(signer.round, 3);
        assert_eq!(signer.epoch_duties, 2);
        assert!(signer.proposal_data.is_none());
        assert_eq!(signer.message_counts, MessageCounts::default());
    }

    #[test]
    fn test_reset_slot_counts_duties() {
        let mut signer = SignerState::default();

        signer.reset_slot(33, 1, true);
        assert_eq!((signer.slot, signer.round, signer.epoch_duties), (33, 1, 1));

        signer.reset_slot(40, 2, false);
        assert_eq!((signer.slot, signer.round, signer.epoch_duties), (40, 2, 2));

        signer.reset_slot(64, 1, true);
        assert_eq!(signer.epoch_duties, 1);
    }
}
