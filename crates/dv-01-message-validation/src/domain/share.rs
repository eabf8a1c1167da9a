//! Committee share entities
//!
//! A share is one validator key as seen by its committee: who the operators
//! are, in which fixed order, and what the beacon chain knows about the key.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{OperatorId, ValidatorIndex, ValidatorPublicKey};

/// One operator in a committee. Its position in [`Share::committee`] is
/// fixed for the lifetime of the duty assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub operator_id: OperatorId,
}

impl CommitteeMember {
    pub fn new(operator_id: OperatorId) -> Self {
        Self { operator_id }
    }
}

/// What the beacon chain knows about the validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconMetadata {
    pub index: ValidatorIndex,
}

/// Validator share with its committee
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    #[serde_as(as = "Bytes")]
    pub validator_pk: ValidatorPublicKey,
    pub committee: Vec<CommitteeMember>,
    /// `None` until the validator is seen on the beacon chain
    pub beacon_metadata: Option<BeaconMetadata>,
}

impl Share {
    pub fn new(validator_pk: ValidatorPublicKey, operator_ids: &[OperatorId]) -> Self {
        Self {
            validator_pk,
            committee: operator_ids.iter().copied().map(CommitteeMember::new).collect(),
            beacon_metadata: None,
        }
    }

    pub fn with_beacon_metadata(mut self, index: ValidatorIndex) -> Self {
        self.beacon_metadata = Some(BeaconMetadata { index });
        self
    }

    /// Number of operators in the committee
    pub fn committee_size(&self) -> usize {
        self.committee.len()
    }

    /// Tolerated faulty operators: f in n = 3f + 1
    pub fn faulty_tolerance(&self) -> usize {
        self.committee.len().saturating_sub(1) / 3
    }

    /// Minimum signer count of a collective decision (2f + 1)
    pub fn quorum(&self) -> usize {
        2 * self.faulty_tolerance() + 1
    }

    pub fn has_quorum(&self, signers: usize) -> bool {
        signers >= self.quorum()
    }

    /// Check if an operator is a member of the committee
    pub fn contains(&self, operator_id: OperatorId) -> bool {
        self.committee.iter().any(|m| m.operator_id == operator_id)
    }

    /// Operator IDs in committee order
    pub fn operator_ids(&self) -> Vec<OperatorId> {
        self.committee.iter().map(|m| m.operator_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_sizes() {
        let four = Share::new([0; 48], &[1, 2, 3, 4]);
        assert_eq!(four.faulty_tolerance(), 1);
        assert_eq!(four.quorum(), 3);
        assert!(four.has_quorum(3));
        assert!(!four.has_quorum(2));

        let seven = Share::new([0; 48], &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(seven.quorum(), 5);

        let thirteen = Share::new([0; 48], &(1..=13).collect::<Vec<_>>());
        assert_eq!(thirteen.quorum(), 9);
    }

    #[test]
    fn test_membership() {
        let share = Share::new([0; 48], &[3, 5, 8, 13]);
        assert!(share.contains(8));
        assert!(!share.contains(4));
        assert_eq!(share.operator_ids(), vec![3, 5, 8, 13]);
    }
}
