//! # Core Protocol Entities
//!
//! Numbering and identity types for the beacon-chain time grid and the QBFT
//! instances run on top of it.
//!
//! ## Clusters
//!
//! - **Beacon time grid**: `Slot`, `Epoch`, `SyncCommitteePeriod`
//! - **QBFT instance**: `Height`, `Round`, `FIRST_HEIGHT`, `FIRST_ROUND`
//! - **Identity**: `OperatorId`, `ValidatorIndex`, `ValidatorPublicKey`
//! - **Duties**: `BeaconRole`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// CLUSTER A: BEACON TIME GRID
// =============================================================================

/// Beacon-chain slot number.
pub type Slot = u64;

/// Beacon-chain epoch number.
pub type Epoch = u64;

/// Sync-committee period number.
pub type SyncCommitteePeriod = u64;

// =============================================================================
// CLUSTER B: QBFT INSTANCE
// =============================================================================

/// Consensus instance counter. One instance runs per duty slot, so the height
/// of a duty's instance equals its slot.
pub type Height = u64;

/// Sub-step counter within a height, advanced on leader failure or timeout.
pub type Round = u64;

/// Height of the very first consensus instance.
pub const FIRST_HEIGHT: Height = 0;

/// Round every instance starts in.
pub const FIRST_ROUND: Round = 1;

// =============================================================================
// CLUSTER C: IDENTITY
// =============================================================================

/// Numeric identity of a committee operator. Zero is never assigned.
pub type OperatorId = u64;

/// Index of a validator in the beacon-chain registry.
pub type ValidatorIndex = u64;

/// BLS public key of the validator a committee operates.
pub type ValidatorPublicKey = [u8; 48];

// =============================================================================
// CLUSTER D: DUTIES
// =============================================================================

/// Beacon duty a consensus instance decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeaconRole {
    Attester,
    Aggregator,
    Proposer,
    SyncCommittee,
    SyncCommitteeContribution,
    ValidatorRegistration,
    VoluntaryExit,
}

/// Unknown role code received on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown beacon role code: {0}")]
pub struct UnknownRole(pub u64);

impl BeaconRole {
    /// All roles, in wire-code order.
    pub const ALL: [BeaconRole; 7] = [
        BeaconRole::Attester,
        BeaconRole::Aggregator,
        BeaconRole::Proposer,
        BeaconRole::SyncCommittee,
        BeaconRole::SyncCommitteeContribution,
        BeaconRole::ValidatorRegistration,
        BeaconRole::VoluntaryExit,
    ];

    /// Wire code of the role.
    pub fn code(self) -> u64 {
        match self {
            BeaconRole::Attester => 0,
            BeaconRole::Aggregator => 1,
            BeaconRole::Proposer => 2,
            BeaconRole::SyncCommittee => 3,
            BeaconRole::SyncCommitteeContribution => 4,
            BeaconRole::ValidatorRegistration => 5,
            BeaconRole::VoluntaryExit => 6,
        }
    }

    /// Whether duties of this role are decided through QBFT.
    ///
    /// Registrations and exits are signed by pre-consensus partial signatures
    /// only and never produce consensus messages.
    pub fn runs_consensus(self) -> bool {
        !matches!(
            self,
            BeaconRole::ValidatorRegistration | BeaconRole::VoluntaryExit
        )
    }

    /// Stable lowercase name, used as a log field and metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            BeaconRole::Attester => "attester",
            BeaconRole::Aggregator => "aggregator",
            BeaconRole::Proposer => "proposer",
            BeaconRole::SyncCommittee => "sync_committee",
            BeaconRole::SyncCommitteeContribution => "sync_committee_contribution",
            BeaconRole::ValidatorRegistration => "validator_registration",
            BeaconRole::VoluntaryExit => "voluntary_exit",
        }
    }
}

impl TryFrom<u64> for BeaconRole {
    type Error = UnknownRole;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        BeaconRole::ALL
            .iter()
            .copied()
            .find(|role| role.code() == code)
            .ok_or(UnknownRole(code))
    }
}

impl fmt::Display for BeaconRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_codes_roundtrip() {
        for role in BeaconRole::ALL {
            assert_eq!(BeaconRole::try_from(role.code()), Ok(role));
        }
        assert_eq!(BeaconRole::try_from(7), Err(UnknownRole(7)));
    }

    #[test]
    fn test_non_consensus_roles() {
        assert!(BeaconRole::Attester.runs_consensus());
        assert!(BeaconRole::Proposer.runs_consensus());
        assert!(!BeaconRole::ValidatorRegistration.runs_consensus());
        assert!(!BeaconRole::VoluntaryExit.runs_consensus());
    }

    #[test]
    fn test_role_serde_json() {
        let json = serde_json::to_string(&BeaconRole::SyncCommittee).unwrap();
        assert_eq!(json, "\"SyncCommittee\"");
        let back: BeaconRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BeaconRole::SyncCommittee);
    }
}
