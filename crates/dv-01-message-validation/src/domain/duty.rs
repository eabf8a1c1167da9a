//! Beacon duty entities looked up to confirm a message refers to a real duty

use serde::{Deserialize, Serialize};
use shared_types::{Slot, SyncCommitteePeriod, ValidatorIndex};

/// Block proposal assigned to a validator at a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerDuty {
    pub slot: Slot,
    pub validator_index: ValidatorIndex,
}

/// Sync committee membership of a validator for a period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommitteeDuty {
    pub period: SyncCommitteePeriod,
    pub validator_index: ValidatorIndex,
}
