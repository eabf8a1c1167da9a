//! In-memory duty store
//!
//! Implements the DutyStore port. Filled by the duty fetcher once per epoch
//! (proposers) or period (sync committee).

use crate::domain::{ProposerDuty, SyncCommitteeDuty};
use crate::ports::DutyStore;
use parking_lot::RwLock;
use shared_types::{Epoch, Slot, SyncCommitteePeriod, ValidatorIndex};
use std::collections::HashMap;

/// Duties indexed by epoch / period
#[derive(Debug, Default)]
pub struct InMemoryDutyStore {
    proposer: RwLock<HashMap<Epoch, Vec<ProposerDuty>>>,
    sync_committee: RwLock<HashMap<SyncCommitteePeriod, Vec<SyncCommitteeDuty>>>,
}

impl InMemoryDutyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the proposer duties of an epoch.
    pub fn set_proposer_duties(&self, epoch: Epoch, duties: Vec<ProposerDuty>) {
        self.proposer.write().insert(epoch, duties);
    }

    /// Replace the sync committee duties of a period.
    pub fn set_sync_committee_duties(
        &self,
        period: SyncCommitteePeriod,
        duties: Vec<SyncCommitteeDuty>,
    ) {
        self.sync_committee.write().insert(period, duties);
    }

    /// Drop proposer duties of epochs before `epoch`.
    pub fn prune_before(&self, epoch: Epoch) {
        self.proposer.write().retain(|e, _| *e >= epoch);
    }
}

impl DutyStore for InMemoryDutyStore {
    fn proposer_duty(
        &self,
        epoch: Epoch,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Option<ProposerDuty> {
        self.proposer
            .read()
            .get(&epoch)?
            .iter()
            .find(|d| d.slot == slot && d.validator_index == validator_index)
            .copied()
    }

    fn sync_committee_duty(
        &self,
        period: SyncCommitteePeriod,
        validator_index: ValidatorIndex,
    ) -> Option<SyncCommitteeDuty> {
        self.sync_committee
            .read()
            .get(&period)?
            .iter()
            .find(|d| d.validator_index == validator_index)
            .copied()
    }
}
