//! Beacon network adapter
//!
//! Implements the BeaconNetwork port as pure arithmetic over a fixed slot
//! grid anchored at genesis.

use crate::ports::BeaconNetwork;
use shared_types::{Epoch, Slot, SyncCommitteePeriod};
use std::time::{Duration, SystemTime};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Beacon-chain time grid parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub genesis_time: SystemTime,
    pub slot_duration: Duration,
    pub slots_per_epoch: u64,
    pub epochs_per_sync_committee_period: u64,
}

impl NetworkConfig {
    /// Mainnet grid (12s slots, 32 slots per epoch, 256 epochs per sync
    /// committee period) anchored at `genesis_time`.
    pub fn new(genesis_time: SystemTime) -> Self {
        Self {
            genesis_time,
            slot_duration: Duration::from_secs(12),
            slots_per_epoch: 32,
            epochs_per_sync_committee_period: 256,
        }
    }

    pub fn with_slot_duration(mut self, slot_duration: Duration) -> Self {
        self.slot_duration = slot_duration;
        self
    }

    pub fn with_slots_per_epoch(mut self, slots_per_epoch: u64) -> Self {
        self.slots_per_epoch = slots_per_epoch;
        self
    }
}

impl BeaconNetwork for NetworkConfig {
    fn slot_start_time(&self, slot: Slot) -> Option<SystemTime> {
        let offset = self.slot_duration.as_nanos().checked_mul(u128::from(slot))?;
        let secs = u64::try_from(offset / NANOS_PER_SEC).ok()?;
        // remainder is below one second
        let nanos = (offset % NANOS_PER_SEC) as u32;
        self.genesis_time.checked_add(Duration::new(secs, nanos))
    }

    fn epoch_at_slot(&self, slot: Slot) -> Epoch {
        slot.checked_div(self.slots_per_epoch).unwrap_or_default()
    }

    fn sync_committee_period_at_epoch(&self, epoch: Epoch) -> SyncCommitteePeriod {
        epoch
            .checked_div(self.epochs_per_sync_committee_period)
            .unwrap_or_default()
    }

    fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_slot_start_time() {
        let genesis = UNIX_EPOCH + Duration::from_secs(1_606_824_023);
        let network = NetworkConfig::new(genesis);

        assert_eq!(network.slot_start_time(0), Some(genesis));
        assert_eq!(
            network.slot_start_time(10),
            Some(genesis + Duration::from_secs(120))
        );
    }

    #[test]
    fn test_unrepresentable_slot() {
        let network = NetworkConfig::new(UNIX_EPOCH);
        assert_eq!(network.slot_start_time(u64::MAX), None);
    }

    #[test]
    fn test_epoch_and_period() {
        let network = NetworkConfig::new(UNIX_EPOCH);
        assert_eq!(network.epoch_at_slot(31), 0);
        assert_eq!(network.epoch_at_slot(32), 1);
        assert_eq!(network.sync_committee_period_at_epoch(255), 0);
        assert_eq!(network.sync_committee_period_at_epoch(256), 1);
    }
}
