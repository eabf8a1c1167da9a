//! Slot-time policy over the beacon grid
//!
//! A message may not arrive before its slot starts (minus clock error
//! tolerance) and, for roles with a TTL, not after the TTL plus the late
//! slot allowance has run out.

use crate::domain::{ValidationConfig, ValidationError, ValidationResult};
use crate::ports::{BeaconNetwork, SlotTimePolicy};
use shared_types::{BeaconRole, Slot};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Early/late message check against the slot grid
pub struct BeaconSlotTimePolicy<N: BeaconNetwork> {
    network: Arc<N>,
    clock_error_tolerance: Duration,
    late_slot_allowance: u64,
}

impl<N: BeaconNetwork> BeaconSlotTimePolicy<N> {
    pub fn new(network: Arc<N>, config: &ValidationConfig) -> Self {
        Self {
            network,
            clock_error_tolerance: config.clock_error_tolerance,
            late_slot_allowance: config.late_slot_allowance,
        }
    }

    /// Slots after its own in which a message of the role is still useful.
    fn ttl(&self, role: BeaconRole) -> Option<u64> {
        match role {
            BeaconRole::Proposer
            | BeaconRole::SyncCommittee
            | BeaconRole::SyncCommitteeContribution => Some(1),
            BeaconRole::Attester | BeaconRole::Aggregator => Some(self.network.slots_per_epoch()),
            BeaconRole::ValidatorRegistration | BeaconRole::VoluntaryExit => None,
        }
    }

    fn early_message(&self, slot: Slot, received_at: SystemTime) -> ValidationResult<()> {
        let Some(slot_start) = self.network.slot_start_time(slot) else {
            return Err(ValidationError::EarlyMessage {
                slot,
                early_by: Duration::MAX,
            });
        };
        let earliest = slot_start
            .checked_sub(self.clock_error_tolerance)
            .unwrap_or(slot_start);

        match earliest.duration_since(received_at) {
            Ok(early_by) if !early_by.is_zero() => {
                Err(ValidationError::EarlyMessage { slot, early_by })
            }
            _ => Ok(()),
        }
    }

    fn late_message(
        &self,
        slot: Slot,
        role: BeaconRole,
        received_at: SystemTime,
    ) -> ValidationResult<()> {
        let Some(ttl) = self.ttl(role) else {
            return Ok(());
        };
        let deadline_slot = slot
            .saturating_add(ttl)
            .saturating_add(self.late_slot_allowance);
        let Some(deadline) = self
            .network
            .slot_start_time(deadline_slot)
            .and_then(|start| start.checked_add(self.clock_error_tolerance))
        else {
            return Ok(());
        };

        match received_at.duration_since(deadline) {
            Ok(late_by) if !late_by.is_zero() => {
                Err(ValidationError::LateMessage { slot, late_by })
            }
            _ => Ok(()),
        }
    }
}

impl<N: BeaconNetwork> SlotTimePolicy for BeaconSlotTimePolicy<N> {
    fn validate_slot_time(
        &self,
        slot: Slot,
        role: BeaconRole,
        received_at: SystemTime,
    ) -> ValidationResult<()> {
        self.early_message(slot, received_at)?;
        self.late_message(slot, role, received_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::NetworkConfig;
    use std::time::UNIX_EPOCH;

    fn policy() -> (Arc<NetworkConfig>, BeaconSlotTimePolicy<NetworkConfig>) {
        let network = Arc::new(NetworkConfig::new(UNIX_EPOCH));
        let policy = BeaconSlotTimePolicy::new(network.clone(), &ValidationConfig::default());
        (network, policy)
    }

    #[test]
    fn test_early_message() {
        let (network, policy) = policy();
        let start = network.slot_start_time(100).unwrap();

        let err = policy
            .validate_slot_time(100, BeaconRole::Proposer, start - Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EarlyMessage { slot: 100, .. }));

        // within clock error tolerance
        assert!(policy
            .validate_slot_time(100, BeaconRole::Proposer, start - Duration::from_millis(40))
            .is_ok());
    }

    #[test]
    fn test_late_message_by_role() {
        let (network, policy) = policy();
        // proposer ttl: 1 slot + 2 allowance
        let deadline = network.slot_start_time(103).unwrap();

        assert!(policy
            .validate_slot_time(100, BeaconRole::Proposer, deadline)
            .is_ok());
        let err = policy
            .validate_slot_time(100, BeaconRole::Proposer, deadline + Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::LateMessage { slot: 100, .. }));

        // attester ttl is a full epoch
        assert!(policy
            .validate_slot_time(100, BeaconRole::Attester, deadline + Duration::from_secs(1))
            .is_ok());
    }

    #[test]
    fn test_unrepresentable_slot_is_early() {
        let (_, policy) = policy();
        let err = policy
            .validate_slot_time(u64::MAX, BeaconRole::Attester, UNIX_EPOCH)
            .unwrap_err();
        assert!(matches!(err, ValidationError::EarlyMessage { .. }));
    }
}
