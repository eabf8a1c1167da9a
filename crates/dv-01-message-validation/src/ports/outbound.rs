//! Driven ports (Outbound dependencies)

use crate::domain::{
    ProposerDuty, Share, SignedQbftMessage, SyncCommitteeDuty, ValidationResult,
};
use shared_types::{BeaconRole, Epoch, Slot, SyncCommitteePeriod, ValidatorIndex};
use std::time::{Duration, SystemTime};

/// Beacon-chain time grid
pub trait BeaconNetwork: Send + Sync {
    /// Wall-clock start of a slot, `None` if it is not representable.
    fn slot_start_time(&self, slot: Slot) -> Option<SystemTime>;

    fn epoch_at_slot(&self, slot: Slot) -> Epoch;

    fn sync_committee_period_at_epoch(&self, epoch: Epoch) -> SyncCommitteePeriod;

    fn slot_duration(&self) -> Duration;

    fn slots_per_epoch(&self) -> u64;
}

/// Duties assigned to validators, as fetched from the beacon node
pub trait DutyStore: Send + Sync {
    fn proposer_duty(
        &self,
        epoch: Epoch,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Option<ProposerDuty>;

    fn sync_committee_duty(
        &self,
        period: SyncCommitteePeriod,
        validator_index: ValidatorIndex,
    ) -> Option<SyncCommitteeDuty>;
}

/// Window within which a message for a slot may arrive
pub trait SlotTimePolicy: Send + Sync {
    fn validate_slot_time(
        &self,
        slot: Slot,
        role: BeaconRole,
        received_at: SystemTime,
    ) -> ValidationResult<()>;
}

/// Cryptographic signature check supplied per message by the caller.
///
/// Must be free of side effects. Any `Fn(&SignedQbftMessage) -> bool`
/// closure is a verifier.
pub trait SignatureVerifier {
    fn verify(&self, msg: &SignedQbftMessage) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&SignedQbftMessage) -> bool,
{
    fn verify(&self, msg: &SignedQbftMessage) -> bool {
        self(msg)
    }
}

/// Verifier for a proposal's justifications: the round change quorum and
/// the prepared value it claims.
///
/// Not installed by default. The justification rules are still moving
/// upstream, so only structural justification checks run without one.
pub trait ProposalJustificationVerifier: Send + Sync {
    fn verify_proposal_justification(
        &self,
        share: &Share,
        proposal: &SignedQbftMessage,
        round_change_justifications: &[SignedQbftMessage],
        prepare_justifications: &[SignedQbftMessage],
    ) -> Result<(), String>;
}
