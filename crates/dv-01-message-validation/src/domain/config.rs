//! Validation configuration
//!
//! All timing constants, per-role ceilings and rate limits live here and are
//! fixed once a [`MessageValidator`](crate::MessageValidator) is built.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use shared_types::{BeaconRole, Round};
use std::time::Duration;

/// Highest round a message may carry, per role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundCeilings {
    /// Attester and aggregator
    pub attestation: Round,
    /// Proposer, sync committee and sync committee contribution
    pub block_and_sync: Round,
}

impl Default for RoundCeilings {
    fn default() -> Self {
        Self {
            attestation: 12,
            block_and_sync: 6,
        }
    }
}

/// Configuration for consensus message validation
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Duration of each of the first `quick_timeout_threshold` rounds
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub quick_timeout: Duration,
    /// Number of quick rounds
    pub quick_timeout_threshold: Round,
    /// Duration of every round after the quick ones
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub slow_timeout: Duration,
    /// Rounds a message may run ahead of the estimated round
    pub allowed_rounds_in_future: Round,
    /// Rounds a message may lag behind the estimated round.
    ///
    /// `None` keeps the lower bound at the first round. The first round's
    /// start is not deterministic across operators yet, so this stays unset
    /// until that is settled.
    pub allowed_rounds_in_past: Option<Round>,
    /// Duties per epoch for duty-count-limited roles
    pub max_duties_per_epoch: u64,
    /// Extra same-type messages a signer may repeat within one round
    pub message_retransmissions: u64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub clock_error_tolerance: Duration,
    /// Slots a message stays acceptable after its role's TTL
    pub late_slot_allowance: u64,
    /// Expected BLS signature length in bytes
    pub signature_len: usize,
    pub round_ceilings: RoundCeilings,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            quick_timeout: Duration::from_secs(2),
            quick_timeout_threshold: 8,
            slow_timeout: Duration::from_secs(120),
            allowed_rounds_in_future: 1,
            allowed_rounds_in_past: None,
            max_duties_per_epoch: 2,
            message_retransmissions: 1,
            clock_error_tolerance: Duration::from_millis(50),
            late_slot_allowance: 2,
            signature_len: 96,
            round_ceilings: RoundCeilings::default(),
        }
    }
}

impl ValidationConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quick_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "quick_timeout",
            });
        }
        if self.slow_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                field: "slow_timeout",
            });
        }
        if self.quick_phase().is_none() {
            return Err(ConfigError::QuickPhaseOverflow {
                threshold: self.quick_timeout_threshold,
                quick_timeout: self.quick_timeout,
            });
        }
        if self.signature_len == 0 {
            return Err(ConfigError::ZeroSignatureLength);
        }
        Ok(())
    }

    /// Total length of the quick round phase, `None` on overflow.
    pub fn quick_phase(&self) -> Option<Duration> {
        let threshold = u32::try_from(self.quick_timeout_threshold).ok()?;
        self.quick_timeout.checked_mul(threshold)
    }

    /// Highest round a message of the role may carry.
    pub fn max_round(&self, role: BeaconRole) -> Round {
        match role {
            BeaconRole::Attester | BeaconRole::Aggregator => self.round_ceilings.attestation,
            BeaconRole::Proposer
            | BeaconRole::SyncCommittee
            | BeaconRole::SyncCommitteeContribution => self.round_ceilings.block_and_sync,
            BeaconRole::ValidatorRegistration | BeaconRole::VoluntaryExit => 0,
        }
    }

    /// Whether the role is limited to `max_duties_per_epoch`.
    pub fn is_duty_count_limited(&self, role: BeaconRole) -> bool {
        matches!(
            role,
            BeaconRole::Attester
                | BeaconRole::Aggregator
                | BeaconRole::ValidatorRegistration
                | BeaconRole::VoluntaryExit
        )
    }

    /// Offset into the slot at which a role's duty starts.
    ///
    /// Not applied to the round window: operators don't agree on when the
    /// first round starts, so the window is measured from the slot start.
    pub fn wait_after_slot_start(&self, role: BeaconRole, slot_duration: Duration) -> Duration {
        match role {
            BeaconRole::Attester | BeaconRole::SyncCommittee => slot_duration / 3,
            BeaconRole::Aggregator | BeaconRole::SyncCommitteeContribution => {
                slot_duration / 3 * 2
            }
            BeaconRole::Proposer
            | BeaconRole::ValidatorRegistration
            | BeaconRole::VoluntaryExit => Duration::ZERO,
        }
    }
}
