//! Message Validator - consensus message admission
//!
//! # Check order
//! 1. Role gate, signature format, message type, signer set
//! 2. Slot time, role round ceiling, estimated round window
//! 3. Full data root, beacon duty existence
//! 4. Signer behavior against stored state, justification structure
//!    (checked after the first signer's behavior)
//! 5. Signature verification (caller supplied, the only expensive step)
//! 6. Commit of signer state
//!
//! The first failing check rejects the message and nothing is stored.
//!
//! # Locking
//! Steps 1-3 and 5 hold no lock. Steps 4 and 6 lock the signer states of the
//! message's (validator, role) pair; step 6 re-runs the behavior checks under
//! the same lock as the commit, so a message admitted concurrently during
//! signature verification is never regressed over. A pair's state is only
//! created by step 6.

use crate::adapters::BeaconSlotTimePolicy;
use crate::domain::{
    hash_data_root, round_robin_proposer, Accepted, ConfigError, ConsensusDescriptor,
    ConsensusState, CountedKind, MessageCounts, MessageId, MessageType, Rejection,
    RoundTimeEstimator, Share, SignedQbftMessage, SignerState, ValidationConfig, ValidationError,
    ValidationResult,
};
use crate::metrics;
use crate::ports::{
    BeaconNetwork, DutyStore, MessageValidationApi, ProposalJustificationVerifier,
    SignatureVerifier, SlotTimePolicy,
};
use parking_lot::{Mutex, RwLock};
use shared_types::{BeaconRole, OperatorId, Round, Slot, FIRST_ROUND};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, trace, warn};

/// Consensus message validator
///
/// Holds the signer states of every (validator, role) pair it has admitted
/// messages for. Pairs validate independently.
pub struct MessageValidator<N, D>
where
    N: BeaconNetwork,
    D: DutyStore,
{
    config: ValidationConfig,
    estimator: RoundTimeEstimator,
    network: Arc<N>,
    duty_store: Arc<D>,
    slot_time_policy: Box<dyn SlotTimePolicy>,
    justification_verifier: Option<Arc<dyn ProposalJustificationVerifier>>,
    states: RwLock<HashMap<MessageId, Arc<Mutex<ConsensusState>>>>,
}

impl<N, D> MessageValidator<N, D>
where
    N: BeaconNetwork + 'static,
    D: DutyStore,
{
    /// Create a validator with the beacon-grid slot time policy.
    pub fn new(
        config: ValidationConfig,
        network: Arc<N>,
        duty_store: Arc<D>,
    ) -> Result<Self, ConfigError> {
        let estimator = RoundTimeEstimator::from_config(&config)?;
        let slot_time_policy = Box::new(BeaconSlotTimePolicy::new(network.clone(), &config));
        Ok(Self {
            config,
            estimator,
            network,
            duty_store,
            slot_time_policy,
            justification_verifier: None,
            states: RwLock::new(HashMap::new()),
        })
    }
}

impl<N, D> MessageValidator<N, D>
where
    N: BeaconNetwork,
    D: DutyStore,
{
    /// Replace the slot time policy
    pub fn with_slot_time_policy(mut self, policy: Box<dyn SlotTimePolicy>) -> Self {
        self.slot_time_policy = policy;
        self
    }

    /// Install a proposal justification verifier
    pub fn with_justification_verifier(
        mut self,
        verifier: Arc<dyn ProposalJustificationVerifier>,
    ) -> Self {
        self.justification_verifier = Some(verifier);
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Snapshot of a signer's state, `None` before its first admitted message.
    pub fn signer_state(&self, id: &MessageId, signer: OperatorId) -> Option<SignerState> {
        let state = self.states.read().get(id).cloned()?;
        let guard = state.lock();
        guard.get(signer).cloned()
    }

    /// Validate a consensus message and, if it passes, record it.
    pub fn validate(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        received_at: SystemTime,
        verifier: &dyn SignatureVerifier,
    ) -> Result<Accepted, Rejection> {
        let descriptor = ConsensusDescriptor::new(share, msg);
        let slot = msg.slot();
        let role = msg.message.identifier.role;

        metrics::record_consensus_message(
            descriptor.msg_type.map_or("unknown", MessageType::as_str),
            msg.signers.len(),
        );

        match self.validate_consensus_message(share, msg, received_at, verifier) {
            Ok(()) => {
                trace!(
                    role = %role,
                    slot,
                    round = msg.message.round,
                    signers = ?msg.signers,
                    "Consensus message accepted"
                );
                metrics::record_accepted();
                Ok(Accepted { descriptor, slot })
            }
            Err(error) => {
                if error.is_internal() {
                    warn!(role = %role, slot, error = %error, "Consensus message validation fault");
                } else {
                    debug!(
                        role = %role,
                        slot,
                        round = msg.message.round,
                        signers = ?msg.signers,
                        reason = error.kind(),
                        "Consensus message rejected"
                    );
                }
                metrics::record_rejected(error.kind());
                Err(Rejection {
                    descriptor,
                    slot,
                    error,
                })
            }
        }
    }

    fn validate_consensus_message(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        received_at: SystemTime,
        verifier: &dyn SignatureVerifier,
    ) -> ValidationResult<()> {
        let id = msg.message.identifier;
        let role = id.role;
        let slot = msg.slot();
        let round = msg.message.round;

        if id.validator_pk != share.validator_pk {
            return Err(ValidationError::UnknownValidator);
        }

        if !role.runs_consensus() {
            return Err(ValidationError::UnexpectedConsensusMessage { role });
        }

        self.validate_signature_format(&msg.signature)?;

        let msg_type = MessageType::try_from(msg.message.msg_type)
            .map_err(|got| ValidationError::UnknownMessageType { got })?;

        self.validate_signers(share, msg, msg_type)?;

        self.slot_time_policy
            .validate_slot_time(slot, role, received_at)?;

        let max_round = self.config.max_round(role);
        if round > max_round {
            return Err(ValidationError::RoundTooHigh {
                role,
                got: round,
                want: max_round,
            });
        }

        self.validate_round_window(slot, round, role, received_at)?;

        if msg.has_full_data() && hash_data_root(&msg.full_data) != msg.message.root {
            return Err(ValidationError::InvalidHash);
        }

        self.validate_beacon_duty(role, slot, share)?;

        // A pair without stored state has only first-time signers. Its state
        // is created on commit, so rejected messages leave no entry behind.
        let known = self.states.read().get(&id).cloned();
        let Some((first, rest)) = msg.signers.split_first() else {
            return Err(ValidationError::NoSigners);
        };
        // Justifications don't depend on the signer. They are checked once,
        // after the first signer's behavior and before the others'.
        if let Some(state) = &known {
            self.validate_signers_behavior(
                &state.lock(),
                std::slice::from_ref(first),
                share,
                msg,
                msg_type,
            )?;
        }
        self.validate_justifications(share, msg, msg_type)?;
        if let Some(state) = &known {
            self.validate_signers_behavior(&state.lock(), rest, share, msg, msg_type)?;
        }

        if !verifier.verify(msg) {
            return Err(ValidationError::SignatureVerificationFailed);
        }

        let state = self.consensus_state(&id);
        let mut guard = state.lock();
        self.validate_signers_behavior(&guard, &msg.signers, share, msg, msg_type)?;
        self.commit(&mut guard, msg, msg_type);
        Ok(())
    }

    fn validate_signature_format(&self, signature: &[u8]) -> ValidationResult<()> {
        if signature.len() != self.config.signature_len {
            return Err(ValidationError::WrongSignatureSize {
                got: signature.len(),
                want: self.config.signature_len,
            });
        }
        if signature.iter().all(|b| *b == 0) {
            return Err(ValidationError::ZeroSignature);
        }
        Ok(())
    }

    fn validate_signers(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        msg_type: MessageType,
    ) -> ValidationResult<()> {
        let signers = &msg.signers;
        match signers.len() {
            0 => return Err(ValidationError::NoSigners),
            1 => {
                if msg_type == MessageType::Proposal {
                    self.validate_leader(share, msg, signers[0])?;
                }
            }
            count if msg_type != MessageType::Commit => {
                return Err(ValidationError::NonDecidedWithMultipleSigners {
                    msg_type,
                    got: count,
                });
            }
            count if !share.has_quorum(count) || count > share.committee_size() => {
                return Err(ValidationError::WrongSignersLength {
                    got: count,
                    min: share.quorum(),
                    max: share.committee_size(),
                });
            }
            _ => {}
        }

        if !signers.windows(2).all(|pair| pair[0] <= pair[1]) {
            return Err(ValidationError::SignersNotSorted);
        }

        let mut previous = None;
        for &signer in signers {
            if signer == 0 {
                return Err(ValidationError::ZeroSigner);
            }
            if !share.contains(signer) {
                return Err(ValidationError::SignerNotInCommittee { signer });
            }
            if previous == Some(signer) {
                return Err(ValidationError::DuplicatedSigner { signer });
            }
            previous = Some(signer);
        }
        Ok(())
    }

    fn validate_leader(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        signer: OperatorId,
    ) -> ValidationResult<()> {
        let Some(leader) =
            round_robin_proposer(msg.message.height, msg.message.round, &share.committee)
        else {
            return Err(ValidationError::SignerNotInCommittee { signer });
        };
        if signer != leader {
            return Err(ValidationError::SignerNotLeader {
                got: signer,
                want: leader,
            });
        }
        Ok(())
    }

    fn validate_round_window(
        &self,
        slot: Slot,
        round: Round,
        role: BeaconRole,
        received_at: SystemTime,
    ) -> ValidationResult<()> {
        let since_slot_start = self
            .network
            .slot_start_time(slot)
            .and_then(|start| received_at.duration_since(start).ok())
            .unwrap_or(Duration::ZERO);

        let estimated_round = if since_slot_start.is_zero() {
            FIRST_ROUND
        } else {
            self.estimator.estimate_round(since_slot_start)?
        };

        let lowest_allowed = match self.config.allowed_rounds_in_past {
            Some(past) => estimated_round.saturating_sub(past).max(FIRST_ROUND),
            None => FIRST_ROUND,
        };
        let highest_allowed = estimated_round.saturating_add(self.config.allowed_rounds_in_future);

        trace!(
            role = %role,
            slot,
            estimated_round,
            ?since_slot_start,
            duty_offset = ?self
                .config
                .wait_after_slot_start(role, self.network.slot_duration()),
            "Estimated round"
        );

        if round < lowest_allowed || round > highest_allowed {
            return Err(ValidationError::EstimatedRoundTooFar {
                role,
                got: round,
                min: lowest_allowed,
                max: highest_allowed,
                since_slot_start,
            });
        }
        Ok(())
    }

    fn validate_beacon_duty(
        &self,
        role: BeaconRole,
        slot: Slot,
        share: &Share,
    ) -> ValidationResult<()> {
        match role {
            BeaconRole::Proposer => {
                let metadata = share
                    .beacon_metadata
                    .ok_or(ValidationError::NoShareMetadata)?;
                let epoch = self.network.epoch_at_slot(slot);
                if self
                    .duty_store
                    .proposer_duty(epoch, slot, metadata.index)
                    .is_none()
                {
                    return Err(ValidationError::NoDuty { role, slot });
                }
                Ok(())
            }
            BeaconRole::SyncCommittee | BeaconRole::SyncCommitteeContribution => {
                let metadata = share
                    .beacon_metadata
                    .ok_or(ValidationError::NoShareMetadata)?;
                let epoch = self.network.epoch_at_slot(slot);
                let period = self.network.sync_committee_period_at_epoch(epoch);
                if self
                    .duty_store
                    .sync_committee_duty(period, metadata.index)
                    .is_none()
                {
                    return Err(ValidationError::NoDuty { role, slot });
                }
                Ok(())
            }
            BeaconRole::Attester
            | BeaconRole::Aggregator
            | BeaconRole::ValidatorRegistration
            | BeaconRole::VoluntaryExit => Ok(()),
        }
    }

    fn validate_signers_behavior(
        &self,
        state: &ConsensusState,
        signers: &[OperatorId],
        share: &Share,
        msg: &SignedQbftMessage,
        msg_type: MessageType,
    ) -> ValidationResult<()> {
        let limits =
            MessageCounts::limits(share.committee_size(), self.config.message_retransmissions);
        let kind = CountedKind::of(msg_type, msg.signers.len());

        for &signer in signers {
            // first message of the signer, nothing to compare against
            let Some(signer_state) = state.get(signer) else {
                continue;
            };
            self.validate_signer_behavior(signer_state, msg, kind, &limits)?;
        }
        Ok(())
    }

    fn validate_signer_behavior(
        &self,
        signer_state: &SignerState,
        msg: &SignedQbftMessage,
        kind: CountedKind,
        limits: &MessageCounts,
    ) -> ValidationResult<()> {
        let slot = msg.slot();
        let round = msg.message.round;

        // A signer ahead of us because of clock skew is caught by the early
        // message check, so a lower slot or round here is a real regression.
        if slot < signer_state.slot {
            return Err(ValidationError::SlotAlreadyAdvanced {
                got: slot,
                want: signer_state.slot,
            });
        }
        if slot == signer_state.slot && round < signer_state.round {
            return Err(ValidationError::RoundAlreadyAdvanced {
                got: round,
                want: signer_state.round,
            });
        }

        let new_duty_in_same_epoch = slot > signer_state.slot
            && self.network.epoch_at_slot(slot) == self.network.epoch_at_slot(signer_state.slot);
        self.validate_duty_count(signer_state, msg.message.identifier.role, new_duty_in_same_epoch)?;

        if slot == signer_state.slot && round == signer_state.round {
            if msg.has_full_data() {
                if let Some(cached) = &signer_state.proposal_data {
                    if *cached != msg.full_data {
                        return Err(ValidationError::DifferentProposalData);
                    }
                }
            }
            signer_state.message_counts.validate(kind, limits)?;
        }
        Ok(())
    }

    fn validate_duty_count(
        &self,
        signer_state: &SignerState,
        role: BeaconRole,
        new_duty_in_same_epoch: bool,
    ) -> ValidationResult<()> {
        if !self.config.is_duty_count_limited(role) {
            return Ok(());
        }

        // a message for the stored slot or a new epoch starts no extra duty
        let mut limit = self.config.max_duties_per_epoch;
        if !new_duty_in_same_epoch {
            limit = limit.saturating_add(1);
        }

        if signer_state.epoch_duties >= limit {
            return Err(ValidationError::TooManyDutiesPerEpoch {
                role,
                got: signer_state.epoch_duties,
                want: self.config.max_duties_per_epoch,
            });
        }
        Ok(())
    }

    fn validate_justifications(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        msg_type: MessageType,
    ) -> ValidationResult<()> {
        let prepare_justifications = msg
            .message
            .prepare_justifications()
            .map_err(|source| ValidationError::MalformedPrepareJustifications { source })?;
        if !prepare_justifications.is_empty() && msg_type != MessageType::Proposal {
            return Err(ValidationError::UnexpectedPrepareJustifications { msg_type });
        }

        let round_change_justifications = msg
            .message
            .round_change_justifications()
            .map_err(|source| ValidationError::MalformedRoundChangeJustifications { source })?;
        if !round_change_justifications.is_empty()
            && !matches!(msg_type, MessageType::Proposal | MessageType::RoundChange)
        {
            return Err(ValidationError::UnexpectedRoundChangeJustifications { msg_type });
        }

        if msg_type == MessageType::Proposal {
            if let Some(verifier) = &self.justification_verifier {
                verifier
                    .verify_proposal_justification(
                        share,
                        msg,
                        &round_change_justifications,
                        &prepare_justifications,
                    )
                    .map_err(|reason| ValidationError::InvalidJustifications { reason })?;
            }
        }
        Ok(())
    }

    fn commit(&self, state: &mut ConsensusState, msg: &SignedQbftMessage, msg_type: MessageType) {
        let slot = msg.slot();
        let round = msg.message.round;
        let kind = CountedKind::of(msg_type, msg.signers.len());

        for &signer in &msg.signers {
            let signer_state = state.get_or_create(signer);
            if slot > signer_state.slot {
                let new_epoch =
                    self.network.epoch_at_slot(slot) > self.network.epoch_at_slot(signer_state.slot);
                signer_state.reset_slot(slot, round, new_epoch);
            } else if slot == signer_state.slot && round > signer_state.round {
                signer_state.reset(round);
            }

            // Only a proposal may set the cached data, otherwise any signer
            // could pin it with a round change.
            if msg_type == MessageType::Proposal
                && msg.has_full_data()
                && signer_state.proposal_data.is_none()
            {
                signer_state.proposal_data = Some(msg.full_data.clone());
            }

            signer_state.message_counts.record(kind);
        }
    }

    fn consensus_state(&self, id: &MessageId) -> Arc<Mutex<ConsensusState>> {
        if let Some(state) = self.states.read().get(id) {
            return state.clone();
        }
        self.states.write().entry(*id).or_default().clone()
    }
}

impl<N, D> MessageValidationApi for MessageValidator<N, D>
where
    N: BeaconNetwork,
    D: DutyStore,
{
    fn validate_consensus_message(
        &self,
        share: &Share,
        msg: &SignedQbftMessage,
        received_at: SystemTime,
        verifier: &dyn SignatureVerifier,
    ) -> Result<Accepted, Rejection> {
        self.validate(share, msg, received_at, verifier)
    }
}
