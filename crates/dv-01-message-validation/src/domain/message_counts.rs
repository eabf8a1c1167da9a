//! # Per-Round Message Counters
//!
//! Bounds how many messages of each type one signer may get admitted within
//! a single (slot, round). Without it a signer could replay the same valid
//! message indefinitely and make every peer re-verify its signature.
//!
//! ## Limits
//!
//! Single-signer types get one message plus the configured number of
//! retransmissions. Decided messages are aggregated by any quorum subset, so
//! up to `n * (f + 1)` distinct ones are legitimate per round.

use super::{MessageType, ValidationError, ValidationResult};
use std::fmt;

/// Counted message categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CountedKind {
    Proposal,
    Prepare,
    Commit,
    /// Commit aggregated by more than one signer
    Decided,
    RoundChange,
}

impl CountedKind {
    pub fn of(msg_type: MessageType, signer_count: usize) -> Self {
        match msg_type {
            MessageType::Proposal => CountedKind::Proposal,
            MessageType::Prepare => CountedKind::Prepare,
            MessageType::Commit if signer_count > 1 => CountedKind::Decided,
            MessageType::Commit => CountedKind::Commit,
            MessageType::RoundChange => CountedKind::RoundChange,
        }
    }
}

impl fmt::Display for CountedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CountedKind::Proposal => "proposal",
            CountedKind::Prepare => "prepare",
            CountedKind::Commit => "commit",
            CountedKind::Decided => "decided",
            CountedKind::RoundChange => "round change",
        })
    }
}

/// Message counts of one signer within its current (slot, round)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageCounts {
    pub proposal: u64,
    pub prepare: u64,
    pub commit: u64,
    pub decided: u64,
    pub round_change: u64,
}

impl MessageCounts {
    /// Limits for a committee of `committee_size` operators.
    pub fn limits(committee_size: usize, retransmissions: u64) -> Self {
        let single = retransmissions.saturating_add(1);
        Self {
            proposal: single,
            prepare: single,
            commit: single,
            decided: max_decided_count(committee_size),
            round_change: single,
        }
    }

    pub fn get(&self, kind: CountedKind) -> u64 {
        match kind {
            CountedKind::Proposal => self.proposal,
            CountedKind::Prepare => self.prepare,
            CountedKind::Commit => self.commit,
            CountedKind::Decided => self.decided,
            CountedKind::RoundChange => self.round_change,
        }
    }

    fn slot_mut(&mut self, kind: CountedKind) -> &mut u64 {
        match kind {
            CountedKind::Proposal => &mut self.proposal,
            CountedKind::Prepare => &mut self.prepare,
            CountedKind::Commit => &mut self.commit,
            CountedKind::Decided => &mut self.decided,
            CountedKind::RoundChange => &mut self.round_change,
        }
    }

    /// Check one more message of `kind` stays within `limits`.
    pub fn validate(&self, kind: CountedKind, limits: &MessageCounts) -> ValidationResult<()> {
        let got = self.get(kind);
        let limit = limits.get(kind);
        if got >= limit {
            return Err(ValidationError::TooManyMessagesPerRound { kind, got, limit });
        }
        Ok(())
    }

    /// Record an admitted message.
    pub fn record(&mut self, kind: CountedKind) {
        let count = self.slot_mut(kind);
        *count = count.saturating_add(1);
    }
}

/// Distinct decided messages a round can legitimately produce: N * (f + 1).
fn max_decided_count(committee_size: usize) -> u64 {
    let n = committee_size as u64;
    let f = n.saturating_sub(1) / 3;
    n * (f + 1)
}
