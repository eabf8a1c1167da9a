//! # Message Validation Metrics
//!
//! Prometheus metrics for monitoring consensus message admission.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! dv-01-message-validation = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `message_validation_consensus_total` - Consensus messages seen, by type and signer count
//! - `message_validation_accepted_total` - Consensus messages admitted
//! - `message_validation_rejected_total` - Consensus messages rejected, by reason

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Consensus messages seen, labeled by message type and signer count
    pub static ref CONSENSUS_MESSAGES: IntCounterVec = register_int_counter_vec!(
        "message_validation_consensus_total",
        "Total number of consensus messages seen by validation",
        &["msg_type", "signers"]
    )
    .expect("Failed to create CONSENSUS_MESSAGES metric");

    /// Consensus messages admitted
    pub static ref MESSAGES_ACCEPTED: IntCounter = register_int_counter!(
        "message_validation_accepted_total",
        "Total number of consensus messages accepted"
    )
    .expect("Failed to create MESSAGES_ACCEPTED metric");

    /// Consensus messages rejected, labeled by rejection reason
    pub static ref MESSAGES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "message_validation_rejected_total",
        "Total number of consensus messages rejected",
        &["reason"]
    )
    .expect("Failed to create MESSAGES_REJECTED metric");
}

/// Record a consensus message entering validation
#[cfg(feature = "metrics")]
pub fn record_consensus_message(msg_type: &str, signers: usize) {
    CONSENSUS_MESSAGES
        .with_label_values(&[msg_type, &signers.to_string()])
        .inc();
}

/// Record an accepted message
#[cfg(feature = "metrics")]
pub fn record_accepted() {
    MESSAGES_ACCEPTED.inc();
}

/// Record a rejected message with reason
#[cfg(feature = "metrics")]
pub fn record_rejected(reason: &str) {
    MESSAGES_REJECTED.with_label_values(&[reason]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_consensus_message(_msg_type: &str, _signers: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_reason: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        // These should compile and run without panic even without metrics feature
        record_consensus_message("proposal", 1);
        record_accepted();
        record_rejected("signer-not-leader");
    }
}
