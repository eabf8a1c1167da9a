//! Domain layer for the message validation subsystem
//!
//! Pure logic and entities, no I/O:
//! - round_estimator: round the committee should be in, from elapsed time
//! - leader: round-robin proposer selection
//! - signer_state: per-signer behavior memory
//! - message_counts: per-round message limits

mod config;
mod descriptor;
mod duty;
mod error;
mod leader;
mod message;
mod message_counts;
mod round_estimator;
mod share;
mod signer_state;

pub use config::*;
pub use descriptor::*;
pub use duty::*;
pub use error::*;
pub use leader::*;
pub use message::*;
pub use message_counts::*;
pub use round_estimator::*;
pub use share::*;
pub use signer_state::*;
