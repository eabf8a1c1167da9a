//! Round-robin proposer selection
//!
//! Each height starts with a different proposer, one position after the
//! previous height's first proposer, and every following round moves one
//! position further along the committee. The first height starts at index 0.

use super::CommitteeMember;
use shared_types::{Height, OperatorId, Round, FIRST_HEIGHT, FIRST_ROUND};

/// Expected proposer of `(height, round)`.
///
/// Returns `None` only for an empty committee.
pub fn round_robin_proposer(
    height: Height,
    round: Round,
    committee: &[CommitteeMember],
) -> Option<OperatorId> {
    let size = committee.len() as u64;
    if size == 0 {
        return None;
    }

    let first_round_index = if height == FIRST_HEIGHT {
        0
    } else {
        height % size
    };
    // (round - FIRST_ROUND) mod size, without underflow for round 0
    let round_offset = (round % size + size - FIRST_ROUND % size) % size;
    let index = (first_round_index + round_offset) % size;

    committee
        .get(usize::try_from(index).ok()?)
        .map(|member| member.operator_id)
}
