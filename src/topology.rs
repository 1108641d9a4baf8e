//! Identities of participants within an execution context
//!
//! All participants of a run are organized in one context, the 'world'. Each participant is
//! addressed by its `Rank`, a zero-based ordinal that is smaller than the size of the world.
use std::os::raw::c_int;

use crate::error::Fault;

/// Identifies a certain participant within the execution context.
pub type Rank = c_int;

/// Upper bound in bytes on the length of a processor name.
///
/// Matches `MPI_MAX_PROCESSOR_NAME` of the common MPI implementations.
pub const MAX_PROCESSOR_NAME: usize = 256;

/// Checks that a context holds at least one participant.
pub fn check_size(size: Rank) -> Result<Rank, Fault> {
    if size < 1 {
        Err(Fault::InvalidSize(size))
    } else {
        Ok(size)
    }
}

/// Checks that `rank` addresses a participant in a context of `size`.
pub fn check_rank(rank: Rank, size: Rank) -> Result<Rank, Fault> {
    if (0..size).contains(&rank) {
        Ok(rank)
    } else {
        Err(Fault::RankOutOfRange { rank, size })
    }
}

/// Bounds a processor name to `MAX_PROCESSOR_NAME` bytes.
///
/// Truncation happens on a character boundary, so the result may be shorter than the bound.
pub fn bound_name(mut name: String) -> Result<String, Fault> {
    if name.len() > MAX_PROCESSOR_NAME {
        let mut end = MAX_PROCESSOR_NAME;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    if name.is_empty() {
        Err(Fault::EmptyName)
    } else {
        Ok(name)
    }
}
