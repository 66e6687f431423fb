use std::ops::Range;

use serde::Serialize;

/// Index of a participating worker in `[0, P)`.
pub type WorkerId = usize;

/// Contiguous slice `[lower, upper)` of the iteration space granted by one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Chunk {
    pub lower: usize,
    pub upper: usize,
}

impl Chunk {
    pub fn new(lower: usize, upper: usize) -> Self {
        debug_assert!(lower <= upper, "chunk bounds inverted: {lower}..{upper}");
        Self { lower, upper }
    }

    pub fn len(&self) -> usize {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.lower == self.upper
    }

    pub fn range(&self) -> Range<usize> {
        self.lower..self.upper
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// Outcome of a single claim against the shared scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// A chunk drawn from `donor`'s local queue.
    Chunk { chunk: Chunk, donor: WorkerId },
    /// Every local queue is empty; the pass is over for this worker.
    Exhausted,
}

impl Claim {
    /// The granted chunk, if any.
    pub fn chunk(&self) -> Option<Chunk> {
        match self {
            Claim::Chunk { chunk, .. } => Some(*chunk),
            Claim::Exhausted => None,
        }
    }
}

/// The not-yet-claimed suffix of one worker's initial block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalQueue {
    pub remaining: usize,
    pub next_start: usize,
}
