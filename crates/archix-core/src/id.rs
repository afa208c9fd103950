use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// First value handed out by a fresh [`IdAllocator`].
pub const FIRST_SEQUENCE: u64 = 100;

/// Identifier of a modeled element, rendered as `<prefix>_<seq>` (e.g. `instance_101`).
///
/// Equality, hashing and ordering only look at `seq`: one allocator hands out every sequence
/// number exactly once, so `seq` alone is unique and gives the creation order.
#[derive(Debug, Clone, Copy)]
pub struct ElementId {
    prefix: &'static str,
    seq: u64,
}

impl ElementId {
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl PartialEq for ElementId {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for ElementId {}

impl Hash for ElementId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

impl PartialOrd for ElementId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ElementId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq.cmp(&other.seq)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.prefix, self.seq)
    }
}

/// Hands out element ids from a single counter shared by every prefix.
///
/// The counter is atomic so a session can be shared across threads for read-only work (e.g.
/// rendering systems concurrently) while systems keep allocating their own ids.
#[derive(Debug)]
pub struct IdAllocator {
    first: u64,
    next: AtomicU64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(FIRST_SEQUENCE)
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            first,
            next: AtomicU64::new(first),
        }
    }

    pub fn allocate(&self, prefix: &'static str) -> ElementId {
        let seq = self.next.fetch_add(1, AtomicOrdering::Relaxed);
        ElementId { prefix, seq }
    }

    /// Number of ids allocated so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(AtomicOrdering::Relaxed) - self.first
    }
}
