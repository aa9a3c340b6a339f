//! Frame pointer to function range mapping for one stop of the target.

use alloc::collections::BTreeMap;
use core::fmt;

use crate::Addr;

/// The machine code `[start, end)` of one JIT-compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionRange {
    pub start: Addr,
    pub end: Addr,
}

impl FunctionRange {
    pub fn new(start: impl Into<Addr>, end: impl Into<Addr>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, pc: Addr) -> bool {
        self.start <= pc && pc < self.end
    }
}

/// Formats as the synthetic function name, `JIT[0x400000, 0x400100]`.
impl fmt::Display for FunctionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JIT[{:#x}, {:#x}]", self.start, self.end)
    }
}

/// Function ranges of classified frames, keyed by the frame pointer the frame
/// had when it was classified.
///
/// Frame pointers are stack slots and get reused once the target runs again,
/// so the whole cache must be cleared on every resume.
#[derive(Debug, Default)]
pub struct RangeCache {
    ranges: BTreeMap<u64, FunctionRange>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: Addr) -> Option<FunctionRange> {
        self.ranges.get(&key.addr()).copied()
    }

    /// Last write wins.
    pub fn insert(&mut self, key: Addr, range: FunctionRange) {
        if let Some(old) = self.ranges.insert(key.addr(), range) {
            if old != range {
                trace!(?key, %old, new = %range, "replaced cached range");
            }
        }
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
