//! Observer Identifiers
//!
//! Ids are small positive integers. Released ids go on a stack and are handed
//! out again before the monotonic counter advances, so low ids come back
//! promptly after removal.

use std::fmt;

use crate::notifications::error::{NotiflyError, NotiflyResult};

/// Largest id an allocator will issue by default; keeps ids representable as
/// positive `i32` values next to the negative result codes.
pub const DEFAULT_MAX_OBSERVER_ID: u32 = i32::MAX as u32;

/// Identifier of a registered observer, always `>= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u32);

impl ObserverId {
    /// Returns `None` for zero
    pub fn new(raw: u32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Convert an integer received across an untyped boundary
    pub fn from_raw(raw: i64) -> Option<Self> {
        u32::try_from(raw).ok().and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The id as the positive integer adapters return
    pub fn as_i32(self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues and recycles observer ids
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
    limit: u32,
    released: Vec<ObserverId>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_OBSERVER_ID)
    }

    /// Allocator that never issues an id above `limit`, capped at
    /// [`DEFAULT_MAX_OBSERVER_ID`] so every id stays a distinct positive `i32`
    pub fn with_limit(limit: u32) -> Self {
        Self {
            next: 1,
            limit: limit.min(DEFAULT_MAX_OBSERVER_ID),
            released: Vec::new(),
        }
    }

    /// Most recently released id first, otherwise the next fresh one
    pub fn allocate(&mut self) -> NotiflyResult<ObserverId> {
        if let Some(id) = self.released.pop() {
            return Ok(id);
        }

        if self.next > self.limit {
            return Err(NotiflyError::NoMoreObserverIds);
        }

        let id = ObserverId(self.next);
        self.next += 1;
        Ok(id)
    }

    /// Return an id for reuse. The caller guarantees nothing references it anymore.
    pub fn release(&mut self, id: ObserverId) {
        debug_assert!(!self.released.contains(&id), "observer id {} released twice", id);
        self.released.push(id);
    }

    /// Number of ids currently handed out
    pub fn outstanding(&self) -> usize {
        (self.next.wrapping_sub(1) as usize).saturating_sub(self.released.len())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
