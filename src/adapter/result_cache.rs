//! Previous-result bookkeeping for the document adapter.
//!
//! Each adapter owns one [`HandleAllocator`]; each document the adapter serves
//! owns one [`ResultCache`] mapping the handles it has returned to the full
//! token array that handle stands for.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::semantic::ResultHandle;

/// Hands out result handles, strictly increasing from 1.
#[derive(Debug)]
pub struct HandleAllocator {
    next: AtomicU32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Next unused handle, or `None` once the `u32` space is used up.
    ///
    /// Handles are never reused, so exhaustion is reported instead of wrapping
    /// back to the reserved `0`.
    pub fn allocate(&self) -> Option<ResultHandle> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                (next != 0).then(|| next.wrapping_add(1))
            })
            .ok()
            .map(ResultHandle::new)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// What a returned handle stands for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviousResult {
    /// The provider's own id for the result, used to ask it for edits.
    pub result_id: Option<String>,
    /// Full token array behind the handle. `None` when only edits are known,
    /// in which case the handle cannot serve as a delta basis.
    pub tokens: Option<Arc<[u32]>>,
}

impl PreviousResult {
    pub fn new(result_id: Option<String>, tokens: Option<Vec<u32>>) -> Self {
        Self {
            result_id,
            tokens: tokens.map(Arc::from),
        }
    }
}

/// Previous results of one document, keyed by handle.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: BTreeMap<ResultHandle, PreviousResult>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a handle. `ResultHandle::NONE` never matches.
    pub fn get(&self, handle: ResultHandle) -> Option<&PreviousResult> {
        if handle.is_none() {
            return None;
        }
        self.entries.get(&handle)
    }

    pub fn insert(&mut self, handle: ResultHandle, result: PreviousResult) {
        self.entries.insert(handle, result);
    }

    /// Drop a handle. Unknown or already released handles are ignored.
    pub fn release(&mut self, handle: ResultHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// Evict the oldest entries until at most `max` remain.
    ///
    /// Returns the evicted handles.
    pub fn retain_newest(&mut self, max: usize) -> Vec<ResultHandle> {
        let mut evicted = Vec::new();
        while self.entries.len() > max {
            match self.entries.pop_first() {
                Some((handle, _)) => evicted.push(handle),
                None => break,
            }
        }
        evicted
    }

    pub fn handles(&self) -> Vec<ResultHandle> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
