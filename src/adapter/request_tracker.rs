//! Request generations for one document, used to fence out-of-order completions.
//!
//! Every semantic token request for a document takes a new generation when it
//! starts. A request may only write its result into the document's cache if no
//! newer request has written first; an older request that finishes late is
//! stale and its result is dropped.
//!
//! Generations are counted per tracker, so documents never share state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generation number of a request.
pub type Generation = u64;

#[derive(Debug, Default)]
pub struct RequestTracker {
    /// Most recently started generation
    started: AtomicU64,
    /// Most recently committed generation; `u64::MAX` once closed
    committed: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a new request and returns its generation.
    pub fn start_request(&self) -> Generation {
        self.started.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a newer request already committed (or the tracker was closed).
    pub fn is_stale(&self, generation: Generation) -> bool {
        generation <= self.committed.load(Ordering::SeqCst)
    }

    /// Claims the commit slot for `generation`.
    ///
    /// Returns false if a newer generation has committed already.
    pub fn try_commit(&self, generation: Generation) -> bool {
        self.committed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |committed| {
                (generation > committed).then_some(generation)
            })
            .is_ok()
    }

    /// Marks every started and future request stale.
    /// Used when the document is closed.
    pub fn cancel_all(&self) {
        self.committed.store(u64::MAX, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.committed.load(Ordering::SeqCst) == u64::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tracking_basic() {
        let tracker = RequestTracker::new();

        let req1 = tracker.start_request();
        assert!(!tracker.is_stale(req1), "Request should be fresh");
        assert!(tracker.try_commit(req1), "Request should commit");
        assert!(tracker.is_stale(req1), "Committed request is no longer fresh");
        assert!(!tracker.try_commit(req1), "Request cannot commit twice");
    }

    #[test]
    fn test_in_order_completion_commits_both() {
        let tracker = RequestTracker::new();

        let req1 = tracker.start_request();
        let req2 = tracker.start_request();
        assert!(req2 > req1);

        assert!(tracker.try_commit(req1), "Older request finishing first commits");
        assert!(tracker.try_commit(req2), "Newer request still commits after it");
    }

    #[test]
    fn test_out_of_order_completion_fences_older() {
        let tracker = RequestTracker::new();

        let req1 = tracker.start_request();
        let req2 = tracker.start_request();

        assert!(tracker.try_commit(req2), "Newer request commits");
        assert!(tracker.is_stale(req1), "Older request should be stale");
        assert!(!tracker.try_commit(req1), "Older request must not commit");
    }

    #[test]
    fn test_cancel_all() {
        let tracker = RequestTracker::new();

        let req = tracker.start_request();
        tracker.cancel_all();
        assert!(tracker.is_closed());
        assert!(tracker.is_stale(req), "Request should be cancelled");
        assert!(!tracker.try_commit(req));

        let later = tracker.start_request();
        assert!(!tracker.try_commit(later), "Closed tracker accepts nothing");
    }

    #[test]
    fn test_trackers_are_independent() {
        let a = RequestTracker::new();
        let b = RequestTracker::new();

        let a1 = a.start_request();
        a.start_request();
        let b1 = b.start_request();

        assert_eq!(a1, 1);
        assert_eq!(b1, 1);
        assert!(a.try_commit(a1));
        assert!(!b.is_stale(b1));
    }
}
