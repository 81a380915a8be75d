//! Caching wrapper for expensive transfer generators.
//!
//! Generators are pure, so their answers can be kept for as long as the
//! cache has room. Entries are keyed by stop pair; time never enters the key.

use std::sync::Arc;

use moka::sync::Cache;

use crate::domain::StopId;

use super::TransferGenerator;

/// Remembers the answers of another generator.
///
/// Only `time_between` and `neighbours` are cached. Transfers between
/// connections are built from the cached times, so `inner` should use the
/// provided `generate` methods.
pub struct MemoizingTransferGenerator<G> {
    inner: G,
    times: Cache<(StopId, StopId), Option<u32>>,
    neighbours: Cache<StopId, Arc<Vec<(StopId, u32)>>>,
}

impl<G: TransferGenerator> MemoizingTransferGenerator<G> {
    /// Wrap `inner`, keeping at most `capacity` entries per cache.
    pub fn new(inner: G, capacity: u64) -> Self {
        Self {
            inner,
            times: Cache::builder().max_capacity(capacity).build(),
            neighbours: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: TransferGenerator> TransferGenerator for MemoizingTransferGenerator<G> {
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
        self.times
            .get_with((from, to), || self.inner.time_between(from, to))
    }

    fn neighbours(&self, stop: StopId) -> Vec<(StopId, u32)> {
        let found = self
            .neighbours
            .get_with(stop, || Arc::new(self.inner.neighbours(stop)));
        found.as_ref().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often it is asked.
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl TransferGenerator for Counting {
        fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (from.local_id() + 1 == to.local_id()).then_some(100)
        }

        fn neighbours(&self, stop: StopId) -> Vec<(StopId, u32)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![(StopId::new(0, stop.local_id() + 1), 100)]
        }
    }

    #[test]
    fn answers_cached() {
        let memo = MemoizingTransferGenerator::new(Counting::default(), 100);
        let (a, b) = (StopId::new(0, 0), StopId::new(0, 1));

        assert_eq!(memo.time_between(a, b), Some(100));
        assert_eq!(memo.time_between(a, b), Some(100));
        assert_eq!(memo.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn impossible_transfers_cached_too() {
        let memo = MemoizingTransferGenerator::new(Counting::default(), 100);
        let (a, b) = (StopId::new(0, 0), StopId::new(0, 5));

        assert_eq!(memo.time_between(a, b), None);
        assert_eq!(memo.time_between(a, b), None);
        assert_eq!(memo.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn neighbours_cached() {
        let memo = MemoizingTransferGenerator::new(Counting::default(), 100);
        let stop = StopId::new(0, 3);

        assert_eq!(memo.neighbours(stop), vec![(StopId::new(0, 4), 100)]);
        assert_eq!(memo.neighbours(stop), vec![(StopId::new(0, 4), 100)]);
        assert_eq!(memo.inner().calls.load(Ordering::SeqCst), 1);
    }
}
