//! Walkable transfers between nearby stops.
//!
//! Some stops are close enough to walk between even though no vehicle links
//! them, e.g. two platforms of an interchange loaded as separate stops.

use std::collections::HashMap;

use crate::domain::StopId;
use crate::store::TransitSnapshot;

use super::TransferGenerator;

/// A table of walkable stop pairs and their durations.
///
/// Walks are symmetric: if you can walk from A to B, you can walk from B to A
/// in the same time. Changes within one stop take the minimum change time.
#[derive(Debug, Clone, Default)]
pub struct WalkableTransfers {
    /// Walk duration in seconds, stored in both directions.
    walks: HashMap<(StopId, StopId), u32>,
    min_change_secs: u32,
}

impl WalkableTransfers {
    /// An empty table with the given change time within a stop.
    pub fn new(min_change_secs: u32) -> Self {
        Self {
            walks: HashMap::new(),
            min_change_secs,
        }
    }

    /// Add a walk between two stops, in both directions.
    pub fn add(&mut self, from: StopId, to: StopId, secs: u32) {
        self.walks.insert((from, to), secs);
        self.walks.insert((to, from), secs);
    }

    /// Walking time between two distinct stops, if walkable.
    pub fn get(&self, from: StopId, to: StopId) -> Option<u32> {
        self.walks.get(&(from, to)).copied()
    }

    pub fn is_walkable(&self, from: StopId, to: StopId) -> bool {
        self.walks.contains_key(&(from, to))
    }

    /// Number of walkable pairs, counting A→B and B→A once.
    pub fn len(&self) -> usize {
        self.walks.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.walks.is_empty()
    }
}

impl TransferGenerator for WalkableTransfers {
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
        if from == to {
            Some(self.min_change_secs)
        } else {
            self.get(from, to)
        }
    }

    fn neighbours(&self, stop: StopId) -> Vec<(StopId, u32)> {
        let mut found: Vec<(StopId, u32)> = self
            .walks
            .iter()
            .filter(|((f, t), _)| *f == stop && *t != stop)
            .map(|((_, t), secs)| (*t, *secs))
            .collect();
        found.sort_unstable();
        found
    }
}

/// Builds a [`WalkableTransfers`] from stop global ids.
///
/// Pairs naming a stop the snapshot doesn't know are skipped.
#[derive(Debug)]
pub struct WalkableTransfersBuilder<'a> {
    snapshot: &'a TransitSnapshot,
    inner: WalkableTransfers,
}

impl<'a> WalkableTransfersBuilder<'a> {
    pub fn new(snapshot: &'a TransitSnapshot, min_change_secs: u32) -> Self {
        Self {
            snapshot,
            inner: WalkableTransfers::new(min_change_secs),
        }
    }

    /// Add a walk between the stops with these global ids.
    pub fn add(mut self, from: &str, to: &str, secs: u32) -> Self {
        if let (Some(a), Some(b)) = (
            self.snapshot.stop_by_global_id(from),
            self.snapshot.stop_by_global_id(to),
        ) {
            self.inner.add(a.id, b.id, secs);
        }
        self
    }

    pub fn build(self) -> WalkableTransfers {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Attributes;
    use crate::store::TransitDb;

    fn stop(n: u32) -> StopId {
        StopId::new(0, n)
    }

    #[test]
    fn empty_table() {
        let walks = WalkableTransfers::new(120);
        assert!(walks.is_empty());
        assert_eq!(walks.len(), 0);
        assert!(walks.get(stop(0), stop(1)).is_none());
        assert_eq!(walks.time_between(stop(0), stop(0)), Some(120));
    }

    #[test]
    fn symmetric_lookup() {
        let mut walks = WalkableTransfers::new(120);
        walks.add(stop(0), stop(1), 300);

        assert_eq!(walks.len(), 1);
        assert_eq!(walks.time_between(stop(0), stop(1)), Some(300));
        assert_eq!(walks.time_between(stop(1), stop(0)), Some(300));
        assert!(walks.is_walkable(stop(1), stop(0)));
        assert!(!walks.is_walkable(stop(2), stop(0)));
    }

    #[test]
    fn neighbours_listed() {
        let mut walks = WalkableTransfers::new(120);
        walks.add(stop(0), stop(2), 200);
        walks.add(stop(0), stop(1), 300);

        assert_eq!(walks.neighbours(stop(0)), vec![(stop(1), 300), (stop(2), 200)]);
        assert_eq!(walks.neighbours(stop(2)), vec![(stop(0), 200)]);
        assert!(walks.neighbours(stop(5)).is_empty());
    }

    #[test]
    fn builder_resolves_global_ids() {
        let db = TransitDb::new(0);
        db.update(|w| {
            w.add_or_update_stop("north", 0.0, 0.0, Attributes::new());
            w.add_or_update_stop("south", 0.0, 0.0, Attributes::new());
            Ok(())
        })
        .unwrap();
        let snapshot = db.latest();

        let walks = WalkableTransfersBuilder::new(&snapshot, 60)
            .add("north", "south", 240)
            .add("north", "nowhere", 10)
            .build();

        assert_eq!(walks.len(), 1);
        assert_eq!(walks.time_between(stop(0), stop(1)), Some(240));
    }
}
