//! Departure-ordered access to connections.
//!
//! A [`DepartureIndex`] merges one or more snapshots into a single ordered
//! stream. Connections are ordered by the total key
//! `(departure time, source rank, position in source)`, so merged databases
//! enumerate deterministically and in both directions.
//!
//! Scans do not use the raw cursor directly: they go through
//! [`BatchCursor`], which groups connections sharing a departure time.

use crate::domain::{Connection, ConnectionId, Timestamp};

use super::snapshot::TransitSnapshot;

/// Direction of time in which a scan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Increasing departure time.
    Forward,
    /// Decreasing departure time.
    Backward,
}

/// Ordered view over the connections of one or more snapshots.
#[derive(Debug, Clone)]
pub struct DepartureIndex<'a> {
    sources: Vec<&'a TransitSnapshot>,
}

impl<'a> DepartureIndex<'a> {
    /// Index over a single database.
    pub fn new(snapshot: &'a TransitSnapshot) -> Self {
        Self {
            sources: vec![snapshot],
        }
    }

    /// Index over several independently loaded databases.
    pub fn merged(snapshots: impl IntoIterator<Item = &'a TransitSnapshot>) -> Self {
        Self {
            sources: snapshots.into_iter().collect(),
        }
    }

    /// The snapshots behind this index, in rank order.
    pub fn sources(&self) -> &[&'a TransitSnapshot] {
        &self.sources
    }

    /// Look up a connection in whichever source holds its database.
    pub fn connection(&self, id: ConnectionId) -> Option<&'a Connection> {
        self.sources.iter().find_map(|&s| s.connection(id))
    }

    /// Total number of connections in all sources.
    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.departures.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A cursor positioned before the first connection.
    pub fn cursor(&self) -> DepartureCursor<'_> {
        DepartureCursor {
            sources: &self.sources,
            seek: Timestamp::UNSET,
            current: None,
        }
    }
}

/// Position of a connection: (source rank, position in departure order).
type Position = (usize, usize);

/// A cursor stepping through connections in departure order.
///
/// After [`seek`](Self::seek)`(t)`, the first [`move_next`](Self::move_next)
/// lands on the first connection departing at or after `t`, and the first
/// [`move_previous`](Self::move_previous) lands on the last connection
/// departing at or before `t`. Later moves step one connection at a time.
/// A move that finds nothing returns false and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct DepartureCursor<'a> {
    sources: &'a [&'a TransitSnapshot],
    seek: Timestamp,
    current: Option<Position>,
}

impl<'a> DepartureCursor<'a> {
    /// Reposition the cursor around `time`.
    pub fn seek(&mut self, time: Timestamp) {
        self.seek = time;
        self.current = None;
    }

    /// The connection under the cursor, if the cursor has moved since seeking.
    pub fn current(&self) -> Option<&'a Connection> {
        let (rank, position) = self.current?;
        self.sources[rank].departure_at(position)
    }

    /// Advance to the next connection in increasing departure order.
    pub fn move_next(&mut self) -> bool {
        let current = self.current.and_then(|p| Some((p, self.time_at(p)?)));

        let mut best: Option<(Timestamp, Position)> = None;
        for (rank, source) in self.sources.iter().enumerate() {
            let candidate = match current {
                None => source.count_before(self.seek),
                Some(((r, p), t)) => match rank.cmp(&r) {
                    std::cmp::Ordering::Less => source.count_until(t),
                    std::cmp::Ordering::Equal => p + 1,
                    std::cmp::Ordering::Greater => source.count_before(t),
                },
            };
            let Some(connection) = source.departure_at(candidate) else {
                continue;
            };
            let key = (connection.departure_time(), (rank, candidate));
            if best.is_none_or(|b| key < b) {
                best = Some(key);
            }
        }

        match best {
            Some((_, position)) => {
                self.current = Some(position);
                true
            }
            None => false,
        }
    }

    /// Step back to the previous connection in departure order.
    pub fn move_previous(&mut self) -> bool {
        let current = self.current.and_then(|p| Some((p, self.time_at(p)?)));

        let mut best: Option<(Timestamp, Position)> = None;
        for (rank, source) in self.sources.iter().enumerate() {
            let after_candidate = match current {
                None => source.count_until(self.seek),
                Some(((r, p), t)) => match rank.cmp(&r) {
                    std::cmp::Ordering::Less => source.count_until(t),
                    std::cmp::Ordering::Equal => p,
                    std::cmp::Ordering::Greater => source.count_before(t),
                },
            };
            let Some(candidate) = after_candidate.checked_sub(1) else {
                continue;
            };
            let Some(connection) = source.departure_at(candidate) else {
                continue;
            };
            let key = (connection.departure_time(), (rank, candidate));
            if best.is_none_or(|b| key > b) {
                best = Some(key);
            }
        }

        match best {
            Some((_, position)) => {
                self.current = Some(position);
                true
            }
            None => false,
        }
    }

    /// Move one step in the given direction.
    pub fn advance(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.move_next(),
            Direction::Backward => self.move_previous(),
        }
    }

    fn time_at(&self, (rank, position): Position) -> Option<Timestamp> {
        self.sources[rank]
            .departure_at(position)
            .map(Connection::departure_time)
    }
}

/// Groups the connections of a cursor into batches of equal departure time.
///
/// The cursor always holds one connection of lookahead, so callers can test
/// the time of the next batch before consuming it.
#[derive(Debug, Clone)]
pub struct BatchCursor<'a> {
    cursor: DepartureCursor<'a>,
    direction: Direction,
    next: Option<&'a Connection>,
    batches: usize,
}

impl<'a> BatchCursor<'a> {
    /// Seek `index` to `start` and prepare to read batches in `direction`.
    pub fn new(index: &'a DepartureIndex<'a>, start: Timestamp, direction: Direction) -> Self {
        let mut cursor = index.cursor();
        cursor.seek(start);
        let next = if cursor.advance(direction) {
            cursor.current()
        } else {
            None
        };

        Self {
            cursor,
            direction,
            next,
            batches: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Departure time of the next batch, or `None` when the data runs out.
    pub fn peek_time(&self) -> Option<Timestamp> {
        self.next.map(Connection::departure_time)
    }

    /// Number of batches handed out so far.
    pub fn batches_read(&self) -> usize {
        self.batches
    }

    /// Move the next batch into `batch`, replacing its contents.
    ///
    /// Returns the departure time of the batch, or `None` when exhausted.
    pub fn next_batch(&mut self, batch: &mut Vec<&'a Connection>) -> Option<Timestamp> {
        batch.clear();
        let first = self.next?;
        let time = first.departure_time();
        batch.push(first);

        self.next = None;
        while self.cursor.advance(self.direction) {
            match self.cursor.current() {
                Some(c) if c.departure_time() == time => batch.push(c),
                other => {
                    self.next = other;
                    break;
                }
            }
        }

        self.batches += 1;
        Some(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attributes, ConnectionMode};
    use crate::store::{ConnectionInput, TransitDb};

    fn db_with(database_id: u32, departures: &[(&str, u64)]) -> TransitDb {
        let db = TransitDb::new(database_id);
        db.update(|w| {
            let a = w.add_or_update_stop("A", 0.0, 0.0, Attributes::new());
            let b = w.add_or_update_stop("B", 0.0, 0.0, Attributes::new());
            let trip = w.add_or_update_trip("T", None, Attributes::new());
            for (id, dep) in departures {
                w.add_or_update_connection(ConnectionInput {
                    global_id: (*id).to_string(),
                    departure_stop: a,
                    arrival_stop: b,
                    departure_time: Timestamp::from_secs(*dep),
                    travel_time: 60,
                    trip,
                    mode: ConnectionMode::NORMAL,
                })?;
            }
            Ok(())
        })
        .unwrap();
        db
    }

    fn ids(batch: &[&Connection]) -> Vec<String> {
        batch.iter().map(|c| c.global_id().to_string()).collect()
    }

    #[test]
    fn forward_seek_lands_on_first_at_or_after() {
        let db = db_with(0, &[("a", 100), ("b", 200), ("c", 300)]);
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);
        let mut cursor = index.cursor();

        cursor.seek(Timestamp::from_secs(150));
        assert!(cursor.move_next());
        assert_eq!(cursor.current().unwrap().global_id(), "b");

        cursor.seek(Timestamp::from_secs(200));
        assert!(cursor.move_next());
        assert_eq!(cursor.current().unwrap().global_id(), "b");
        assert!(cursor.move_next());
        assert_eq!(cursor.current().unwrap().global_id(), "c");
        assert!(!cursor.move_next());
        assert_eq!(cursor.current().unwrap().global_id(), "c");
    }

    #[test]
    fn backward_seek_lands_on_last_at_or_before() {
        let db = db_with(0, &[("a", 100), ("b", 200), ("c", 300)]);
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);
        let mut cursor = index.cursor();

        cursor.seek(Timestamp::from_secs(250));
        assert!(cursor.move_previous());
        assert_eq!(cursor.current().unwrap().global_id(), "b");
        assert!(cursor.move_previous());
        assert_eq!(cursor.current().unwrap().global_id(), "a");
        assert!(!cursor.move_previous());

        cursor.seek(Timestamp::from_secs(50));
        assert!(!cursor.move_previous());
        assert!(cursor.current().is_none());
    }

    #[test]
    fn direction_can_change_mid_scan() {
        let db = db_with(0, &[("a", 100), ("b", 200), ("c", 300)]);
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);
        let mut cursor = index.cursor();

        cursor.seek(Timestamp::from_secs(100));
        assert!(cursor.move_next());
        assert!(cursor.move_next());
        assert!(cursor.move_previous());
        assert_eq!(cursor.current().unwrap().global_id(), "a");
    }

    #[test]
    fn merged_sources_interleave() {
        let first = db_with(0, &[("x1", 100), ("x2", 300)]);
        let second = db_with(1, &[("y1", 200), ("y2", 300), ("y3", 400)]);
        let (s1, s2) = (first.latest(), second.latest());
        let index = DepartureIndex::merged([s1.as_ref(), s2.as_ref()]);
        assert_eq!(index.len(), 5);
        assert_eq!(index.connection(ConnectionId::new(1, 2)).unwrap().global_id(), "y3");
        assert!(index.connection(ConnectionId::new(2, 0)).is_none());

        let mut cursor = index.cursor();
        cursor.seek(Timestamp::from_secs(0));
        let mut forward = Vec::new();
        while cursor.move_next() {
            forward.push(cursor.current().unwrap().global_id().to_string());
        }
        assert_eq!(forward, ["x1", "y1", "x2", "y2", "y3"]);

        cursor.seek(Timestamp::from_secs(1_000));
        let mut backward = Vec::new();
        while cursor.move_previous() {
            backward.push(cursor.current().unwrap().global_id().to_string());
        }
        assert_eq!(backward, ["y3", "y2", "x2", "y1", "x1"]);
    }

    #[test]
    fn batches_group_equal_departures() {
        let db = db_with(0, &[("a", 100), ("b", 200), ("c", 200), ("d", 300)]);
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);

        let mut batches = BatchCursor::new(&index, Timestamp::from_secs(0), Direction::Forward);
        let mut batch = Vec::new();
        assert_eq!(batches.peek_time(), Some(Timestamp::from_secs(100)));
        assert_eq!(batches.next_batch(&mut batch), Some(Timestamp::from_secs(100)));
        assert_eq!(ids(&batch), ["a"]);
        assert_eq!(batches.next_batch(&mut batch), Some(Timestamp::from_secs(200)));
        assert_eq!(ids(&batch), ["b", "c"]);
        assert_eq!(batches.peek_time(), Some(Timestamp::from_secs(300)));
        assert_eq!(batches.next_batch(&mut batch), Some(Timestamp::from_secs(300)));
        assert_eq!(batches.next_batch(&mut batch), None);
        assert!(batch.is_empty());
        assert_eq!(batches.batches_read(), 3);
    }

    #[test]
    fn backward_batches_reverse_order() {
        let db = db_with(0, &[("a", 100), ("b", 200), ("c", 200), ("d", 300)]);
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);

        let mut batches = BatchCursor::new(&index, Timestamp::from_secs(250), Direction::Backward);
        let mut batch = Vec::new();
        assert_eq!(batches.next_batch(&mut batch), Some(Timestamp::from_secs(200)));
        assert_eq!(ids(&batch), ["c", "b"]);
        assert_eq!(batches.next_batch(&mut batch), Some(Timestamp::from_secs(100)));
        assert_eq!(batches.peek_time(), None);
    }

    #[test]
    fn trip_hops_in_one_batch_follow_the_trip() {
        let db = TransitDb::new(0);
        db.update(|w| {
            let [a, b, c, d] =
                ["A", "B", "C", "D"].map(|s| w.add_or_update_stop(s, 0.0, 0.0, Attributes::new()));
            let trip = w.add_or_update_trip("T", None, Attributes::new());
            let other = w.add_or_update_trip("X", None, Attributes::new());
            for (id, from, to, trip) in [
                ("cd", c, d, trip),
                ("x", d, a, other),
                ("bc", b, c, trip),
                ("ab", a, b, trip),
            ] {
                w.add_or_update_connection(ConnectionInput {
                    global_id: id.to_string(),
                    departure_stop: from,
                    arrival_stop: to,
                    departure_time: Timestamp::from_secs(100),
                    travel_time: 0,
                    trip,
                    mode: ConnectionMode::NORMAL,
                })?;
            }
            Ok(())
        })
        .unwrap();
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);
        let mut batch = Vec::new();

        let mut forward = BatchCursor::new(&index, Timestamp::from_secs(0), Direction::Forward);
        forward.next_batch(&mut batch);
        assert_eq!(ids(&batch), ["ab", "x", "bc", "cd"]);

        let mut backward = BatchCursor::new(&index, Timestamp::from_secs(100), Direction::Backward);
        backward.next_batch(&mut batch);
        assert_eq!(ids(&batch), ["cd", "bc", "x", "ab"]);
    }

    #[test]
    fn empty_index_yields_nothing() {
        let db = TransitDb::new(0);
        let snapshot = db.latest();
        let index = DepartureIndex::new(&snapshot);
        assert!(index.is_empty());
        let batches = BatchCursor::new(&index, Timestamp::from_secs(0), Direction::Forward);
        assert_eq!(batches.peek_time(), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Attributes, ConnectionMode};
    use crate::store::{ConnectionInput, TransitDb};
    use proptest::prelude::*;

    fn db_from(database_id: u32, departures: &[u64]) -> TransitDb {
        let db = TransitDb::new(database_id);
        db.update(|w| {
            let a = w.add_or_update_stop("A", 0.0, 0.0, Attributes::new());
            let trip = w.add_or_update_trip("T", None, Attributes::new());
            for (i, dep) in departures.iter().enumerate() {
                w.add_or_update_connection(ConnectionInput {
                    global_id: format!("c{i}"),
                    departure_stop: a,
                    arrival_stop: a,
                    departure_time: Timestamp::from_secs(*dep),
                    travel_time: 0,
                    trip,
                    mode: ConnectionMode::NORMAL,
                })?;
            }
            Ok(())
        })
        .unwrap();
        db
    }

    proptest! {
        /// Forward enumeration over merged sources is sorted and complete
        #[test]
        fn forward_is_sorted_and_complete(
            a in prop::collection::vec(1u64..50, 0..20),
            b in prop::collection::vec(1u64..50, 0..20),
            seek in 0u64..60,
        ) {
            let (da, db) = (db_from(0, &a), db_from(1, &b));
            let (sa, sb) = (da.latest(), db.latest());
            let index = DepartureIndex::merged([sa.as_ref(), sb.as_ref()]);

            let mut cursor = index.cursor();
            cursor.seek(Timestamp::from_secs(seek));
            let mut seen = Vec::new();
            while cursor.move_next() {
                seen.push(cursor.current().unwrap().departure_time().as_secs());
            }

            let mut expected: Vec<u64> = a.iter().chain(b.iter()).copied().filter(|&t| t >= seek).collect();
            expected.sort_unstable();
            prop_assert_eq!(seen, expected);
        }

        /// Backward enumeration visits exactly the reverse of forward enumeration
        #[test]
        fn backward_mirrors_forward(
            a in prop::collection::vec(1u64..50, 0..20),
            b in prop::collection::vec(1u64..50, 0..20),
        ) {
            let (da, db) = (db_from(0, &a), db_from(1, &b));
            let (sa, sb) = (da.latest(), db.latest());
            let index = DepartureIndex::merged([sa.as_ref(), sb.as_ref()]);

            let mut cursor = index.cursor();
            cursor.seek(Timestamp::UNSET);
            let mut forward = Vec::new();
            while cursor.move_next() {
                forward.push(cursor.current().unwrap().id());
            }

            cursor.seek(Timestamp::MAX);
            let mut backward = Vec::new();
            while cursor.move_previous() {
                backward.push(cursor.current().unwrap().id());
            }
            backward.reverse();
            prop_assert_eq!(forward, backward);
        }
    }
}
