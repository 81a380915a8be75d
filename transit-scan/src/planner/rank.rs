//! Journey ranking for profile results.
//!
//! Ranks journeys by a combination of factors to present the most useful
//! options first.

use std::cmp::Ordering;

use crate::journey::{Journey, TransferMetric};

type Candidate = Journey<TransferMetric>;

fn changes(journey: &Candidate) -> u32 {
    journey.metric().changes()
}

/// Rank journeys by preference.
///
/// Journeys are ranked by:
/// 1. Arrival time (earlier is better)
/// 2. Number of changes (fewer is better)
/// 3. Total duration (shorter is better)
///
/// Returns journeys sorted best-first.
pub fn rank_journeys(mut journeys: Vec<Candidate>) -> Vec<Candidate> {
    journeys.sort_by(|a, b| {
        a.arrival_time()
            .cmp(&b.arrival_time())
            .then_with(|| changes(a).cmp(&changes(b)))
            .then_with(|| a.total_duration().cmp(&b.total_duration()))
    });

    journeys
}

/// Whether `a` is at least as good as `b` everywhere and better somewhere.
///
/// Compares departure time, arrival time and changes. Leaving later and
/// arriving no later also means taking no longer.
fn dominates(a: &Candidate, b: &Candidate) -> bool {
    a.departure_time() >= b.departure_time()
        && a.arrival_time() <= b.arrival_time()
        && changes(a) <= changes(b)
        && (a.departure_time() > b.departure_time()
            || a.arrival_time() < b.arrival_time()
            || changes(a) < changes(b))
}

/// Remove dominated journeys.
///
/// A journey is dominated if another journey leaves no earlier, arrives no
/// later and changes no more often, and is strictly better in one of those.
pub fn remove_dominated(journeys: Vec<Candidate>) -> Vec<Candidate> {
    if journeys.len() <= 1 {
        return journeys;
    }

    let mut result: Vec<Candidate> = Vec::with_capacity(journeys.len());

    for journey in journeys {
        if result.iter().any(|existing| dominates(existing, &journey)) {
            continue;
        }
        result.retain(|existing| !dominates(&journey, existing));
        result.push(journey);
    }

    result
}

/// Deduplicate journeys that are effectively identical.
///
/// Two journeys are duplicates if they depart and arrive at the same times
/// with the same number of changes. The shortest walk wins among them.
pub fn deduplicate(mut journeys: Vec<Candidate>) -> Vec<Candidate> {
    if journeys.len() <= 1 {
        return journeys;
    }

    let key = |j: &Candidate| (j.arrival_time(), j.departure_time(), changes(j));
    journeys.sort_by(|a, b| match key(a).cmp(&key(b)) {
        Ordering::Equal => a.metric().walking_time.cmp(&b.metric().walking_time),
        other => other,
    });

    let mut result = Vec::with_capacity(journeys.len());
    let mut last_key = None;

    for journey in journeys {
        let k = key(&journey);
        if last_key != Some(k) {
            result.push(journey);
            last_key = Some(k);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, ConnectionMode, StopId, Timestamp, TripId};
    use crate::store::Direction;
    use crate::transfers::Transfer;

    fn conn(id: u32, from: u32, to: u32, dep: u64, arr: u64) -> Connection {
        Connection::new(
            ConnectionId::new(0, id),
            format!("c{id}"),
            StopId::new(0, from),
            StopId::new(0, to),
            Timestamp::from_secs(dep),
            (arr - dep) as u32,
            TripId::new(0, id),
            ConnectionMode::NORMAL,
        )
        .unwrap()
    }

    /// A forward journey riding the given `(from, to, dep, arr)` legs with a
    /// change between each.
    fn journey(legs: &[(u32, u32, u64, u64)]) -> Candidate {
        let (first_from, _, first_dep, _) = legs[0];
        let mut j = Journey::genesis(
            StopId::new(0, first_from),
            Timestamp::from_secs(first_dep),
            Direction::Forward,
        );
        for (i, &(from, to, dep, arr)) in legs.iter().enumerate() {
            if i > 0 {
                let stop = StopId::new(0, from);
                j = j.transfer(&Transfer::new(stop, stop, j.time(), 60));
            }
            j = j.chain_forward(&conn(i as u32 + 100 * dep as u32, from, to, dep, arr));
        }
        j
    }

    #[test]
    fn rank_by_arrival() {
        let j1 = journey(&[(0, 1, 36_000, 37_800)]);
        let j2 = journey(&[(0, 1, 36_900, 38_400)]);

        let ranked = rank_journeys(vec![j2, j1]);

        assert_eq!(ranked[0].arrival_time(), Timestamp::from_secs(37_800));
        assert_eq!(ranked[1].arrival_time(), Timestamp::from_secs(38_400));
    }

    #[test]
    fn rank_by_changes_when_same_arrival() {
        let direct = journey(&[(0, 2, 36_000, 41_400)]);
        let change = journey(&[(0, 1, 36_000, 37_800), (1, 2, 38_700, 41_400)]);

        let ranked = rank_journeys(vec![change, direct]);

        assert_eq!(ranked[0].metric().changes(), 0);
        assert_eq!(ranked[1].metric().changes(), 1);
    }

    #[test]
    fn remove_dominated_keeps_pareto_optimal() {
        // A leaves 10:00 and arrives 10:30 direct, B leaves 10:00 and
        // arrives 10:40 direct (dominated by A), C arrives 10:25 with a
        // change (earlier but more changes).
        let a = journey(&[(0, 1, 36_000, 37_800)]);
        let b = journey(&[(0, 1, 36_000, 38_400)]);
        let c = journey(&[(0, 3, 35_100, 36_600), (3, 1, 36_900, 37_500)]);

        let result = remove_dominated(vec![a, b, c]);

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|j| j.arrival_time() != Timestamp::from_secs(38_400)));
    }

    #[test]
    fn later_departure_survives() {
        // Arrives later, but leaves later too.
        let early = journey(&[(0, 1, 36_000, 37_800)]);
        let late = journey(&[(0, 1, 37_800, 39_600)]);

        assert_eq!(remove_dominated(vec![early, late]).len(), 2);
    }

    #[test]
    fn deduplicate_same_times() {
        let j1 = journey(&[(0, 1, 36_000, 37_800)]);
        let j2 = journey(&[(0, 1, 36_000, 37_800)]);

        assert_eq!(deduplicate(vec![j1, j2]).len(), 1);
    }

    #[test]
    fn empty_input() {
        assert!(rank_journeys(vec![]).is_empty());
        assert!(remove_dominated(vec![]).is_empty());
        assert!(deduplicate(vec![]).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, ConnectionMode, StopId, Timestamp, TripId};
    use crate::store::Direction;
    use crate::transfers::Transfer;
    use proptest::prelude::*;

    /// A journey of one or two legs between stops 0 and 2.
    fn make_journey(id: u32, dep: u64, leg1: u64, wait: Option<(u64, u64)>) -> Candidate {
        let mut j = Journey::genesis(StopId::new(0, 0), Timestamp::from_secs(dep), Direction::Forward);
        let first_to = if wait.is_some() { 1 } else { 2 };
        let c1 = Connection::new(
            ConnectionId::new(0, id * 2),
            format!("c{id}a"),
            StopId::new(0, 0),
            StopId::new(0, first_to),
            Timestamp::from_secs(dep),
            leg1 as u32,
            TripId::new(0, id * 2),
            ConnectionMode::NORMAL,
        )
        .unwrap();
        j = j.chain_forward(&c1);

        if let Some((wait, leg2)) = wait {
            let stop = StopId::new(0, 1);
            j = j.transfer(&Transfer::new(stop, stop, j.time(), wait));
            let c2 = Connection::new(
                ConnectionId::new(0, id * 2 + 1),
                format!("c{id}b"),
                stop,
                StopId::new(0, 2),
                j.time(),
                leg2 as u32,
                TripId::new(0, id * 2 + 1),
                ConnectionMode::NORMAL,
            )
            .unwrap();
            j = j.chain_forward(&c2);
        }
        j
    }

    fn journey_strategy() -> impl Strategy<Value = Candidate> {
        (
            0u32..1000,
            (0u64..1380).prop_map(|m| 36_000 + m * 60),
            (10u64..120).prop_map(|m| m * 60),
            prop::option::of(((5u64..30), (15u64..60)).prop_map(|(w, l)| (w * 60, l * 60))),
        )
            .prop_map(|(id, dep, leg1, wait)| make_journey(id, dep, leg1, wait))
    }

    fn journeys_strategy() -> impl Strategy<Value = Vec<Candidate>> {
        prop::collection::vec(journey_strategy(), 0..15)
    }

    proptest! {
        #[test]
        fn rank_journeys_is_sorted(journeys in journeys_strategy()) {
            let ranked = rank_journeys(journeys);

            for window in ranked.windows(2) {
                let a_key = (window[0].arrival_time(), changes(&window[0]), window[0].total_duration());
                let b_key = (window[1].arrival_time(), changes(&window[1]), window[1].total_duration());
                prop_assert!(a_key <= b_key, "Not sorted: {:?} before {:?}", a_key, b_key);
            }
        }

        #[test]
        fn remove_dominated_no_internal_domination(journeys in journeys_strategy()) {
            let result = remove_dominated(journeys);

            for (i, a) in result.iter().enumerate() {
                for (j, b) in result.iter().enumerate() {
                    if i != j {
                        prop_assert!(!dominates(a, b), "Journey {} dominates journey {}", i, j);
                    }
                }
            }
        }

        #[test]
        fn deduplicate_no_duplicate_keys(journeys in journeys_strategy()) {
            let original_len = journeys.len();
            let result = deduplicate(journeys);
            prop_assert!(result.len() <= original_len);

            for (i, a) in result.iter().enumerate() {
                for b in &result[i + 1..] {
                    prop_assert_ne!(
                        (a.arrival_time(), a.departure_time(), changes(a)),
                        (b.arrival_time(), b.departure_time(), changes(b))
                    );
                }
            }
        }
    }
}
