//! Dominance comparators for ranking journeys.
//!
//! Every comparator here reduces journeys to a vector of criteria where
//! lower is better, then compares the vectors in the Pareto sense.

use super::{Journey, Metric, TransferMetric};

/// Outcome of comparing two journeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dominance {
    /// The first journey is at least as good everywhere and better somewhere.
    FirstBetter,
    /// The second journey is at least as good everywhere and better somewhere.
    SecondBetter,
    /// Each journey is better on some criterion.
    Incomparable,
    /// Equal on every criterion.
    Tie,
}

impl Dominance {
    /// Pareto comparison of two criteria vectors, lower is better.
    pub fn of<const N: usize>(a: [u64; N], b: [u64; N]) -> Self {
        let a_better = a.iter().zip(&b).any(|(x, y)| x < y);
        let b_better = a.iter().zip(&b).any(|(x, y)| y < x);
        match (a_better, b_better) {
            (true, false) => Dominance::FirstBetter,
            (false, true) => Dominance::SecondBetter,
            (true, true) => Dominance::Incomparable,
            (false, false) => Dominance::Tie,
        }
    }

    /// The same outcome seen from the other side.
    pub fn flip(self) -> Self {
        match self {
            Dominance::FirstBetter => Dominance::SecondBetter,
            Dominance::SecondBetter => Dominance::FirstBetter,
            other => other,
        }
    }
}

/// A three-way dominance test between journeys.
pub trait Comparator<M> {
    fn compare(&self, a: &Journey<M>, b: &Journey<M>) -> Dominance;
}

impl<M, F> Comparator<M> for F
where
    F: Fn(&Journey<M>, &Journey<M>) -> Dominance,
{
    fn compare(&self, a: &Journey<M>, b: &Journey<M>) -> Dominance {
        self(a, b)
    }
}

/// Later departures are better; map them onto "lower is better".
fn departure_key<M>(j: &Journey<M>) -> u64 {
    u64::MAX - j.departure_time().as_secs()
}

/// Compares departure and arrival times only, for any metric.
///
/// A journey is better if it leaves later or arrives earlier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeComparator;

impl<M: Metric> Comparator<M> for TimeComparator {
    fn compare(&self, a: &Journey<M>, b: &Journey<M>) -> Dominance {
        Dominance::of(
            [departure_key(a), a.arrival_time().as_secs()],
            [departure_key(b), b.arrival_time().as_secs()],
        )
    }
}

/// Total Pareto comparison of a [`TransferMetric`]:
/// travel time, vehicles and walking time.
///
/// Not suitable while scanning a profile: travel time alone would discard
/// an early, long option that becomes optimal once combined with a
/// connection further upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferComparator;

impl Comparator<TransferMetric> for TransferComparator {
    fn compare(&self, a: &Journey<TransferMetric>, b: &Journey<TransferMetric>) -> Dominance {
        let (ma, mb) = (a.metric(), b.metric());
        Dominance::of(
            [ma.travel_time, u64::from(ma.vehicles), ma.walking_time],
            [mb.travel_time, u64::from(mb.vehicles), mb.walking_time],
        )
    }
}

/// The dominance rule used while building profiles.
///
/// One journey dominates another from the same stop if it departs no
/// earlier, arrives no later, boards no more vehicles and walks no more,
/// and is strictly better on at least one of those. Travel time is never a
/// criterion on its own, which keeps the rule monotone: prepending the same
/// connection to both journeys never reverses the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileComparator;

impl Comparator<TransferMetric> for ProfileComparator {
    fn compare(&self, a: &Journey<TransferMetric>, b: &Journey<TransferMetric>) -> Dominance {
        let (ma, mb) = (a.metric(), b.metric());
        Dominance::of(
            [
                departure_key(a),
                a.arrival_time().as_secs(),
                u64::from(ma.vehicles),
                ma.walking_time,
            ],
            [
                departure_key(b),
                b.arrival_time().as_secs(),
                u64::from(mb.vehicles),
                mb.walking_time,
            ],
        )
    }
}
