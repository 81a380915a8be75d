//! Pareto frontiers of journeys.

use super::{Comparator, Dominance, Journey};

/// Journeys from one stop that are pairwise non-dominated.
///
/// Journeys that tie on every criterion are all kept: two options with the
/// same metric may still leave at different times. Structurally equal
/// journeys are kept once.
#[derive(Debug, Clone)]
pub struct ParetoFrontier<M> {
    journeys: Vec<Journey<M>>,
}

impl<M> Default for ParetoFrontier<M> {
    fn default() -> Self {
        Self {
            journeys: Vec::new(),
        }
    }
}

impl<M> ParetoFrontier<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a journey to the frontier.
    ///
    /// Returns true if the candidate was kept. Members the candidate
    /// dominates are evicted.
    pub fn add_to_frontier<C>(&mut self, candidate: Journey<M>, comparator: &C) -> bool
    where
        C: Comparator<M> + ?Sized,
    {
        let mut evicted = Vec::new();
        for (i, member) in self.journeys.iter().enumerate() {
            match comparator.compare(member, &candidate) {
                Dominance::FirstBetter => return false,
                Dominance::SecondBetter => evicted.push(i),
                Dominance::Tie if *member == candidate => return false,
                Dominance::Tie | Dominance::Incomparable => {}
            }
        }

        for i in evicted.into_iter().rev() {
            self.journeys.swap_remove(i);
        }
        self.journeys.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Journey<M>> {
        self.journeys.iter()
    }

    pub fn as_slice(&self) -> &[Journey<M>] {
        &self.journeys
    }

    pub fn into_vec(self) -> Vec<Journey<M>> {
        self.journeys
    }
}

impl<'a, M> IntoIterator for &'a ParetoFrontier<M> {
    type Item = &'a Journey<M>;
    type IntoIter = std::slice::Iter<'a, Journey<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.journeys.iter()
    }
}
