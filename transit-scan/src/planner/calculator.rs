//! One entry point for the three scans.

use tracing::debug;

use crate::journey::{Journey, ProfileComparator, TransferComparator, TransferMetric};
use crate::store::DepartureIndex;
use crate::transfers::TransferGenerator;

use super::config::ScanConfig;
use super::eas::EarliestConnectionScan;
use super::las::LatestConnectionScan;
use super::pcs::ProfiledConnectionScan;
use super::query::{ScanError, ScanQuery};
use super::rank::{deduplicate, rank_journeys, remove_dominated};

/// Journey planner over a departure index.
///
/// Journeys are returned in travel order and carry a [`TransferMetric`].
pub struct Calculator<'a, T: TransferGenerator> {
    index: &'a DepartureIndex<'a>,
    transfers: &'a T,
    config: &'a ScanConfig,
}

impl<'a, T: TransferGenerator> Calculator<'a, T> {
    pub fn new(index: &'a DepartureIndex<'a>, transfers: &'a T, config: &'a ScanConfig) -> Self {
        Self {
            index,
            transfers,
            config,
        }
    }

    /// The journey arriving first.
    pub fn earliest_arrival(
        &self,
        query: &ScanQuery,
    ) -> Result<Option<Journey<TransferMetric>>, ScanError> {
        self.check(query)?;
        EarliestConnectionScan::new(self.index, TransferComparator, self.transfers).calculate(query)
    }

    /// The journey leaving last.
    pub fn latest_departure(
        &self,
        query: &ScanQuery,
    ) -> Result<Option<Journey<TransferMetric>>, ScanError> {
        self.check(query)?;
        let journey = LatestConnectionScan::new(self.index, TransferComparator, self.transfers)
            .calculate(query)?;
        Ok(journey.map(|j| j.reversed()))
    }

    /// Every useful journey in the query window, best first.
    ///
    /// Runs the earliest arrival and latest departure scans over the whole
    /// window to learn which connections are reachable, then a profile scan
    /// restricted to those. The results are thinned out and ranked by
    /// arrival, changes and duration, keeping at most
    /// [`ScanConfig::max_results`].
    pub fn all_journeys(
        &self,
        query: &ScanQuery,
    ) -> Result<Vec<Journey<TransferMetric>>, ScanError> {
        self.check(query)?;

        let latest_arrival = query.latest_arrival;
        let forward = EarliestConnectionScan::new(self.index, TransferComparator, self.transfers)
            .calculate_with_profile(query, &|_| latest_arrival)?;
        if forward.journey.is_none() {
            debug!("no journey arrives in the window");
            return Ok(Vec::new());
        }

        let earliest_departure = query.earliest_departure;
        let backward = LatestConnectionScan::new(self.index, TransferComparator, self.transfers)
            .calculate_with_profile(query, &|_| earliest_departure)?;

        let by_stop = ProfiledConnectionScan::new(self.index, ProfileComparator, self.transfers)
            .with_filter(&forward.profile)
            .with_filter(&backward.profile)
            .calculate(query)?;

        let journeys: Vec<Journey<TransferMetric>> = by_stop
            .into_values()
            .flatten()
            .map(|j| j.reversed())
            .collect();
        let found = journeys.len();

        let journeys = remove_dominated(journeys);
        let journeys = deduplicate(journeys);
        let mut journeys = rank_journeys(journeys);
        journeys.truncate(self.config.max_results);

        debug!(found, kept = journeys.len(), "profile query complete");
        Ok(journeys)
    }

    fn check(&self, query: &ScanQuery) -> Result<(), ScanError> {
        query.validate()?;
        let walk = query.longest_walk();
        if walk > self.config.max_walk_secs {
            return Err(ScanError::InvalidQuery(format!(
                "walk of {walk}s exceeds the limit of {}s",
                self.config.max_walk_secs
            )));
        }
        Ok(())
    }
}
