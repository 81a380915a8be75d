//! Scan queries and their errors.

use std::collections::HashMap;

use crate::domain::{StopId, Timestamp};

/// Error from a connection scan.
///
/// Finding no route is not an error: scans return `Ok(None)` or an empty
/// result for that.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// The query was rejected before scanning
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The loaded connections end before the scan could finish
    #[error("no connections available in range: data runs out before {bound}")]
    InsufficientData { bound: Timestamp },
}

/// A stop where a journey may start or end, with the walk between the
/// traveller's true origin or destination and that stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub stop: StopId,
    pub walk_secs: u32,
}

impl Endpoint {
    /// The traveller is at the stop itself.
    pub fn at(stop: StopId) -> Self {
        Self { stop, walk_secs: 0 }
    }

    /// The traveller needs `walk_secs` seconds to cover the last stretch.
    pub fn walking(stop: StopId, walk_secs: u32) -> Self {
        Self { stop, walk_secs }
    }
}

/// What to search for: where from, where to, and within which window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanQuery {
    pub departures: Vec<Endpoint>,
    pub arrivals: Vec<Endpoint>,
    /// No journey may leave its origin before this.
    pub earliest_departure: Timestamp,
    /// No journey may reach its destination after this.
    pub latest_arrival: Timestamp,
}

impl ScanQuery {
    pub fn new(
        departures: Vec<Endpoint>,
        arrivals: Vec<Endpoint>,
        earliest_departure: Timestamp,
        latest_arrival: Timestamp,
    ) -> Self {
        Self {
            departures,
            arrivals,
            earliest_departure,
            latest_arrival,
        }
    }

    /// A query between two stops with no walking at either end.
    pub fn between(
        from: StopId,
        to: StopId,
        earliest_departure: Timestamp,
        latest_arrival: Timestamp,
    ) -> Self {
        Self::new(
            vec![Endpoint::at(from)],
            vec![Endpoint::at(to)],
            earliest_departure,
            latest_arrival,
        )
    }

    /// Reject queries no scan can answer.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.departures.is_empty() {
            return Err(ScanError::InvalidQuery("no departure stops".to_string()));
        }
        if self.arrivals.is_empty() {
            return Err(ScanError::InvalidQuery("no arrival stops".to_string()));
        }

        let all = self.departures.iter().chain(&self.arrivals);
        if let Some(bad) = all.clone().find(|e| !e.stop.is_valid()) {
            return Err(ScanError::InvalidQuery(format!(
                "invalid stop id {:?}",
                bad.stop
            )));
        }

        if let Some(both) = self
            .departures
            .iter()
            .find(|d| self.arrivals.iter().any(|a| a.stop == d.stop))
        {
            return Err(ScanError::InvalidQuery(format!(
                "stop {} is both a departure and an arrival",
                both.stop
            )));
        }

        if !self.earliest_departure.is_set() {
            return Err(ScanError::InvalidQuery(
                "earliest departure is not set".to_string(),
            ));
        }
        if self.latest_arrival < self.earliest_departure {
            return Err(ScanError::InvalidQuery(format!(
                "latest arrival {} is before earliest departure {}",
                self.latest_arrival, self.earliest_departure
            )));
        }

        Ok(())
    }

    /// Shortest walk per departure stop.
    pub(crate) fn departure_walks(&self) -> HashMap<StopId, u32> {
        shortest_walks(&self.departures)
    }

    /// Shortest walk per arrival stop.
    pub(crate) fn arrival_walks(&self) -> HashMap<StopId, u32> {
        shortest_walks(&self.arrivals)
    }

    /// Longest walk at either end of the journey.
    pub(crate) fn longest_walk(&self) -> u32 {
        self.departures
            .iter()
            .chain(&self.arrivals)
            .map(|e| e.walk_secs)
            .max()
            .unwrap_or(0)
    }
}

fn shortest_walks(endpoints: &[Endpoint]) -> HashMap<StopId, u32> {
    let mut walks: HashMap<StopId, u32> = HashMap::with_capacity(endpoints.len());
    for endpoint in endpoints {
        walks
            .entry(endpoint.stop)
            .and_modify(|w| *w = (*w).min(endpoint.walk_secs))
            .or_insert(endpoint.walk_secs);
    }
    walks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(n: u32) -> StopId {
        StopId::new(0, n)
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    #[test]
    fn valid_query() {
        assert!(ScanQuery::between(stop(0), stop(1), t(100), t(200)).validate().is_ok());
        assert!(ScanQuery::between(stop(0), stop(1), t(100), t(100)).validate().is_ok());
    }

    #[test]
    fn same_stop_rejected() {
        let err = ScanQuery::between(stop(0), stop(0), t(100), t(200))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ScanError::InvalidQuery("stop 0/0 is both a departure and an arrival".to_string())
        );
    }

    #[test]
    fn empty_sets_rejected() {
        let query = ScanQuery::new(vec![], vec![Endpoint::at(stop(1))], t(100), t(200));
        assert!(matches!(query.validate(), Err(ScanError::InvalidQuery(_))));

        let query = ScanQuery::new(vec![Endpoint::at(stop(0))], vec![], t(100), t(200));
        assert!(matches!(query.validate(), Err(ScanError::InvalidQuery(_))));
    }

    #[test]
    fn inverted_window_rejected() {
        let query = ScanQuery::between(stop(0), stop(1), t(200), t(100));
        assert!(matches!(query.validate(), Err(ScanError::InvalidQuery(_))));
    }

    #[test]
    fn unset_departure_rejected() {
        let query = ScanQuery::between(stop(0), stop(1), Timestamp::UNSET, t(100));
        assert!(matches!(query.validate(), Err(ScanError::InvalidQuery(_))));
    }

    #[test]
    fn invalid_stop_rejected() {
        let query = ScanQuery::between(StopId::INVALID, stop(1), t(100), t(200));
        assert!(matches!(query.validate(), Err(ScanError::InvalidQuery(_))));
    }

    #[test]
    fn duplicate_endpoints_keep_shortest_walk() {
        let query = ScanQuery::new(
            vec![Endpoint::walking(stop(0), 300), Endpoint::walking(stop(0), 120)],
            vec![Endpoint::walking(stop(1), 60)],
            t(100),
            t(200),
        );
        assert_eq!(query.departure_walks()[&stop(0)], 120);
        assert_eq!(query.arrival_walks()[&stop(1)], 60);
        assert_eq!(query.longest_walk(), 300);
    }

    #[test]
    fn error_display() {
        let err = ScanError::InsufficientData {
            bound: Timestamp::from_secs(60),
        };
        assert_eq!(
            err.to_string(),
            "no connections available in range: data runs out before 1970-01-01 00:01:00"
        );
    }
}
