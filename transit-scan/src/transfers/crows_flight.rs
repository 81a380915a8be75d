//! Walking transfers estimated from straight-line distance.

use std::collections::HashMap;

use crate::domain::{Stop, StopId, haversine_m};
use crate::planner::ScanConfig;

use super::TransferGenerator;

/// Walks between any two stops within range, at a constant walking speed
/// along the great circle between them.
#[derive(Debug, Clone)]
pub struct CrowsFlightTransferGenerator {
    /// Stop coordinates as (latitude, longitude).
    positions: HashMap<StopId, (f64, f64)>,
    min_change_secs: u32,
    speed_mps: f64,
    max_distance_m: f64,
}

impl CrowsFlightTransferGenerator {
    pub fn new<'a>(
        stops: impl IntoIterator<Item = &'a Stop>,
        min_change_secs: u32,
        speed_mps: f64,
        max_distance_m: f64,
    ) -> Self {
        let positions = stops
            .into_iter()
            .map(|s| (s.id, (s.latitude, s.longitude)))
            .collect();
        Self {
            positions,
            min_change_secs,
            speed_mps,
            max_distance_m,
        }
    }

    /// Build with the change time, walking speed and range from `config`.
    pub fn from_config<'a>(stops: impl IntoIterator<Item = &'a Stop>, config: &ScanConfig) -> Self {
        Self::new(
            stops,
            config.min_transfer_secs,
            config.walking_speed_mps,
            config.max_walk_distance_m,
        )
    }

    fn distance(&self, from: StopId, to: StopId) -> Option<f64> {
        let (lat1, lon1) = self.positions.get(&from)?;
        let (lat2, lon2) = self.positions.get(&to)?;
        Some(haversine_m(*lat1, *lon1, *lat2, *lon2))
    }

    fn walk_secs(&self, distance_m: f64) -> Option<u32> {
        if distance_m > self.max_distance_m || self.speed_mps <= 0.0 {
            return None;
        }
        let secs = (distance_m / self.speed_mps).ceil();
        // Never faster than changing within a stop.
        Some((secs as u32).max(self.min_change_secs))
    }
}

impl TransferGenerator for CrowsFlightTransferGenerator {
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
        if from == to {
            return Some(self.min_change_secs);
        }
        self.walk_secs(self.distance(from, to)?)
    }

    fn neighbours(&self, stop: StopId) -> Vec<(StopId, u32)> {
        let Some(&(lat, lon)) = self.positions.get(&stop) else {
            return Vec::new();
        };

        let mut found: Vec<(StopId, u32)> = self
            .positions
            .iter()
            .filter(|(id, _)| **id != stop)
            .filter_map(|(id, (lat2, lon2))| {
                let secs = self.walk_secs(haversine_m(lat, lon, *lat2, *lon2))?;
                Some((*id, secs))
            })
            .collect();
        found.sort_unstable_by_key(|(id, secs)| (*secs, *id));
        found
    }
}
