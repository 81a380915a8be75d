//! Stops and trips.

use std::collections::BTreeMap;

use super::{StopId, TripId};

/// Free-form attributes (names, headsigns, ...) attached to stops and trips.
pub type Attributes = BTreeMap<String, String>;

/// A place where vehicles call.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub global_id: String,
    /// Latitude in degrees (WGS84).
    pub latitude: f64,
    /// Longitude in degrees (WGS84).
    pub longitude: f64,
    pub attributes: Attributes,
}

impl Stop {
    /// Returns the `name` attribute, if any.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").map(String::as_str)
    }

    /// Great-circle distance to another stop, in metres.
    pub fn distance_to(&self, other: &Stop) -> f64 {
        haversine_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// One run of a vehicle, shared by all its connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub global_id: String,
    /// Global identifier of the operating agency.
    pub operator: Option<String>,
    pub attributes: Attributes,
}

impl Trip {
    /// Returns the `headsign` attribute, if any.
    pub fn headsign(&self) -> Option<&str> {
        self.attributes.get("headsign").map(String::as_str)
    }
}

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two WGS84 coordinates, in metres.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
