//! Connections: single vehicle movements between two stops.

use serde::{Deserialize, Serialize};

use super::{ConnectionId, DomainError, StopId, Timestamp, TripId};

/// Boarding, alighting and cancellation flags of a connection.
///
/// The default (all bits clear) is a normal connection where travellers can
/// both get on at the departure stop and get off at the arrival stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionMode(u8);

impl ConnectionMode {
    /// Travellers may not get on at the departure stop.
    pub const NO_BOARDING: u8 = 0b001;
    /// Travellers may not get off at the arrival stop.
    pub const NO_ALIGHTING: u8 = 0b010;
    /// The connection will not run.
    pub const CANCELLED: u8 = 0b100;

    /// A connection with boarding and alighting allowed.
    pub const NORMAL: Self = Self(0);

    /// Build a mode from raw bits. Unknown bits are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::NO_BOARDING | Self::NO_ALIGHTING | Self::CANCELLED))
    }

    /// Raw bit representation.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Whether a traveller may get on at the departure stop.
    pub fn can_board(&self) -> bool {
        self.0 & (Self::NO_BOARDING | Self::CANCELLED) == 0
    }

    /// Whether a traveller may get off at the arrival stop.
    pub fn can_alight(&self) -> bool {
        self.0 & (Self::NO_ALIGHTING | Self::CANCELLED) == 0
    }

    /// Whether the connection is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0 & Self::CANCELLED != 0
    }

    /// Returns this mode with the cancelled bit set.
    pub fn cancelled(self) -> Self {
        Self(self.0 | Self::CANCELLED)
    }
}

/// One scheduled vehicle movement without intermediate stops.
///
/// # Invariants
///
/// - `departure_time` is set (never [`Timestamp::UNSET`])
/// - arrival time (`departure_time + travel_time`) is never before departure
///
/// # Examples
///
/// ```
/// use transit_scan::domain::{Connection, ConnectionId, ConnectionMode, StopId, Timestamp, TripId};
///
/// let dep = Timestamp::parse_utc("2024-03-15 16:20").unwrap();
/// let c = Connection::new(
///     ConnectionId::new(0, 0),
///     "https://example.org/connections/1".into(),
///     StopId::new(0, 0),
///     StopId::new(0, 1),
///     dep,
///     600,
///     TripId::new(0, 0),
///     ConnectionMode::NORMAL,
/// )
/// .unwrap();
/// assert_eq!(c.arrival_time(), dep + 600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    id: ConnectionId,
    global_id: String,
    departure_stop: StopId,
    arrival_stop: StopId,
    departure_time: Timestamp,
    travel_time: u32,
    trip: TripId,
    mode: ConnectionMode,
}

impl Connection {
    /// Construct a connection, validating its times.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ConnectionId,
        global_id: String,
        departure_stop: StopId,
        arrival_stop: StopId,
        departure_time: Timestamp,
        travel_time: u32,
        trip: TripId,
        mode: ConnectionMode,
    ) -> Result<Self, DomainError> {
        if !departure_time.is_set() {
            return Err(DomainError::UnsetDeparture(global_id));
        }
        if departure_time.checked_add(u64::from(travel_time)).is_none() {
            return Err(DomainError::InvalidConnection(
                "arrival time overflows the timestamp range",
            ));
        }

        Ok(Self {
            id,
            global_id,
            departure_stop,
            arrival_stop,
            departure_time,
            travel_time,
            trip,
            mode,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn global_id(&self) -> &str {
        &self.global_id
    }

    pub fn departure_stop(&self) -> StopId {
        self.departure_stop
    }

    pub fn arrival_stop(&self) -> StopId {
        self.arrival_stop
    }

    pub fn departure_time(&self) -> Timestamp {
        self.departure_time
    }

    /// Travel time in seconds.
    pub fn travel_time(&self) -> u32 {
        self.travel_time
    }

    pub fn arrival_time(&self) -> Timestamp {
        self.departure_time + u64::from(self.travel_time)
    }

    pub fn trip(&self) -> TripId {
        self.trip
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn can_board(&self) -> bool {
        self.mode.can_board()
    }

    pub fn can_alight(&self) -> bool {
        self.mode.can_alight()
    }

    pub fn is_cancelled(&self) -> bool {
        self.mode.is_cancelled()
    }

    /// Returns this connection with different boarding/alighting flags.
    pub(crate) fn with_mode(mut self, mode: ConnectionMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(mode: ConnectionMode) -> Connection {
        Connection::new(
            ConnectionId::new(0, 1),
            "c1".into(),
            StopId::new(0, 0),
            StopId::new(0, 1),
            Timestamp::from_secs(1_000),
            300,
            TripId::new(0, 0),
            mode,
        )
        .unwrap()
    }

    #[test]
    fn normal_mode() {
        let c = connection(ConnectionMode::NORMAL);
        assert!(c.can_board());
        assert!(c.can_alight());
        assert!(!c.is_cancelled());
        assert_eq!(c.arrival_time(), Timestamp::from_secs(1_300));
    }

    #[test]
    fn mode_flags() {
        let no_board = ConnectionMode::from_bits(ConnectionMode::NO_BOARDING);
        assert!(!no_board.can_board());
        assert!(no_board.can_alight());

        let neither =
            ConnectionMode::from_bits(ConnectionMode::NO_BOARDING | ConnectionMode::NO_ALIGHTING);
        assert!(!neither.can_board());
        assert!(!neither.can_alight());
        assert!(!neither.is_cancelled());
    }

    #[test]
    fn cancelled_blocks_everything() {
        let c = connection(ConnectionMode::NORMAL.cancelled());
        assert!(c.is_cancelled());
        assert!(!c.can_board());
        assert!(!c.can_alight());
    }

    #[test]
    fn unknown_bits_dropped() {
        assert_eq!(ConnectionMode::from_bits(0xF0).bits(), 0);
    }

    #[test]
    fn rejects_unset_departure() {
        let err = Connection::new(
            ConnectionId::new(0, 1),
            "c1".into(),
            StopId::new(0, 0),
            StopId::new(0, 1),
            Timestamp::UNSET,
            300,
            TripId::new(0, 0),
            ConnectionMode::NORMAL,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::UnsetDeparture(_)));
    }

    #[test]
    fn rejects_overflowing_arrival() {
        let err = Connection::new(
            ConnectionId::new(0, 1),
            "c1".into(),
            StopId::new(0, 0),
            StopId::new(0, 1),
            Timestamp::from_secs(u64::MAX - 10),
            300,
            TripId::new(0, 0),
            ConnectionMode::NORMAL,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConnection(_)));
    }
}
