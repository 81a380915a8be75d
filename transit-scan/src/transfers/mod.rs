//! Transfer and footpath generators.
//!
//! A [`TransferGenerator`] decides whether a traveller can get from one stop
//! to another between two vehicles, and how long that takes. Generators must
//! be pure functions of their inputs, so they can be wrapped in a
//! [`MemoizingTransferGenerator`] or shared between concurrent scans.

mod crows_flight;
mod internal;
mod memo;
mod walkable;

use std::sync::Arc;

use crate::domain::{Connection, StopId, Timestamp};

pub use crows_flight::CrowsFlightTransferGenerator;
pub use internal::InternalTransferGenerator;
pub use memo::MemoizingTransferGenerator;
pub use walkable::{WalkableTransfers, WalkableTransfersBuilder};

/// A change between vehicles or a walk, with fixed times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub from: StopId,
    pub to: StopId,
    pub departure: Timestamp,
    pub arrival: Timestamp,
}

impl Transfer {
    /// A transfer leaving `from` at `departure` and taking `duration` seconds.
    pub fn new(from: StopId, to: StopId, departure: Timestamp, duration: u64) -> Self {
        Self {
            from,
            to,
            departure,
            arrival: departure + duration,
        }
    }

    /// A transfer reaching `to` at `arrival` after `duration` seconds.
    pub fn ending_at(from: StopId, to: StopId, arrival: Timestamp, duration: u64) -> Self {
        Self {
            from,
            to,
            departure: arrival - duration,
            arrival,
        }
    }

    /// Seconds the transfer takes.
    pub fn duration(&self) -> u64 {
        self.arrival.abs_diff(self.departure)
    }
}

/// Decides how travellers move between stops outside vehicles.
pub trait TransferGenerator: Send + Sync {
    /// Seconds needed to get from `from` to `to` and be ready to board.
    ///
    /// `None` means the transfer is impossible. `from == to` asks for the
    /// minimum change time at a single stop.
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32>;

    /// Other stops reachable on foot from `stop`, with their walking times.
    fn neighbours(&self, _stop: StopId) -> Vec<(StopId, u32)> {
        Vec::new()
    }

    /// The transfer from alighting `arriving` to boarding `departing`,
    /// starting as soon as the traveller gets off.
    ///
    /// Forward scans change vehicles through this. Returns `None` when the
    /// traveller cannot make it in time.
    fn generate(&self, arriving: &Connection, departing: &Connection) -> Option<Transfer> {
        let from = arriving.arrival_stop();
        let to = departing.departure_stop();
        let secs = self.time_between(from, to)?;
        let transfer = Transfer::new(from, to, arriving.arrival_time(), u64::from(secs));
        (transfer.arrival <= departing.departure_time()).then_some(transfer)
    }

    /// Like [`generate`](Self::generate), but the transfer ends just as
    /// `departing` leaves. Backward scans change vehicles through this.
    fn generate_backward(
        &self,
        arriving: &Connection,
        departing: &Connection,
    ) -> Option<Transfer> {
        let from = arriving.arrival_stop();
        let to = departing.departure_stop();
        let secs = self.time_between(from, to)?;
        let transfer = Transfer::ending_at(from, to, departing.departure_time(), u64::from(secs));
        (transfer.departure >= arriving.arrival_time()).then_some(transfer)
    }
}

impl<G: TransferGenerator + ?Sized> TransferGenerator for &G {
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
        (**self).time_between(from, to)
    }

    fn neighbours(&self, stop: StopId) -> Vec<(StopId, u32)> {
        (**self).neighbours(stop)
    }

    fn generate(&self, arriving: &Connection, departing: &Connection) -> Option<Transfer> {
        (**self).generate(arriving, departing)
    }

    fn generate_backward(
        &self,
        arriving: &Connection,
        departing: &Connection,
    ) -> Option<Transfer> {
        (**self).generate_backward(arriving, departing)
    }
}

impl<G: TransferGenerator + ?Sized> TransferGenerator for Arc<G> {
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
        (**self).time_between(from, to)
    }

    fn neighbours(&self, stop: StopId) -> Vec<(StopId, u32)> {
        (**self).neighbours(stop)
    }

    fn generate(&self, arriving: &Connection, departing: &Connection) -> Option<Transfer> {
        (**self).generate(arriving, departing)
    }

    fn generate_backward(
        &self,
        arriving: &Connection,
        departing: &Connection,
    ) -> Option<Transfer> {
        (**self).generate_backward(arriving, departing)
    }
}
