//! Connection scan journey planning.
//!
//! Answers "how do I get from here to there" over a timetable loaded as
//! elementary connections: one vehicle moving between two consecutive stops.
//!
//! - [`store`] holds timetables and serves their connections in departure
//!   order.
//! - [`journey`] models journeys, the metrics they accumulate and how two of
//!   them compare.
//! - [`transfers`] decides where and how fast a traveller can change.
//! - [`planner`] runs the scans.

pub mod domain;
pub mod journey;
pub mod planner;
pub mod store;
pub mod transfers;
