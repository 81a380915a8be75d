//! Identifiers for stops, trips and connections.
//!
//! Every identifier is a pair of the database it was loaded into and a local
//! index inside that database. Independently loaded databases can therefore
//! be combined without renumbering anything.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! transit_id {
    ($(#[$meta:meta])* $name:ident, $local:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            database_id: u32,
            local_id: $local,
        }

        impl $name {
            /// Reserved value that never refers to a real entity.
            pub const INVALID: Self = Self {
                database_id: u32::MAX,
                local_id: <$local>::MAX,
            };

            /// Create an identifier from its components.
            pub const fn new(database_id: u32, local_id: $local) -> Self {
                Self {
                    database_id,
                    local_id,
                }
            }

            /// The database this entity was loaded into.
            pub const fn database_id(&self) -> u32 {
                self.database_id
            }

            /// The index of this entity inside its database.
            pub const fn local_id(&self) -> $local {
                self.local_id
            }

            /// Returns false for [`Self::INVALID`].
            pub fn is_valid(&self) -> bool {
                *self != Self::INVALID
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({}/{})", stringify!($name), self.database_id, self.local_id)
                } else {
                    write!(f, "{}(invalid)", stringify!($name))
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}/{}", self.database_id, self.local_id)
            }
        }
    };
}

transit_id!(
    /// Identifies a stop (a place where vehicles call).
    StopId,
    u32
);

transit_id!(
    /// Identifies a trip (one vehicle run).
    TripId,
    u32
);

transit_id!(
    /// Identifies a single connection between two stops.
    ConnectionId,
    u32
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn components() {
        let id = StopId::new(3, 42);
        assert_eq!(id.database_id(), 3);
        assert_eq!(id.local_id(), 42);
        assert!(id.is_valid());
    }

    #[test]
    fn invalid_sentinel() {
        assert!(!StopId::INVALID.is_valid());
        assert!(!TripId::INVALID.is_valid());
        assert!(!ConnectionId::INVALID.is_valid());
        assert_eq!(StopId::INVALID.database_id(), u32::MAX);
        assert_eq!(ConnectionId::INVALID.local_id(), u32::MAX);
    }

    #[test]
    fn structural_equality_across_databases() {
        assert_eq!(TripId::new(0, 1), TripId::new(0, 1));
        assert_ne!(TripId::new(0, 1), TripId::new(1, 1));

        let mut set = HashSet::new();
        set.insert(StopId::new(0, 7));
        assert!(set.contains(&StopId::new(0, 7)));
        assert!(!set.contains(&StopId::new(1, 7)));
    }

    #[test]
    fn display_and_debug() {
        let id = ConnectionId::new(2, 9);
        assert_eq!(id.to_string(), "2/9");
        assert_eq!(format!("{id:?}"), "ConnectionId(2/9)");
        assert_eq!(format!("{:?}", StopId::INVALID), "StopId(invalid)");
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&StopId::new(1, 5)).unwrap();
        assert_eq!(json, r#"{"database_id":1,"local_id":5}"#);
        let back: StopId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StopId::new(1, 5));
    }
}
