//! Core identifier types and constants for station planning
//!
//! Road-network identifiers come from the network description as strings,
//! so each kind of id gets its own wrapper for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix the network description uses for intersection-internal lanes and edges
pub const INTERNAL_PREFIX: char = ':';

/// A wrapper type for junction (graph node) IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JunctionId(pub String);

/// A wrapper type for road segment (edge) IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

/// A wrapper type for lane IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneId(pub String);

/// A wrapper type for charging station IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

macro_rules! string_id {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(id: &str) -> Self {
                    Self(id.to_string())
                }
            }

            impl From<String> for $name {
                fn from(id: String) -> Self {
                    Self(id)
                }
            }
        )*
    };
}

string_id!(JunctionId, EdgeId, LaneId, StationId, VehicleId);

impl LaneId {
    /// Internal lanes connect edges inside a junction and never host a station
    pub fn is_internal(&self) -> bool {
        self.0.starts_with(INTERNAL_PREFIX)
    }

    /// Edge id implied by the lane naming scheme `<edge>_<index>`
    ///
    /// Only used when the lane is missing from the network index.
    pub fn implied_edge(&self) -> Option<EdgeId> {
        self.0
            .rsplit_once('_')
            .filter(|(edge, index)| !edge.is_empty() && index.parse::<u32>().is_ok())
            .map(|(edge, _)| EdgeId::new(edge))
    }
}

impl EdgeId {
    /// Identifier given to the implicit reverse direction of a two-way edge
    pub fn reversed(&self) -> EdgeId {
        EdgeId(format!("-{}", self.0))
    }
}

/// Default weight for an edge whose length is not given anywhere
pub const DEFAULT_EDGE_LENGTH: f64 = 1000.0;

/// Vehicle type that marks a trip as electric in the route file
pub const ELECTRIC_VEHICLE_TYPE: &str = "electric_vehicle";

/// Share of electric vehicles designated as low-energy, in percent
pub const DEFAULT_LOW_ENERGY_PERCENTAGE: u32 = 100;

/// Battery level (Wh) that designated vehicles are clamped down to
pub const BATTERY_CEILING: f64 = 12000.0;

/// Battery level (Wh) below which a vehicle is sent to a station
pub const INTERVENTION_THRESHOLD: f64 = 15000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_edge_strips_lane_index() {
        assert_eq!(LaneId::new("gneE3_0").implied_edge(), Some(EdgeId::new("gneE3")));
        assert_eq!(
            LaneId::new("-road_a_b_2").implied_edge(),
            Some(EdgeId::new("-road_a_b"))
        );
        assert_eq!(LaneId::new("nolane").implied_edge(), None);
    }

    #[test]
    fn internal_lanes_are_detected_by_prefix() {
        assert!(LaneId::new(":J1_0_0").is_internal());
        assert!(!LaneId::new("E1_0").is_internal());
    }
}
