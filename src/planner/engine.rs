//! Interface to the external stepped traffic engine
//!
//! The engine owns vehicle kinematics, battery physics and simulated time.
//! Queries about a vehicle fail once it has left the network; callers treat
//! such failures as transient and skip the vehicle for the current tick.

use anyhow::Result;

use super::types::{EdgeId, LaneId, StationId, VehicleId};

pub trait TrafficEngine {
    /// Advances the simulation by one tick
    fn advance_one_tick(&mut self) -> Result<()>;

    /// Whether vehicles are still running or expected to depart
    fn has_expected_activity(&mut self) -> bool;

    /// Current simulated time in seconds
    fn simulation_time(&mut self) -> f64;

    fn vehicle_ids(&mut self) -> Vec<VehicleId>;
    fn vehicle_lane(&mut self, vehicle: &VehicleId) -> Result<LaneId>;
    fn vehicle_road(&mut self, vehicle: &VehicleId) -> Result<EdgeId>;
    fn vehicle_position(&mut self, vehicle: &VehicleId) -> Result<(f64, f64)>;
    fn vehicle_battery_level(&mut self, vehicle: &VehicleId) -> Result<f64>;
    fn vehicle_route(&mut self, vehicle: &VehicleId) -> Result<Vec<EdgeId>>;

    fn station_ids(&mut self) -> Vec<StationId>;
    fn station_lane(&mut self, station: &StationId) -> Result<LaneId>;
    fn station_occupancy(&mut self, station: &StationId) -> Result<usize>;

    fn set_vehicle_battery(&mut self, vehicle: &VehicleId, value: f64) -> Result<()>;
    fn reroute_vehicle_to(&mut self, vehicle: &VehicleId, edge: &EdgeId) -> Result<()>;
    fn schedule_station_stop(
        &mut self,
        vehicle: &VehicleId,
        station: &StationId,
        duration_secs: u32,
    ) -> Result<()>;
}
