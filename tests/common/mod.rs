//! Shared fixtures: a small road network and a scripted traffic engine

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use std::collections::HashSet;

use ev_station_planner::planner::{
    EdgeId, EdgeSpec, EngineCommand, LaneId, NetworkContext, NetworkDescription, StationId,
    TrafficEngine, VehicleId,
};

/// Chain J1 -> J2 -> J3 -> J4 with one lane per edge (E2 has two)
///
/// E1 is 100 long, E2 is 200, E3 is 50. Every lane is 100 long so a station fits.
pub fn chain_network() -> NetworkContext {
    NetworkContext::from_description(&NetworkDescription::new(vec![
        EdgeSpec::new("E1", "J1", "J2", 100.0).with_lane("E1_0", 100.0),
        EdgeSpec::new("E2", "J2", "J3", 200.0)
            .with_lane("E2_0", 100.0)
            .with_lane("E2_1", 100.0),
        EdgeSpec::new("E3", "J3", "J4", 50.0).with_lane("E3_0", 100.0),
    ]))
}

/// Engine-side state of one vehicle in one tick
#[derive(Debug, Clone)]
pub struct ScriptedVehicle {
    pub id: VehicleId,
    pub lane: LaneId,
    pub road: EdgeId,
    pub battery: f64,
    pub route: Vec<EdgeId>,
}

impl ScriptedVehicle {
    /// Vehicle on `<road>_0` heading to `E3`
    pub fn on(id: &str, road: &str, battery: f64) -> Self {
        Self {
            id: VehicleId::new(id),
            lane: LaneId::new(format!("{}_0", road)),
            road: EdgeId::new(road),
            battery,
            route: vec![EdgeId::new(road), EdgeId::new("E3")],
        }
    }

    pub fn on_lane(mut self, lane: &str) -> Self {
        self.lane = LaneId::new(lane);
        self
    }
}

/// What the engine reports after one tick
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub time: f64,
    pub vehicles: Vec<ScriptedVehicle>,
}

impl Frame {
    pub fn at(time: f64, vehicles: Vec<ScriptedVehicle>) -> Self {
        Self { time, vehicles }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedStation {
    pub id: StationId,
    pub lane: LaneId,
    pub occupancy: usize,
}

/// Replays a fixed list of frames and records every command it receives
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    frames: Vec<Frame>,
    current: Option<usize>,
    pub stations: Vec<ScriptedStation>,
    /// Vehicles whose queries fail, as if they had left the network
    pub vanished: HashSet<VehicleId>,
    /// Vehicles whose commands are rejected
    pub rejecting: HashSet<VehicleId>,
    pub commands: Vec<EngineCommand>,
    pub ticks: u64,
}

impl ScriptedEngine {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    pub fn with_station(mut self, id: &str, lane: &str, occupancy: usize) -> Self {
        self.stations.push(ScriptedStation {
            id: StationId::new(id),
            lane: LaneId::new(lane),
            occupancy,
        });
        self
    }

    fn frame(&self) -> Option<&Frame> {
        self.current.and_then(|index| self.frames.get(index))
    }

    fn vehicle(&self, id: &VehicleId) -> Result<&ScriptedVehicle> {
        if self.vanished.contains(id) {
            bail!("Vehicle {} is not known", id);
        }
        self.frame()
            .and_then(|frame| frame.vehicles.iter().find(|vehicle| &vehicle.id == id))
            .ok_or_else(|| anyhow!("Vehicle {} is not known", id))
    }

    fn station(&self, id: &StationId) -> Result<&ScriptedStation> {
        self.stations
            .iter()
            .find(|station| &station.id == id)
            .ok_or_else(|| anyhow!("Station {} is not known", id))
    }

    fn accept(&mut self, vehicle: &VehicleId, command: EngineCommand) -> Result<()> {
        if self.rejecting.contains(vehicle) {
            bail!("Vehicle {} rejected the command", vehicle);
        }
        self.commands.push(command);
        Ok(())
    }
}

impl TrafficEngine for ScriptedEngine {
    fn advance_one_tick(&mut self) -> Result<()> {
        let next = self.current.map_or(0, |index| index + 1);
        if next >= self.frames.len() {
            bail!("No frame left to advance to");
        }
        self.current = Some(next);
        self.ticks += 1;
        Ok(())
    }

    fn has_expected_activity(&mut self) -> bool {
        self.current.map_or(0, |index| index + 1) < self.frames.len()
    }

    fn simulation_time(&mut self) -> f64 {
        self.frame().map_or(0.0, |frame| frame.time)
    }

    fn vehicle_ids(&mut self) -> Vec<VehicleId> {
        self.frame()
            .map(|frame| frame.vehicles.iter().map(|vehicle| vehicle.id.clone()).collect())
            .unwrap_or_default()
    }

    fn vehicle_lane(&mut self, vehicle: &VehicleId) -> Result<LaneId> {
        Ok(self.vehicle(vehicle)?.lane.clone())
    }

    fn vehicle_road(&mut self, vehicle: &VehicleId) -> Result<EdgeId> {
        Ok(self.vehicle(vehicle)?.road.clone())
    }

    fn vehicle_position(&mut self, vehicle: &VehicleId) -> Result<(f64, f64)> {
        self.vehicle(vehicle)?;
        Ok((0.0, 0.0))
    }

    fn vehicle_battery_level(&mut self, vehicle: &VehicleId) -> Result<f64> {
        Ok(self.vehicle(vehicle)?.battery)
    }

    fn vehicle_route(&mut self, vehicle: &VehicleId) -> Result<Vec<EdgeId>> {
        Ok(self.vehicle(vehicle)?.route.clone())
    }

    fn station_ids(&mut self) -> Vec<StationId> {
        self.stations.iter().map(|station| station.id.clone()).collect()
    }

    fn station_lane(&mut self, station: &StationId) -> Result<LaneId> {
        Ok(self.station(station)?.lane.clone())
    }

    fn station_occupancy(&mut self, station: &StationId) -> Result<usize> {
        Ok(self.station(station)?.occupancy)
    }

    fn set_vehicle_battery(&mut self, vehicle: &VehicleId, value: f64) -> Result<()> {
        self.accept(
            vehicle,
            EngineCommand::SetBattery {
                vehicle: vehicle.clone(),
                value,
            },
        )
    }

    fn reroute_vehicle_to(&mut self, vehicle: &VehicleId, edge: &EdgeId) -> Result<()> {
        self.accept(
            vehicle,
            EngineCommand::Reroute {
                vehicle: vehicle.clone(),
                edge: edge.clone(),
            },
        )
    }

    fn schedule_station_stop(
        &mut self,
        vehicle: &VehicleId,
        station: &StationId,
        duration_secs: u32,
    ) -> Result<()> {
        self.accept(
            vehicle,
            EngineCommand::StopAtStation {
                vehicle: vehicle.clone(),
                station: station.clone(),
                duration_secs,
            },
        )
    }
}
