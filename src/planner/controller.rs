//! Online low-energy routing controller
//!
//! Each tick the runner observes the engine, hands the snapshot to
//! [`ChargeController::decide`], and issues the returned commands. The
//! controller itself never talks to the engine, so it can be driven by any
//! tick source.
//!
//! Per vehicle the state machine is `Active -> Waiting -> Recharged`, where
//! `Active` means no record exists yet. Records are never removed.

use log::{debug, info};
use ordered_float::OrderedFloat;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::distance::DistanceEngine;
use super::types::{
    EdgeId, LaneId, StationId, VehicleId, BATTERY_CEILING, INTERVENTION_THRESHOLD,
};
use super::visits::LaneVisitStatistics;

/// Which of the two simulation passes is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunPass {
    /// Count lane visits of candidate vehicles, no interventions
    #[value(alias = "first_run")]
    Exploration,
    /// Route low-energy vehicles to the placed stations and measure the outcome
    #[value(alias = "second_run")]
    Validation,
}

impl fmt::Display for RunPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunPass::Exploration => "exploration",
            RunPass::Validation => "validation",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub pass: RunPass,
    /// Length of the stop scheduled at the chosen station
    pub recharge_minutes: f64,
    /// Designated vehicles above this level are clamped down to it; `None` disables the clamp
    pub battery_ceiling: Option<f64>,
    /// Vehicles below this level are sent to a station
    pub intervention_threshold: f64,
}

impl ControllerConfig {
    pub fn exploration() -> Self {
        Self {
            pass: RunPass::Exploration,
            recharge_minutes: 10.0,
            battery_ceiling: Some(BATTERY_CEILING),
            intervention_threshold: INTERVENTION_THRESHOLD,
        }
    }

    pub fn validation(recharge_minutes: f64) -> Self {
        Self {
            pass: RunPass::Validation,
            recharge_minutes,
            ..Self::exploration()
        }
    }

    pub fn recharge_duration_secs(&self) -> u32 {
        (self.recharge_minutes * 60.0).max(0.0) as u32
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::exploration()
    }
}

/// What the engine reported about one vehicle this tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleObservation {
    pub id: VehicleId,
    pub lane: Option<LaneId>,
    pub road: Option<EdgeId>,
    pub battery: Option<f64>,
    pub position: Option<(f64, f64)>,
    /// Last edge of the vehicle's current route
    pub destination: Option<EdgeId>,
}

/// What the engine reported about one station this tick
#[derive(Debug, Clone, PartialEq)]
pub struct StationObservation {
    pub id: StationId,
    pub lane: LaneId,
    pub occupancy: usize,
}

/// Snapshot of the engine state taken right after a tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickObservation {
    pub tick: u64,
    pub time: f64,
    pub vehicles: Vec<VehicleObservation>,
    pub stations: Vec<StationObservation>,
}

/// A command for the engine produced by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetBattery {
        vehicle: VehicleId,
        value: f64,
    },
    Reroute {
        vehicle: VehicleId,
        edge: EdgeId,
    },
    StopAtStation {
        vehicle: VehicleId,
        station: StationId,
        duration_secs: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    /// Rerouted toward a station, not yet arrived
    Waiting,
    /// Arrived at the station and sent back to its original destination
    Recharged,
}

/// Charging history of one vehicle that entered the low-energy flow
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleChargeRecord {
    pub vehicle: VehicleId,
    pub state: ChargeState,
    pub station: StationId,
    pub station_lane: LaneId,
    pub original_destination: Option<EdgeId>,
    pub decision_time: f64,
    pub arrival_time: Option<f64>,
    pub queue_time: Option<f64>,
    pub distance_to_station: f64,
}

impl VehicleChargeRecord {
    pub fn waiting(
        vehicle: VehicleId,
        station: &StationObservation,
        original_destination: Option<EdgeId>,
        decision_time: f64,
        distance_to_station: f64,
    ) -> Self {
        Self {
            vehicle,
            state: ChargeState::Waiting,
            station: station.id.clone(),
            station_lane: station.lane.clone(),
            original_destination,
            decision_time,
            arrival_time: None,
            queue_time: None,
            distance_to_station,
        }
    }

    /// Moves a waiting record to `Recharged`, returning the queue time
    ///
    /// Does nothing and returns `None` if the record is already recharged.
    pub fn mark_recharged(&mut self, arrival_time: f64) -> Option<f64> {
        if self.state != ChargeState::Waiting {
            return None;
        }
        let queue_time = arrival_time - self.decision_time;
        self.arrival_time = Some(arrival_time);
        self.queue_time = Some(queue_time);
        self.state = ChargeState::Recharged;
        Some(queue_time)
    }
}

/// Per-vehicle charging state machine plus exploration-pass lane accounting
#[derive(Debug, Clone)]
pub struct ChargeController {
    config: ControllerConfig,
    /// Designated vehicles not yet recharged, in designation order
    low_energy: Vec<VehicleId>,
    designated: HashSet<VehicleId>,
    records: Vec<VehicleChargeRecord>,
    tracked: HashMap<VehicleId, usize>,
    visits: LaneVisitStatistics,
}

impl ChargeController {
    pub fn new(config: ControllerConfig, low_energy: Vec<VehicleId>) -> Self {
        let mut designated = HashSet::new();
        let low_energy: Vec<VehicleId> = low_energy
            .into_iter()
            .filter(|vehicle| designated.insert(vehicle.clone()))
            .collect();

        Self {
            config,
            low_energy,
            designated,
            records: Vec::new(),
            tracked: HashMap::new(),
            visits: LaneVisitStatistics::new(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Whether the vehicle is still in the low-energy set
    pub fn is_designated(&self, vehicle: &VehicleId) -> bool {
        self.designated.contains(vehicle)
    }

    pub fn low_energy_count(&self) -> usize {
        self.low_energy.len()
    }

    /// Low-energy vehicles that have no record yet
    pub fn active_low_energy(&self) -> impl Iterator<Item = &VehicleId> {
        self.low_energy
            .iter()
            .filter(|vehicle| !self.tracked.contains_key(*vehicle))
    }

    pub fn record(&self, vehicle: &VehicleId) -> Option<&VehicleChargeRecord> {
        self.tracked.get(vehicle).map(|index| &self.records[*index])
    }

    pub fn records(&self) -> &[VehicleChargeRecord] {
        &self.records
    }

    pub fn visits(&self) -> &LaneVisitStatistics {
        &self.visits
    }

    pub fn into_parts(self) -> (LaneVisitStatistics, Vec<VehicleChargeRecord>) {
        (self.visits, self.records)
    }

    /// Runs one tick of the state machine and returns the commands to issue
    pub fn decide(
        &mut self,
        observation: &TickObservation,
        distance: &mut DistanceEngine,
    ) -> Vec<EngineCommand> {
        let mut commands = Vec::new();
        let vehicles: HashMap<&VehicleId, &VehicleObservation> = observation
            .vehicles
            .iter()
            .map(|vehicle| (&vehicle.id, vehicle))
            .collect();
        let validating = self.config.pass == RunPass::Validation;

        let capped = if validating {
            self.cap_batteries(observation, &mut commands)
        } else {
            HashMap::new()
        };

        self.settle_arrivals(observation, &vehicles, &mut commands);

        let active: Vec<VehicleId> = self.active_low_energy().cloned().collect();
        for vehicle_id in &active {
            let Some(vehicle) = vehicles.get(vehicle_id) else {
                continue;
            };

            if validating {
                let battery = capped.get(vehicle_id).copied().or(vehicle.battery);
                if let Some(battery) = battery {
                    if battery < self.config.intervention_threshold {
                        self.dispatch_to_station(vehicle, battery, observation, distance, &mut commands);
                    }
                }
            } else if let Some(lane) = &vehicle.lane {
                self.visits.record(observation.tick, vehicle_id, lane);
            }
        }

        commands
    }

    /// Clamps designated vehicles above the ceiling, returning their effective level
    fn cap_batteries(
        &self,
        observation: &TickObservation,
        commands: &mut Vec<EngineCommand>,
    ) -> HashMap<VehicleId, f64> {
        let mut capped = HashMap::new();
        let Some(ceiling) = self.config.battery_ceiling else {
            return capped;
        };

        for vehicle in &observation.vehicles {
            if !self.designated.contains(&vehicle.id) {
                continue;
            }
            if let Some(battery) = vehicle.battery {
                if battery > ceiling {
                    debug!("Vehicle {} battery clamped from {:.0} to {:.0} Wh", vehicle.id, battery, ceiling);
                    commands.push(EngineCommand::SetBattery {
                        vehicle: vehicle.id.clone(),
                        value: ceiling,
                    });
                    capped.insert(vehicle.id.clone(), ceiling);
                }
            }
        }
        capped
    }

    /// `Waiting -> Recharged` for every vehicle now on its station lane
    fn settle_arrivals(
        &mut self,
        observation: &TickObservation,
        vehicles: &HashMap<&VehicleId, &VehicleObservation>,
        commands: &mut Vec<EngineCommand>,
    ) {
        let mut recharged = Vec::new();

        for record in self
            .records
            .iter_mut()
            .filter(|record| record.state == ChargeState::Waiting)
        {
            let Some(vehicle) = vehicles.get(&record.vehicle) else {
                continue;
            };
            if vehicle.lane.as_ref() != Some(&record.station_lane) {
                continue;
            }

            if let Some(queue_time) = record.mark_recharged(observation.time) {
                info!(
                    "Vehicle {} reached station {} after {:.2}s",
                    record.vehicle, record.station, queue_time
                );
            }
            if let Some(destination) = &record.original_destination {
                commands.push(EngineCommand::Reroute {
                    vehicle: record.vehicle.clone(),
                    edge: destination.clone(),
                });
            }
            recharged.push(record.vehicle.clone());
        }

        for vehicle in &recharged {
            self.designated.remove(vehicle);
        }
        if !recharged.is_empty() {
            self.low_energy
                .retain(|vehicle| self.designated.contains(vehicle));
        }
    }

    /// `Active -> Waiting`: route the vehicle to the nearest reachable station
    fn dispatch_to_station(
        &mut self,
        vehicle: &VehicleObservation,
        battery: f64,
        observation: &TickObservation,
        distance: &mut DistanceEngine,
        commands: &mut Vec<EngineCommand>,
    ) {
        let Some(road) = vehicle.road.as_ref() else {
            return;
        };

        let mut reachable: Vec<(&StationObservation, EdgeId, f64)> = Vec::new();
        for station in &observation.stations {
            let Some(station_edge) = distance.edge_of_lane(&station.lane) else {
                continue;
            };
            let station_distance = distance.edge_distance(road, &station_edge);
            if station_distance.is_finite() {
                reachable.push((station, station_edge, station_distance));
            }
        }

        reachable.sort_by_key(|(station, _, station_distance)| {
            (OrderedFloat(*station_distance), station.occupancy)
        });

        let Some((station, station_edge, station_distance)) = reachable.into_iter().next() else {
            debug!(
                "Vehicle {} is low on energy ({:.0} Wh) but no station is reachable from {}",
                vehicle.id, battery, road
            );
            return;
        };

        info!(
            "Vehicle {} low on energy ({:.0} Wh), heading to station {} {:.0}m away",
            vehicle.id, battery, station.id, station_distance
        );

        self.tracked.insert(vehicle.id.clone(), self.records.len());
        self.records.push(VehicleChargeRecord::waiting(
            vehicle.id.clone(),
            station,
            vehicle.destination.clone(),
            observation.time,
            station_distance,
        ));

        commands.push(EngineCommand::Reroute {
            vehicle: vehicle.id.clone(),
            edge: station_edge,
        });
        commands.push(EngineCommand::StopAtStation {
            vehicle: vehicle.id.clone(),
            station: station.id.clone(),
            duration_secs: self.config.recharge_duration_secs(),
        });
    }
}
