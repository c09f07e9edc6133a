//! Drives a traffic engine through one pass
//!
//! The loop is strictly sequential: advance one tick, observe, decide, issue
//! commands, then advance again.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use super::controller::{
    ChargeController, EngineCommand, RunPass, StationObservation, TickObservation,
    VehicleChargeRecord, VehicleObservation,
};
use super::distance::DistanceEngine;
use super::engine::TrafficEngine;
use super::types::VehicleId;
use super::visits::LaneVisitStatistics;

/// Everything a finished pass produced
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub pass: RunPass,
    pub ticks: u64,
    pub execution_time: Duration,
    pub visits: LaneVisitStatistics,
    pub records: Vec<VehicleChargeRecord>,
}

/// Runs the engine until it reports no more expected activity
pub fn run_pass<E: TrafficEngine + ?Sized>(
    engine: &mut E,
    mut controller: ChargeController,
    distance: &mut DistanceEngine,
) -> Result<PassOutcome> {
    let pass = controller.config().pass;
    info!(
        "Starting {} pass with {} low-energy vehicles",
        pass,
        controller.low_energy_count()
    );

    let started = Instant::now();
    let mut ticks = 0u64;

    while engine.has_expected_activity() {
        engine
            .advance_one_tick()
            .with_context(|| format!("Traffic engine failed to advance past tick {}", ticks))?;
        ticks += 1;

        let observation = observe(engine, ticks, &controller);
        let commands = controller.decide(&observation, distance);
        apply_commands(engine, &commands);
    }

    let execution_time = started.elapsed();
    let (visits, records) = controller.into_parts();
    info!(
        "{} pass finished: {} ticks in {:.3}s, {} lanes visited, {} vehicles routed to stations",
        pass,
        ticks,
        execution_time.as_secs_f64(),
        visits.len(),
        records.len()
    );

    Ok(PassOutcome {
        pass,
        ticks,
        execution_time,
        visits,
        records,
    })
}

/// Snapshot of the designated vehicles (and, when validating, the stations)
///
/// A vehicle or station whose queries fail is left out of this tick.
pub fn observe<E: TrafficEngine + ?Sized>(
    engine: &mut E,
    tick: u64,
    controller: &ChargeController,
) -> TickObservation {
    let validating = controller.config().pass == RunPass::Validation;
    let time = engine.simulation_time();

    let mut vehicles = Vec::new();
    for vehicle in engine.vehicle_ids() {
        if !controller.is_designated(&vehicle) {
            continue;
        }
        match observe_vehicle(engine, &vehicle, validating) {
            Ok(observation) => vehicles.push(observation),
            Err(err) => debug!("Skipping vehicle {} at tick {}: {:#}", vehicle, tick, err),
        }
    }

    let mut stations = Vec::new();
    if validating {
        for station in engine.station_ids() {
            let lane = engine.station_lane(&station);
            let occupancy = engine.station_occupancy(&station);
            match (lane, occupancy) {
                (Ok(lane), Ok(occupancy)) => stations.push(StationObservation {
                    id: station,
                    lane,
                    occupancy,
                }),
                (Err(err), _) | (_, Err(err)) => {
                    debug!("Skipping station {} at tick {}: {:#}", station, tick, err)
                }
            }
        }
    }

    TickObservation {
        tick,
        time,
        vehicles,
        stations,
    }
}

fn observe_vehicle<E: TrafficEngine + ?Sized>(
    engine: &mut E,
    vehicle: &VehicleId,
    validating: bool,
) -> Result<VehicleObservation> {
    let lane = engine.vehicle_lane(vehicle)?;
    let mut observation = VehicleObservation {
        id: vehicle.clone(),
        lane: Some(lane).filter(|lane| !lane.as_str().is_empty()),
        ..VehicleObservation::default()
    };

    if validating {
        observation.battery = Some(engine.vehicle_battery_level(vehicle)?);
        observation.position = Some(engine.vehicle_position(vehicle)?);
        observation.road = Some(engine.vehicle_road(vehicle)?);
        observation.destination = engine.vehicle_route(vehicle)?.last().cloned();
    }

    Ok(observation)
}

/// Issues commands in order; a rejected command is logged and skipped
///
/// Returns the number of commands the engine accepted.
pub fn apply_commands<E: TrafficEngine + ?Sized>(engine: &mut E, commands: &[EngineCommand]) -> usize {
    let mut applied = 0;

    for command in commands {
        let result = match command {
            EngineCommand::SetBattery { vehicle, value } => engine.set_vehicle_battery(vehicle, *value),
            EngineCommand::Reroute { vehicle, edge } => engine.reroute_vehicle_to(vehicle, edge),
            EngineCommand::StopAtStation {
                vehicle,
                station,
                duration_secs,
            } => engine.schedule_station_stop(vehicle, station, *duration_secs),
        };

        match result {
            Ok(()) => applied += 1,
            Err(err) => warn!("Engine rejected {:?}: {:#}", command, err),
        }
    }

    applied
}
