//! Charging station planning
//!
//! Builds a weighted road graph from a network description, selects station
//! lanes from observed traffic, and routes low-energy vehicles to the placed
//! stations while a stepped traffic engine runs. The engine itself is only
//! seen through the [`TrafficEngine`] trait.

mod context;
mod controller;
mod distance;
mod engine;
mod layout;
mod metrics;
mod network;
mod network_index;
mod pipeline;
mod road_graph;
mod routes;
mod runner;
mod selection;
mod types;
mod visits;
mod xml;

pub use context::NetworkContext;
pub use controller::{
    ChargeController, ChargeState, ControllerConfig, EngineCommand, RunPass, StationObservation,
    TickObservation, VehicleChargeRecord, VehicleObservation,
};
pub use distance::{DistanceEngine, DEFAULT_CACHE_CAPACITY};
pub use engine::TrafficEngine;
pub use layout::{
    station_span, SkippedLane, StationDescriptor, StationLayout, DESIRED_SPAN, MARGIN, MIN_SPAN,
    MIN_USABLE_SPAN, PREFERRED_START, SKIPPED_REPORT_NAME,
};
pub use metrics::{
    append_result_row, electric_percentage_from_route, parse_teleports, teleports_in, ResultRow,
    RunLabels, RunMetrics,
};
pub use network::{EdgeSpec, LaneSpec, NetworkDescription};
pub use network_index::NetworkIndex;
pub use pipeline::{explore, plan_layout, require_layout, validate, PlanRequest, PlannedLayout};
pub use road_graph::{RoadEdge, RoadNetworkGraph};
pub use routes::{
    designate_low_energy_vehicles, electric_vehicles, load_low_energy_vehicles, route_base_name,
};
pub use runner::{apply_commands, observe, run_pass, PassOutcome};
pub use selection::{
    select_greedy, select_grasp, select_random, select_stations, GraspParams, SelectionMethod,
    StationCandidateSet,
};
pub use types::{
    EdgeId, JunctionId, LaneId, StationId, VehicleId, BATTERY_CEILING, DEFAULT_EDGE_LENGTH,
    DEFAULT_LOW_ENERGY_PERCENTAGE, ELECTRIC_VEHICLE_TYPE, INTERNAL_PREFIX, INTERVENTION_THRESHOLD,
};
pub use visits::LaneVisitStatistics;
