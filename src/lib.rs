//! EV Charging Station Planner Library
//!
//! Places charging stations on a road network from simulated traffic and
//! routes low-energy vehicles to them during validation runs.

pub mod planner;
