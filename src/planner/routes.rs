//! Designation of low-energy vehicles from a route file

use anyhow::{Context, Result};
use log::info;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use super::types::{VehicleId, ELECTRIC_VEHICLE_TYPE};
use super::xml::attributes;

/// Electric vehicles of a route document, in document order
pub fn electric_vehicles(route_xml: &str) -> Result<Vec<VehicleId>> {
    let mut reader = Reader::from_str(route_xml);
    reader.config_mut().trim_text(true);
    let mut vehicles = Vec::new();

    loop {
        match reader.read_event().context("Malformed route XML")? {
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == b"vehicle" =>
            {
                let attrs = attributes(&element)?;
                if attrs.get("type").map(String::as_str) == Some(ELECTRIC_VEHICLE_TYPE) {
                    if let Some(id) = attrs.get("id") {
                        vehicles.push(VehicleId::new(id.as_str()));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(vehicles)
}

/// The first `percentage`% of electric vehicles (rounded down) are designated low-energy
pub fn designate_low_energy_vehicles(route_xml: &str, percentage: u32) -> Result<Vec<VehicleId>> {
    let mut vehicles = electric_vehicles(route_xml)?;
    let designated = vehicles.len() * percentage.min(100) as usize / 100;
    vehicles.truncate(designated);
    Ok(vehicles)
}

/// Reads a route file and designates its low-energy vehicles
pub fn load_low_energy_vehicles(path: &Path, percentage: u32) -> Result<Vec<VehicleId>> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read route file {}", path.display()))?;
    let vehicles = designate_low_energy_vehicles(&xml, percentage)
        .with_context(|| format!("Could not parse route file {}", path.display()))?;
    info!(
        "{} low-energy vehicles designated from {}",
        vehicles.len(),
        path.display()
    );
    Ok(vehicles)
}

/// Route file name without directory and the `_mod.rou.xml` suffix
pub fn route_base_name(route_file: &Path) -> String {
    let name = route_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix("_mod.rou.xml")
        .map(str::to_string)
        .unwrap_or(name)
}
