//! Physical station layout
//!
//! Converts candidate lanes into station descriptors that fit on their lane,
//! and persists them in the engine's additional-file format.

use anyhow::{Context, Result};
use log::{info, warn};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::network_index::NetworkIndex;
use super::types::{LaneId, StationId};
use super::xml::{attributes, parse_f64};

/// Lanes at or below this length never host a station
pub const MIN_SPAN: f64 = 8.0;

/// Preferred station length
pub const DESIRED_SPAN: f64 = 15.0;

/// Clearance kept to both lane ends
pub const MARGIN: f64 = 1.0;

/// Preferred distance of the station start from the lane start
pub const PREFERRED_START: f64 = 5.0;

/// Shortest span still accepted after clamping
pub const MIN_USABLE_SPAN: f64 = 1.0;

/// Name of the diagnostics file listing lanes that got no station
pub const SKIPPED_REPORT_NAME: &str = "parking_areas_skipped.txt";

/// A charging station placed on a lane
#[derive(Debug, Clone, PartialEq)]
pub struct StationDescriptor {
    pub id: StationId,
    pub lane: LaneId,
    pub start_pos: f64,
    pub end_pos: f64,
    pub capacity: u32,
}

impl StationDescriptor {
    pub fn station_id_for(lane: &LaneId) -> StationId {
        StationId(format!("parking_area_{}", lane))
    }
}

/// A candidate lane that could not host a station
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLane {
    pub lane: LaneId,
    pub length: f64,
}

/// Stations built from a candidate set, plus the lanes that were skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationLayout {
    pub stations: Vec<StationDescriptor>,
    pub skipped: Vec<SkippedLane>,
}

/// Station `(start, end)` on a lane of the given length, or `None` if it does not fit
pub fn station_span(lane_length: f64) -> Option<(f64, f64)> {
    if lane_length <= MIN_SPAN {
        return None;
    }

    let span = (lane_length - 2.0 * MARGIN).max(MIN_SPAN).min(DESIRED_SPAN);
    let start = PREFERRED_START.min(lane_length - span - MARGIN).max(MARGIN);
    let end = (lane_length - MARGIN).min(start + span);

    if end - start < MIN_USABLE_SPAN || end <= start || end > lane_length || start < 0.0 {
        return None;
    }
    Some((start, end))
}

impl StationLayout {
    /// Builds one station per eligible lane; ineligible lanes are recorded, not rejected
    pub fn build(candidates: &[LaneId], index: &NetworkIndex, capacity: u32) -> Self {
        let mut layout = Self::default();

        for lane in candidates {
            let length = index.lane_length(lane).unwrap_or(0.0);
            let span = if lane.is_internal() {
                None
            } else {
                station_span(length)
            };

            match span {
                Some((start_pos, end_pos)) => layout.stations.push(StationDescriptor {
                    id: StationDescriptor::station_id_for(lane),
                    lane: lane.clone(),
                    start_pos,
                    end_pos,
                    capacity,
                }),
                None => layout.skipped.push(SkippedLane {
                    lane: lane.clone(),
                    length,
                }),
            }
        }

        if !layout.skipped.is_empty() {
            warn!(
                "{} candidate lanes got no station (too short or internal)",
                layout.skipped.len()
            );
        }
        layout
    }

    /// Writes the stations as an engine additional file
    pub fn write_additional(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create layout file {}", path.display()))?;
        let mut writer = Writer::new_with_indent(std::io::BufWriter::new(file), b' ', 4);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("additional")))?;

        for station in &self.stations {
            let start_pos = format!("{:.2}", station.start_pos);
            let end_pos = format!("{:.2}", station.end_pos);
            let capacity = station.capacity.to_string();

            let mut element = BytesStart::new("parkingArea");
            element.push_attribute(("id", station.id.as_str()));
            element.push_attribute(("lane", station.lane.as_str()));
            element.push_attribute(("startPos", start_pos.as_str()));
            element.push_attribute(("endPos", end_pos.as_str()));
            element.push_attribute(("roadsideCapacity", capacity.as_str()));
            writer.write_event(Event::Start(element))?;

            let mut param = BytesStart::new("param");
            param.push_attribute(("key", "capacity"));
            param.push_attribute(("value", capacity.as_str()));
            writer.write_event(Event::Empty(param))?;

            writer.write_event(Event::End(BytesEnd::new("parkingArea")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("additional")))?;
        writer.into_inner().flush()?;
        Ok(())
    }

    /// Reads stations back from an additional file
    pub fn read_additional(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read layout file {}", path.display()))?;
        Self::parse_additional(&xml)
            .with_context(|| format!("Could not parse layout file {}", path.display()))
    }

    pub fn parse_additional(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut layout = Self::default();

        loop {
            match reader.read_event().context("Malformed layout XML")? {
                Event::Start(element) | Event::Empty(element)
                    if element.name().as_ref() == b"parkingArea" =>
                {
                    let attrs = attributes(&element)?;
                    let lane = LaneId(attrs.get("lane").context("Station without a lane")?.clone());
                    let id = attrs
                        .get("id")
                        .cloned()
                        .map(StationId)
                        .unwrap_or_else(|| StationDescriptor::station_id_for(&lane));
                    let capacity = attrs
                        .get("roadsideCapacity")
                        .map(|value| value.parse::<u32>())
                        .transpose()
                        .with_context(|| format!("Invalid capacity on station {}", id))?
                        .unwrap_or(0);

                    layout.stations.push(StationDescriptor {
                        start_pos: parse_f64(&attrs, "startPos")?.unwrap_or(0.0),
                        end_pos: parse_f64(&attrs, "endPos")?
                            .with_context(|| format!("Station {} without endPos", id))?,
                        id,
                        lane,
                        capacity,
                    });
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(layout)
    }

    /// Writes `<lane>\tlength=<len>` lines for the skipped lanes
    pub fn write_skipped_report(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create skipped-lane report {}", path.display()))?;
        let mut out = std::io::BufWriter::new(file);
        for skipped in &self.skipped {
            writeln!(out, "{}\tlength={}", skipped.lane, skipped.length)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Writes the layout into `out_dir`, plus the skipped report when needed
    ///
    /// Returns the path of the layout file.
    pub fn persist(&self, out_dir: &Path, base_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Could not create output directory {}", out_dir.display()))?;

        let path = out_dir.join(format!("parking_areas_{}.add.xml", base_name));
        self.write_additional(&path)?;
        info!(
            "Station layout written to {} ({} stations)",
            path.display(),
            self.stations.len()
        );

        if !self.skipped.is_empty() {
            let report = out_dir.join(SKIPPED_REPORT_NAME);
            self.write_skipped_report(&report)?;
            warn!("Lanes without a station listed in {}", report.display());
        }
        Ok(path)
    }
}
