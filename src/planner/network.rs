//! Road-network description
//!
//! Plain data read from the network file. The graph and the lookup index are
//! both built from this, so the file is parsed exactly once per run.

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use super::types::{EdgeId, JunctionId, LaneId, DEFAULT_EDGE_LENGTH};
use super::xml::{attributes, parse_f64};

/// A lane as listed under its edge
#[derive(Debug, Clone, PartialEq)]
pub struct LaneSpec {
    pub id: LaneId,
    pub length: f64,
    pub shape: Option<String>,
}

/// An edge of the network description with its lanes
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub id: EdgeId,
    pub from: Option<JunctionId>,
    pub to: Option<JunctionId>,
    pub length: f64,
    pub is_internal: bool,
    pub lanes: Vec<LaneSpec>,
}

impl EdgeSpec {
    pub fn new(id: &str, from: &str, to: &str, length: f64) -> Self {
        Self {
            id: EdgeId::new(id),
            from: Some(JunctionId::new(from)),
            to: Some(JunctionId::new(to)),
            length,
            is_internal: false,
            lanes: Vec::new(),
        }
    }

    /// Adds a lane to the edge (builder style)
    pub fn with_lane(mut self, id: &str, length: f64) -> Self {
        self.lanes.push(LaneSpec {
            id: LaneId::new(id),
            length,
            shape: None,
        });
        self
    }

    /// Marks the edge as intersection-internal (builder style)
    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }
}

/// All edges of a road network, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkDescription {
    pub edges: Vec<EdgeSpec>,
}

impl NetworkDescription {
    pub fn new(edges: Vec<EdgeSpec>) -> Self {
        Self { edges }
    }

    /// Reads and parses a network file
    pub fn load(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read network file {}", path.display()))?;
        Self::parse(&xml).with_context(|| format!("Could not parse network file {}", path.display()))
    }

    /// Parses the `<edge>`/`<lane>` structure of a network document
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut edges = Vec::new();
        let mut current: Option<EdgeSpec> = None;

        loop {
            match reader.read_event().context("Malformed network XML")? {
                Event::Start(element) => match element.name().as_ref() {
                    b"edge" => current = Some(edge_from_element(&element)?),
                    b"lane" => push_lane(&mut current, &element)?,
                    _ => {}
                },
                Event::Empty(element) => match element.name().as_ref() {
                    b"edge" => edges.push(finish_edge(edge_from_element(&element)?)),
                    b"lane" => push_lane(&mut current, &element)?,
                    _ => {}
                },
                Event::End(element) if element.name().as_ref() == b"edge" => {
                    if let Some(edge) = current.take() {
                        edges.push(finish_edge(edge));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { edges })
    }

    /// Total number of lanes over all edges
    pub fn lane_count(&self) -> usize {
        self.edges.iter().map(|edge| edge.lanes.len()).sum()
    }
}

fn edge_from_element(element: &BytesStart) -> Result<EdgeSpec> {
    let attrs = attributes(element)?;
    let id = attrs
        .get("id")
        .context("Edge element without an id")?
        .clone();

    Ok(EdgeSpec {
        id: EdgeId(id),
        from: attrs.get("from").cloned().map(JunctionId),
        to: attrs.get("to").cloned().map(JunctionId),
        // NaN marks "no explicit length"; resolved once the lanes are known
        length: parse_f64(&attrs, "length")?.unwrap_or(f64::NAN),
        is_internal: attrs.get("function").map(String::as_str) == Some("internal"),
        lanes: Vec::new(),
    })
}

fn push_lane(current: &mut Option<EdgeSpec>, element: &BytesStart) -> Result<()> {
    // Lanes outside an edge (e.g. in other sections) are not part of the road graph
    let Some(edge) = current.as_mut() else {
        return Ok(());
    };
    let attrs = attributes(element)?;
    let id = attrs
        .get("id")
        .with_context(|| format!("Lane without an id on edge {}", edge.id))?
        .clone();

    edge.lanes.push(LaneSpec {
        id: LaneId(id),
        length: parse_f64(&attrs, "length")?.unwrap_or(0.0),
        shape: attrs.get("shape").cloned(),
    });
    Ok(())
}

fn finish_edge(mut edge: EdgeSpec) -> EdgeSpec {
    if edge.length.is_nan() {
        edge.length = edge
            .lanes
            .first()
            .map(|lane| lane.length)
            .filter(|length| *length > 0.0)
            .unwrap_or(DEFAULT_EDGE_LENGTH);
    }
    edge
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<net version="1.9">
    <edge id=":J2_0" function="internal">
        <lane id=":J2_0_0" index="0" speed="13.89" length="4.50" shape="0,0 1,1"/>
    </edge>
    <edge id="E1" from="J1" to="J2" priority="-1">
        <lane id="E1_0" index="0" speed="13.89" length="100.00" shape="0,0 100,0"/>
        <lane id="E1_1" index="1" speed="13.89" length="100.00" shape="0,3 100,3"/>
    </edge>
    <edge id="E2" from="J2" to="J3" length="210.5">
        <lane id="E2_0" index="0" length="200.00"/>
    </edge>
    <edge id="E3" from="J3"/>
    <junction id="J1" type="priority"/>
</net>"#;

    #[test]
    fn parses_edges_and_lanes() {
        let net = NetworkDescription::parse(NET).unwrap();
        assert_eq!(net.edges.len(), 4);
        assert_eq!(net.lane_count(), 4);

        let internal = &net.edges[0];
        assert!(internal.is_internal);
        assert!(internal.from.is_none());

        let e1 = &net.edges[1];
        assert_eq!(e1.from, Some(JunctionId::new("J1")));
        assert_eq!(e1.lanes.len(), 2);
        assert_eq!(e1.length, 100.0);
        assert_eq!(e1.lanes[0].shape.as_deref(), Some("0,0 100,0"));

        assert_eq!(net.edges[2].length, 210.5);
    }

    #[test]
    fn edge_without_lanes_gets_default_length() {
        let net = NetworkDescription::parse(NET).unwrap();
        let e3 = &net.edges[3];
        assert!(e3.to.is_none());
        assert_eq!(e3.length, DEFAULT_EDGE_LENGTH);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(NetworkDescription::parse("<net><edge id=\"a\" length=\"x\"/></net>").is_err());
    }
}
