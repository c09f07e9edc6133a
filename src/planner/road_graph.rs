//! Weighted road graph for shortest-path queries
//!
//! Junctions are nodes, road segments are directed edges weighted by length.

use anyhow::{Context, Result};
use log::debug;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use super::network::NetworkDescription;
use super::types::{EdgeId, JunctionId};

/// Edge data for the road graph
#[derive(Debug, Clone)]
pub struct RoadEdge {
    pub edge_id: EdgeId,
    pub weight: f64,
}

/// Directed road graph built from a network description
#[derive(Debug, Default, Clone)]
pub struct RoadNetworkGraph {
    /// The underlying petgraph directed graph
    graph: DiGraph<JunctionId, RoadEdge>,

    /// Maps junction IDs to their node indices in the graph
    junction_to_node: HashMap<JunctionId, NodeIndex>,

    /// Forward edges added from the description, for diagnostics
    added_edges: BTreeSet<EdgeId>,
}

impl RoadNetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from every edge that has both endpoints
    ///
    /// Non-internal edges are traversable in both directions at the same cost.
    /// Edges missing an endpoint are skipped.
    pub fn from_description(description: &NetworkDescription) -> Self {
        let mut graph = Self::new();
        let mut skipped = 0usize;

        for edge in &description.edges {
            match (&edge.from, &edge.to) {
                (Some(from), Some(to)) => {
                    graph.add_segment(&edge.id, from, to, edge.length, edge.is_internal);
                }
                _ => skipped += 1,
            }
        }

        debug!(
            "Road graph built: {} junctions, {} directed segments, {} edges without endpoints skipped",
            graph.junction_count(),
            graph.segment_count(),
            skipped
        );
        graph
    }

    /// Adds a junction to the graph, returning its node index
    pub fn add_junction(&mut self, junction_id: &JunctionId) -> NodeIndex {
        if let Some(node) = self.junction_to_node.get(junction_id) {
            return *node;
        }

        let node = self.graph.add_node(junction_id.clone());
        self.junction_to_node.insert(junction_id.clone(), node);
        node
    }

    /// Adds a road segment, plus its reverse unless it is internal
    pub fn add_segment(
        &mut self,
        edge_id: &EdgeId,
        from: &JunctionId,
        to: &JunctionId,
        weight: f64,
        is_internal: bool,
    ) {
        let from_node = self.add_junction(from);
        let to_node = self.add_junction(to);

        self.graph.add_edge(
            from_node,
            to_node,
            RoadEdge {
                edge_id: edge_id.clone(),
                weight,
            },
        );
        self.added_edges.insert(edge_id.clone());

        if !is_internal {
            self.graph.add_edge(
                to_node,
                from_node,
                RoadEdge {
                    edge_id: edge_id.reversed(),
                    weight,
                },
            );
        }
    }

    /// Whether the junction is a node of the graph
    pub fn contains_junction(&self, junction_id: &JunctionId) -> bool {
        self.junction_to_node.contains_key(junction_id)
    }

    /// Weighted shortest-path length between two junctions (A* with null heuristic)
    ///
    /// Returns `None` if either junction is unknown or no path exists.
    pub fn shortest_path_length(&self, start: &JunctionId, end: &JunctionId) -> Option<f64> {
        let start_node = *self.junction_to_node.get(start)?;
        let end_node = *self.junction_to_node.get(end)?;

        if start_node == end_node {
            return Some(0.0);
        }

        let (cost, _) = astar(
            &self.graph,
            start_node,
            |node| node == end_node,
            |edge| edge.weight().weight,
            |_| 0.0, // Null heuristic = Dijkstra
        )?;

        Some(cost)
    }

    /// Get number of junctions
    pub fn junction_count(&self) -> usize {
        self.junction_to_node.len()
    }

    /// Get number of directed segments, reverse directions included
    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Forward edges added from the description, sorted by id
    pub fn added_edge_ids(&self) -> &BTreeSet<EdgeId> {
        &self.added_edges
    }

    /// Writes the count and ids of the edges that made it into the graph
    pub fn write_edge_report(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create edge report {}", path.display()))?;
        let mut out = std::io::BufWriter::new(file);

        writeln!(out, "Total edges added to graph: {}", self.added_edges.len())?;
        for edge in &self.added_edges {
            writeln!(out, "{}", edge)?;
        }
        out.flush()?;
        Ok(())
    }
}
