//! Dependency-graph layout: construction, force simulation, viewport
//!
//! Nodes are dependencies, edges are depends-on relations delivered by the
//! backend as index pairs. The whole node/edge set is rebuilt whenever new
//! dependency data arrives; there is no incremental patching.

pub mod simulation;
pub mod viewport;

use crate::api::DependencyGraph;

/// Invalid graph input reported during construction
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GraphDataError {
    #[error("edge {edge_index} references node index {node_index}, but only {node_count} nodes exist")]
    DanglingEdge {
        edge_index: usize,
        node_index: usize,
        node_count: usize,
    },
}

/// One node per dependency; identity is `"<name> <version>"`.
///
/// `x`/`y` are mutable simulation state. `fx`/`fy`, when set, pin the node:
/// the simulation copies the pinned position over the computed one every
/// tick until the pin is released.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl GraphNode {
    /// A node with no position yet; the simulation seeds it on first tick.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: f64::NAN,
            y: f64::NAN,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

/// Directed depends-on relation between two node indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
}

/// Validated node/edge set ready for layout
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// Build the layout input from a backend dependency-graph response.
    ///
    /// Edges referencing a node index outside the dependency list are
    /// dropped and reported; all remaining nodes and edges render. Partial
    /// failure, not fatal.
    pub fn from_response(response: &DependencyGraph) -> (Self, Vec<GraphDataError>) {
        let nodes: Vec<GraphNode> = response
            .dependency
            .iter()
            .map(|dependency| {
                GraphNode::new(format!(
                    "{} {}",
                    dependency.version_key.name, dependency.version_key.version
                ))
            })
            .collect();

        let mut edges = Vec::with_capacity(response.edges.len());
        let mut errors = Vec::new();

        for (edge_index, edge) in response.edges.iter().enumerate() {
            let dangling = [edge.from_node, edge.to_node]
                .into_iter()
                .find(|&index| index >= nodes.len());

            if let Some(node_index) = dangling {
                let error = GraphDataError::DanglingEdge {
                    edge_index,
                    node_index,
                    node_count: nodes.len(),
                };
                tracing::warn!("dropping invalid edge: {error}");
                errors.push(error);
                continue;
            }

            edges.push(GraphEdge {
                source: edge.from_node,
                target: edge.to_node,
            });
        }

        (Self { nodes, edges }, errors)
    }
}
