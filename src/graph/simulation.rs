//! Force-directed layout simulation
//!
//! Discrete-time relaxation over the node set: pairwise repulsive charge,
//! spring attraction along edges, and a centering force that keeps the
//! layout's mean position at the origin. Every tick integrates velocities,
//! clamps positions to the canvas box and decays alpha; the simulation is
//! settled once alpha falls below its floor, and reheats on drag or when a
//! new data set arrives.
//!
//! Constants and integration order follow the d3-force model the original
//! renderer was built on, so layouts look familiar to anyone tuning them.

use std::f64::consts::PI;

use crate::config::GraphConfig;

use super::{GraphData, GraphEdge, GraphNode};

/// Alpha floor below which the simulation is considered settled
const ALPHA_MIN: f64 = 0.001;

/// Alpha target while a node is being dragged
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Fraction of velocity retained per tick
const VELOCITY_RETENTION: f64 = 0.6;

/// Phyllotaxis seeding constants for nodes without an initial position
const INITIAL_RADIUS: f64 = 10.0;

/// Tuning parameters for one simulation run
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Canvas width; positions clamp to `[-width/2, width/2]`
    pub width: f64,
    /// Canvas height; positions clamp to `[-height/2, height/2]`
    pub height: f64,
    /// Pairwise charge strength (negative = repulsive)
    pub charge_strength: f64,
    /// Spring rest length along edges
    pub link_distance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let graph = GraphConfig::default();
        Self {
            width: graph.width,
            height: graph.height,
            charge_strength: graph.charge_strength,
            link_distance: graph.link_distance,
        }
    }
}

impl From<&GraphConfig> for SimulationConfig {
    fn from(graph: &GraphConfig) -> Self {
        Self {
            width: graph.width,
            height: graph.height,
            charge_strength: graph.charge_strength,
            link_distance: graph.link_distance,
        }
    }
}

/// The d3 linear congruential generator, fixed seed, for deterministic
/// jiggle of coincident nodes.
struct Lcg {
    state: u32,
}

impl Lcg {
    fn new() -> Self {
        Self { state: 1 }
    }

    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.state) / 4_294_967_296.0
    }

    /// Tiny deterministic offset to separate exactly-coincident nodes.
    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

/// A running force simulation over one node/edge set.
///
/// The owning view holds the simulation exclusively, drives [`tick`] from its
/// frame callback, and drops or [`stop`]s it on teardown; new data means a
/// new simulation, not a patch.
///
/// [`tick`]: Simulation::tick
/// [`stop`]: Simulation::stop
pub struct Simulation {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    config: SimulationConfig,
    alpha: f64,
    alpha_target: f64,
    alpha_decay: f64,
    stopped: bool,
    // Per-edge spring parameters derived from node degrees
    edge_strength: Vec<f64>,
    edge_bias: Vec<f64>,
    random: Lcg,
}

impl Simulation {
    pub fn new(data: GraphData, config: SimulationConfig) -> Self {
        let GraphData { mut nodes, edges } = data;

        // Seed unpositioned nodes on a phyllotaxis spiral around the origin
        let initial_angle = PI * (3.0 - 5.0_f64.sqrt());
        for (index, node) in nodes.iter_mut().enumerate() {
            if node.x.is_nan() || node.y.is_nan() {
                let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
                let angle = index as f64 * initial_angle;
                node.x = radius * angle.cos();
                node.y = radius * angle.sin();
            }
        }

        let mut degree = vec![0usize; nodes.len()];
        for edge in &edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }

        let edge_strength = edges
            .iter()
            .map(|edge| 1.0 / degree[edge.source].min(degree[edge.target]) as f64)
            .collect();
        let edge_bias = edges
            .iter()
            .map(|edge| {
                degree[edge.source] as f64 / (degree[edge.source] + degree[edge.target]) as f64
            })
            .collect();

        Self {
            nodes,
            edges,
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
            stopped: false,
            edge_strength,
            edge_bias,
            random: Lcg::new(),
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// The simulation has cooled below its alpha floor.
    pub fn settled(&self) -> bool {
        self.alpha < ALPHA_MIN
    }

    /// Advance one tick; returns false once the simulation is stopped or
    /// settled and a redraw is no longer needed.
    pub fn tick(&mut self) -> bool {
        if self.stopped || (self.settled() && self.alpha_target < ALPHA_MIN) {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        self.apply_link_force();
        self.apply_charge_force();
        self.apply_center_force();
        self.integrate();

        true
    }

    /// Drive ticks until settled, up to `max_ticks`. Returns ticks run.
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// Stop the simulation; its owning view is tearing down.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Bring alpha back to 1.0, e.g. after replacing tuning parameters.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.stopped = false;
    }

    /// Begin dragging a node: pin it at its current position and warm the
    /// simulation so neighbours follow. A stale index (the node set was
    /// rebuilt under the gesture) is ignored with a warning.
    pub fn drag_start(&mut self, index: usize) {
        let Some(node) = self.nodes.get_mut(index) else {
            tracing::warn!("drag_start for unknown node index {index}");
            return;
        };
        node.fx = Some(node.x);
        node.fy = Some(node.y);
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.stopped = false;
    }

    /// Move the dragged node's pin.
    pub fn drag_to(&mut self, index: usize, x: f64, y: f64) {
        let Some(node) = self.nodes.get_mut(index) else {
            tracing::warn!("drag_to for unknown node index {index}");
            return;
        };
        node.fx = Some(x);
        node.fy = Some(y);
    }

    /// End the drag. The node stays pinned where the user left it; cooling
    /// resumes.
    pub fn drag_end(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Release a node's pin so the simulation owns its position again.
    pub fn release_pin(&mut self, index: usize) {
        let Some(node) = self.nodes.get_mut(index) else {
            tracing::warn!("release_pin for unknown node index {index}");
            return;
        };
        node.fx = None;
        node.fy = None;
    }

    // Spring attraction along edges, degree-weighted as in d3-force so hubs
    // move less than leaves.
    fn apply_link_force(&mut self) {
        for (edge_index, edge) in self.edges.iter().enumerate() {
            let source = &self.nodes[edge.source];
            let target = &self.nodes[edge.target];

            let mut dx = target.x + target.vx - source.x - source.vx;
            let mut dy = target.y + target.vy - source.y - source.vy;
            if dx == 0.0 && dy == 0.0 {
                dx = self.random.jiggle();
                dy = self.random.jiggle();
            }

            let length = (dx * dx + dy * dy).sqrt();
            let displacement = (length - self.config.link_distance) / length
                * self.alpha
                * self.edge_strength[edge_index];
            let (fx, fy) = (dx * displacement, dy * displacement);

            let bias = self.edge_bias[edge_index];
            let target = &mut self.nodes[edge.target];
            target.vx -= fx * bias;
            target.vy -= fy * bias;
            let source = &mut self.nodes[edge.source];
            source.vx += fx * (1.0 - bias);
            source.vy += fy * (1.0 - bias);
        }
    }

    // Pairwise repulsion; exact O(n²) rather than the Barnes-Hut
    // approximation, which is fine at dependency-graph sizes.
    fn apply_charge_force(&mut self) {
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx == 0.0 && dy == 0.0 {
                    dx = self.random.jiggle();
                    dy = self.random.jiggle();
                }

                let distance_sq = dx * dx + dy * dy;
                let weight = self.config.charge_strength * self.alpha / distance_sq;

                self.nodes[i].vx -= dx * weight;
                self.nodes[i].vy -= dy * weight;
                self.nodes[j].vx += dx * weight;
                self.nodes[j].vy += dy * weight;
            }
        }
    }

    // Shift all nodes so the layout's mean sits at the origin; without this
    // the graph free-drifts off-canvas.
    fn apply_center_force(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        let count = self.nodes.len() as f64;
        let mean_x = self.nodes.iter().map(|n| n.x).sum::<f64>() / count;
        let mean_y = self.nodes.iter().map(|n| n.y).sum::<f64>() / count;

        for node in &mut self.nodes {
            node.x -= mean_x;
            node.y -= mean_y;
        }
    }

    fn integrate(&mut self) {
        let half_width = self.config.width / 2.0;
        let half_height = self.config.height / 2.0;

        for node in &mut self.nodes {
            match (node.fx, node.fy) {
                (Some(fx), Some(fy)) => {
                    node.x = fx;
                    node.y = fy;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                _ => {
                    node.vx *= VELOCITY_RETENTION;
                    node.vy *= VELOCITY_RETENTION;
                    node.x += node.vx;
                    node.y += node.vy;
                }
            }

            node.x = node.x.clamp(-half_width, half_width);
            node.y = node.y.clamp(-half_height, half_height);
        }
    }
}
