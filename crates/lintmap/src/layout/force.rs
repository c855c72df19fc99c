//! Force-directed class layout engine
//!
//! This module implements a Fruchterman–Reingold layout on a unit grid.
//! Repulsion is only evaluated between nodes in neighboring grid cells,
//! which keeps each step close to linear in the number of nodes.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{graph::NodeIndex, graph::UnGraph, visit::EdgeRef};
use rand::{Rng, SeedableRng, rngs::StdRng};

use lintmap_core::{
    geometry::{Bounds, Point},
    identifier::EntityKey,
};

use crate::{
    LintmapError,
    config::LayoutConfig,
    layout::{Layout, LayoutNode},
};

/// Force layout engine for class diagrams
///
/// Nodes start on a jittered grid and are moved by attractive forces along
/// associations and repulsive forces between neighbors, with a temperature
/// that cools linearly to zero. The result is deterministic for a given
/// seed and input.
#[derive(Debug, Clone)]
pub struct Engine {
    // Simulation parameters
    iterations: usize,
    ideal_distance: f64,
    initial_temperature: f64,
    jitter: f64,
    seed: u64,
    // Canvas mapping
    scale: f64,
    margin: f64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl Engine {
    /// Create a new force layout engine with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            iterations: config.iterations(),
            ideal_distance: 1.0,
            initial_temperature: 0.1,
            jitter: 0.25,
            seed: config.seed(),
            scale: config.scale(),
            margin: config.margin(),
        }
    }

    /// Set the number of iterations for the force simulation
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Set the seed of the initial placement jitter
    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Set the canvas units per grid unit
    pub fn set_scale(&mut self, scale: f64) -> &mut Self {
        self.scale = scale;
        self
    }

    /// Set the distance kept from the canvas origin
    pub fn set_margin(&mut self, margin: f64) -> &mut Self {
        self.margin = margin;
        self
    }

    /// Lay out `nodes`, pulling together the endpoints of each edge.
    ///
    /// Edges naming unknown nodes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LintmapError::Layout`] if the simulation produces a
    /// non-finite coordinate.
    pub fn calculate(
        &self,
        nodes: &[LayoutNode],
        edges: &[(EntityKey, EntityKey)],
    ) -> Result<Layout, LintmapError> {
        if nodes.is_empty() {
            return Ok(Layout::default());
        }

        let mut sorted: Vec<&LayoutNode> = nodes.iter().collect();
        sorted.sort_by(|a, b| a.key.cmp(&b.key));
        sorted.dedup_by(|a, b| a.key == b.key);

        let graph = build_graph(&sorted, edges);
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count();
            "Running force layout"
        );

        let positions = self.run_force_simulation(&graph);
        if positions
            .iter()
            .any(|p| !p.x().is_finite() || !p.y().is_finite())
        {
            return Err(LintmapError::Layout(
                "force simulation produced a non-finite position".to_string(),
            ));
        }

        Ok(self.place_on_canvas(&sorted, &positions))
    }

    /// Initialize positions on a grid with seeded jitter
    fn initialize_positions(&self, node_count: usize) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let grid_size = grid_size(node_count);

        (0..node_count)
            .map(|i| {
                let row = i / grid_size;
                let col = i % grid_size;

                // Cell centers, one ideal distance apart
                let base = Point::new(
                    (col as f64 + 0.5) * self.ideal_distance,
                    (row as f64 + 0.5) * self.ideal_distance,
                );

                // Break perfect alignment so forces are never exactly balanced
                let jitter = Point::new(
                    rng.random_range(-self.jitter..self.jitter),
                    rng.random_range(-self.jitter..self.jitter),
                );
                base.add_point(jitter.scale(self.ideal_distance))
            })
            .collect()
    }

    /// Run the Fruchterman–Reingold simulation
    fn run_force_simulation(&self, graph: &UnGraph<EntityKey, ()>) -> Vec<Point> {
        let node_count = graph.node_count();
        let mut positions = self.initialize_positions(node_count);
        if node_count < 2 {
            return positions;
        }

        let k = self.ideal_distance;
        let frame = grid_size(node_count) as f64 * k;
        let start_temperature = self.initial_temperature * frame;
        // Repulsion is ignored beyond two ideal distances
        let cell_size = 2.0 * k;

        for iteration in 0..self.iterations {
            let temperature =
                start_temperature * (1.0 - iteration as f64 / self.iterations as f64);
            let mut displacement = vec![Point::default(); node_count];

            // Bucket nodes into grid cells
            let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
            for (i, p) in positions.iter().enumerate() {
                cells.entry(cell_of(*p, cell_size)).or_default().push(i);
            }

            // Repulsive forces between nodes in the same or adjacent cells
            for (i, &pos_i) in positions.iter().enumerate() {
                let (cx, cy) = cell_of(pos_i, cell_size);
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        let Some(bucket) = cells.get(&(cx + dx, cy + dy)) else {
                            continue;
                        };
                        for &j in bucket {
                            if i == j {
                                continue;
                            }
                            let delta = separation(pos_i, positions[j], i, j);
                            let distance = delta.hypot();
                            if distance >= cell_size {
                                continue;
                            }
                            let force = k * k / distance;
                            displacement[i] =
                                displacement[i].add_point(delta.scale(force / distance));
                        }
                    }
                }
            }

            // Attractive forces along edges
            for edge in graph.edge_references() {
                let (s, t) = (edge.source().index(), edge.target().index());
                if s == t {
                    continue;
                }
                let delta = separation(positions[s], positions[t], s, t);
                let distance = delta.hypot();
                let force = distance * distance / k;
                let pull = delta.scale(force / distance);
                displacement[s] = displacement[s].sub_point(pull);
                displacement[t] = displacement[t].add_point(pull);
            }

            // Move by at most the current temperature and stay inside the frame
            for (position, offset) in positions.iter_mut().zip(&displacement) {
                let length = offset.hypot();
                if length > 0.0 {
                    let step = offset.scale(length.min(temperature) / length);
                    let moved = position.add_point(step);
                    *position = Point::new(moved.x().clamp(0.0, frame), moved.y().clamp(0.0, frame));
                }
            }

            trace!(iteration, temperature; "Force layout step");
        }

        positions
    }

    /// Map grid positions onto the canvas.
    ///
    /// The minimum corner moves to zero, coordinates scale by the configured
    /// multiplier, and each box is offset by the margin plus its half-extent
    /// so no box reaches the canvas origin.
    fn place_on_canvas(&self, nodes: &[&LayoutNode], positions: &[Point]) -> Layout {
        let min_x = positions.iter().map(|p| p.x()).fold(f64::INFINITY, f64::min);
        let min_y = positions.iter().map(|p| p.y()).fold(f64::INFINITY, f64::min);
        let origin = Point::new(min_x, min_y);
        let margin = Point::new(self.margin, self.margin);

        let placed: IndexMap<EntityKey, Bounds> = nodes
            .iter()
            .zip(positions)
            .map(|(node, &position)| {
                let center = position
                    .sub_point(origin)
                    .scale(self.scale)
                    .add_point(margin)
                    .add_point(node.size.half_extents());
                (node.key.clone(), Bounds::new_from_center(center, node.size))
            })
            .collect();

        Layout { positions: placed }
    }
}

fn grid_size(node_count: usize) -> usize {
    ((node_count as f64).sqrt().ceil() as usize).max(1)
}

fn cell_of(point: Point, cell_size: f64) -> (i64, i64) {
    (
        (point.x() / cell_size).floor() as i64,
        (point.y() / cell_size).floor() as i64,
    )
}

/// Vector from `b` to `a`, nudged apart deterministically when the two
/// coincide.
fn separation(a: Point, b: Point, i: usize, j: usize) -> Point {
    let delta = a.sub_point(b);
    if delta.hypot() > f64::EPSILON {
        return delta;
    }
    let sign = if i < j { -1.0 } else { 1.0 };
    Point::new(sign * 0.01, sign * 0.01)
}

fn build_graph(nodes: &[&LayoutNode], edges: &[(EntityKey, EntityKey)]) -> UnGraph<EntityKey, ()> {
    let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
    let indices: HashMap<&EntityKey, NodeIndex> = nodes
        .iter()
        .map(|node| (&node.key, graph.add_node(node.key.clone())))
        .collect();

    for (head, tail) in edges {
        match (indices.get(head), indices.get(tail)) {
            (Some(&a), Some(&b)) => {
                graph.add_edge(a, b, ());
            }
            _ => debug!(head:% = head, tail:% = tail; "Skipping edge with unknown endpoint"),
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use lintmap_core::geometry::Size;

    use super::*;

    fn node(name: &str) -> LayoutNode {
        LayoutNode::new(EntityKey::new("m.py", name), Size::new(120.0, 64.0))
    }

    fn key(name: &str) -> EntityKey {
        EntityKey::new("m.py", name)
    }

    #[test]
    fn test_empty_input() {
        let layout = Engine::new().calculate(&[], &[]).unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn test_single_node_is_offset_from_origin() {
        let engine = Engine::new();
        let first = engine.calculate(&[node("A")], &[]).unwrap();
        let second = engine.calculate(&[node("A")], &[]).unwrap();

        let position = first.position(&key("A")).unwrap();
        assert_eq!(Some(position), second.position(&key("A")));
        let bounds = first.bounds(&key("A")).unwrap();
        assert!(bounds.min_x() > 0.0 && bounds.min_y() > 0.0);
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let nodes = vec![node("C"), node("A"), node("B"), node("D")];
        let mut reversed = nodes.clone();
        reversed.reverse();
        let edges = vec![(key("A"), key("B")), (key("B"), key("C"))];

        let engine = Engine::new();
        let first = engine.calculate(&nodes, &edges).unwrap();
        let second = engine.calculate(&reversed, &edges).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_box_touches_origin() {
        let nodes: Vec<_> = (0..9).map(|i| node(&format!("N{i}"))).collect();
        let edges: Vec<_> = (1..9)
            .map(|i| (key("N0"), key(&format!("N{i}"))))
            .collect();

        let layout = Engine::new().calculate(&nodes, &edges).unwrap();
        assert_eq!(layout.len(), 9);
        let extent = layout.extent().unwrap();
        assert!(extent.min_x() >= 40.0 - 1e-9);
        assert!(extent.min_y() >= 40.0 - 1e-9);
    }

    #[test]
    fn test_unknown_edge_endpoint_is_ignored() {
        let layout = Engine::new()
            .calculate(&[node("A")], &[(key("A"), key("Missing"))])
            .unwrap();
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_seed_changes_initial_placement() {
        let mut engine = Engine::new();
        let first = engine.initialize_positions(4);
        engine.set_seed(7);
        let second = engine.initialize_positions(4);
        assert_ne!(first, second);
        assert_eq!(first, Engine::new().initialize_positions(4));
    }
}
