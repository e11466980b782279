use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::{Error, Result};

/// 4-connectivity, no diagonals.
pub const NEIGHBOUR_OFFSETS: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// Directed boundary between two adjacent nodes, stored as arena indices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    coord: Coordinate,
    edges: Vec<Edge>,
    occupancy: BTreeMap<i32, bool>,
}

impl Node {
    fn new(coord: Coordinate) -> Self {
        Self {
            coord,
            edges: Vec::new(),
            occupancy: BTreeMap::new(),
        }
    }

    pub fn coord(&self) -> Coordinate {
        self.coord
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn occupancy(&self) -> &BTreeMap<i32, bool> {
        &self.occupancy
    }

    pub fn is_occupied_at(&self, height: i32) -> bool {
        self.occupancy.get(&height).copied().unwrap_or(false)
    }

    pub fn set_occupied_at(&mut self, height: i32) {
        self.occupancy.insert(height, true);
    }

    /// Records the height as explicitly free rather than forgetting it.
    pub fn clear_occupancy_at(&mut self, height: i32) {
        self.occupancy.insert(height, false);
    }

    pub fn occupied_heights(&self) -> impl Iterator<Item = i32> + '_ {
        self.occupancy
            .iter()
            .filter_map(|(&h, &filled)| filled.then_some(h))
    }
}

/// Arena of nodes for a `width x height` lattice, indexed by `i * height + j`.
/// Topology is fixed at construction; only occupancy changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Graph {
    width: usize,
    height: usize,
    nodes: Vec<Node>,
}

impl Graph {
    /// Number of nodes a `width x height` lattice needs, or `None` when an
    /// axis leaves the `i32` coordinate range or the product overflows.
    pub fn node_count(width: usize, height: usize) -> Option<usize> {
        i32::try_from(width).ok()?;
        i32::try_from(height).ok()?;
        width.checked_mul(height)
    }

    pub fn new(width: usize, height: usize) -> Result<Self> {
        let count =
            Self::node_count(width, height).ok_or(Error::BoardTooLarge { width, height })?;
        let mut slots: Vec<Option<Node>> = vec![None; count];
        for i in 0..width {
            for j in 0..height {
                let coord = Coordinate::new(i as i32, j as i32);
                let slot = &mut slots[i * height + j];
                if slot.is_some() {
                    return Err(Error::DuplicateCoordinate(coord));
                }
                *slot = Some(Node::new(coord));
            }
        }

        let mut graph = Self {
            width,
            height,
            nodes: slots.into_iter().flatten().collect(),
        };
        graph.build_edges();
        Ok(graph)
    }

    fn build_edges(&mut self) {
        for from in 0..self.nodes.len() {
            let coord = self.nodes[from].coord;
            let edges: Vec<Edge> = NEIGHBOUR_OFFSETS
                .iter()
                .filter_map(|&(di, dj)| self.index_of(coord.offset(di, dj)))
                .map(|to| Edge { from, to })
                .collect();
            self.nodes[from].edges = edges;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn index_of(&self, coord: Coordinate) -> Option<usize> {
        let (i, j) = (usize::try_from(coord.i).ok()?, usize::try_from(coord.j).ok()?);
        (i < self.width && j < self.height).then(|| i * self.height + j)
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        self.index_of(coord).is_some()
    }

    pub fn node(&self, coord: Coordinate) -> Option<&Node> {
        self.index_of(coord).map(|idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, coord: Coordinate) -> Option<&mut Node> {
        self.index_of(coord).map(move |idx| &mut self.nodes[idx])
    }

    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    pub fn edge_endpoints(&self, edge: Edge) -> Option<(Coordinate, Coordinate)> {
        Some((self.node_at(edge.from)?.coord, self.node_at(edge.to)?.coord))
    }

    pub fn neighbours(&self, coord: Coordinate) -> Vec<Coordinate> {
        self.node(coord)
            .map(|n| {
                n.edges
                    .iter()
                    .filter_map(|e| self.node_at(e.to).map(Node::coord))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cells outside the lattice are never occupied.
    pub fn is_occupied_at(&self, coord: Coordinate, height: i32) -> bool {
        self.node(coord).is_some_and(|n| n.is_occupied_at(height))
    }

    pub fn occupied_columns_at(&self, height: i32) -> usize {
        self.nodes.iter().filter(|n| n.is_occupied_at(height)).count()
    }

    /// Checks that nodes and edges are exactly what `Graph::new` would build
    /// for these dimensions.
    pub fn check_topology(&self) -> std::result::Result<(), String> {
        let (width, height) = (self.width, self.height);
        let needed = Self::node_count(width, height)
            .ok_or_else(|| Error::BoardTooLarge { width, height }.to_string())?;
        if self.nodes.len() != needed {
            return Err(format!(
                "{width}x{height} board needs {needed} nodes, found {}",
                self.nodes.len()
            ));
        }
        let expected = Graph::new(width, height).map_err(|e| e.to_string())?;
        for (idx, (actual, wanted)) in self.nodes.iter().zip(&expected.nodes).enumerate() {
            if actual.coord != wanted.coord {
                return Err(format!(
                    "node {idx} should be at {}, found {}",
                    wanted.coord, actual.coord
                ));
            }
            if actual.edges != wanted.edges {
                return Err(format!("node {} has unexpected edges", actual.coord));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_node_per_coordinate() {
        let g = Graph::new(4, 3).expect("graph");
        assert_eq!(g.len(), 12);
        assert_eq!(g.index_of(Coordinate::new(2, 1)), Some(7));
        assert_eq!(g.index_of(Coordinate::new(4, 0)), None);
        assert_eq!(g.index_of(Coordinate::new(-1, 0)), None);
    }

    #[test]
    fn oversized_dimensions_are_refused() {
        for (w, h) in [(usize::MAX / 2, 7), (1 << 31, 1), (3, usize::MAX)] {
            assert!(
                matches!(Graph::new(w, h), Err(Error::BoardTooLarge { .. })),
                "{w}x{h} accepted"
            );
        }
        assert_eq!(Graph::node_count(usize::MAX / 2, 7), None);
        assert_eq!(Graph::node_count(4, 3), Some(12));
    }

    #[test]
    fn edge_counts_follow_in_bounds_neighbours() {
        let g = Graph::new(5, 5).expect("graph");
        let degree = |i, j| g.node(Coordinate::new(i, j)).expect("node").edges().len();
        assert_eq!(degree(0, 0), 2);
        assert_eq!(degree(4, 4), 2);
        assert_eq!(degree(0, 2), 3);
        assert_eq!(degree(2, 4), 3);
        assert_eq!(degree(2, 2), 4);
        // 2 * (w*(h-1) + h*(w-1)) directed edges.
        assert_eq!(g.edge_count(), 2 * (5 * 4 + 5 * 4));
    }

    #[test]
    fn edges_exist_in_both_directions() {
        let g = Graph::new(3, 3).expect("graph");
        for node in g.nodes() {
            for edge in node.edges() {
                let back = Edge {
                    from: edge.to,
                    to: edge.from,
                };
                assert!(g.node_at(edge.to).expect("target").edges().contains(&back));
            }
        }
    }

    #[test]
    fn same_dimensions_same_graph() {
        assert_eq!(Graph::new(6, 4).expect("a"), Graph::new(6, 4).expect("b"));
    }

    #[test]
    fn occupancy_is_per_height() {
        let mut g = Graph::new(3, 3).expect("graph");
        let c = Coordinate::new(1, 1);
        g.node_mut(c).expect("node").set_occupied_at(2);
        assert!(g.is_occupied_at(c, 2));
        assert!(!g.is_occupied_at(c, 1));
        assert_eq!(g.occupied_columns_at(2), 1);

        g.node_mut(c).expect("node").clear_occupancy_at(2);
        assert!(!g.is_occupied_at(c, 2));
        assert_eq!(g.node(c).expect("node").occupancy().get(&2), Some(&false));
    }

    #[test]
    fn topology_check_detects_tampering() {
        let mut g = Graph::new(3, 3).expect("graph");
        assert!(g.check_topology().is_ok());
        g.nodes[4].edges.pop();
        assert!(g.check_topology().is_err());
    }
}
