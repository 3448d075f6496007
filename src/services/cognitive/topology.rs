use crate::models::{ClassifiedNode, NodeId};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Spatial queries over one pass's classified nodes.
///
/// All coordinates are normalized to the canvas, so a query reads the same
/// on any screen resolution.
#[derive(Debug, Clone, Copy)]
pub struct TopologyIndex<'a> {
    nodes: &'a [ClassifiedNode],
}

impl<'a> TopologyIndex<'a> {
    pub fn new(nodes: &'a [ClassifiedNode]) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &'a [ClassifiedNode] {
        self.nodes
    }

    /// Nodes whose normalized top-left corner lies in the rectangle, bounds inclusive
    pub fn region(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Vec<&'a ClassifiedNode> {
        self.nodes
            .iter()
            .filter(|node| {
                let p = node.normalized_top_left();
                p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y
            })
            .collect()
    }

    /// Closest node strictly on the `direction` side of `source`.
    ///
    /// Off-axis drift weighs ten times the on-axis distance, and a candidate
    /// must lie within `max_distance` of the source on both axes.
    pub fn neighbor(&self, source: &ClassifiedNode, direction: Direction, max_distance: f64) -> Option<&'a ClassifiedNode> {
        self.neighbor_excluding(source, direction, max_distance, &HashSet::new())
    }

    /// [`neighbor`](Self::neighbor) ignoring every node in `excluded`
    pub fn neighbor_excluding(
        &self,
        source: &ClassifiedNode,
        direction: Direction,
        max_distance: f64,
        excluded: &HashSet<NodeId>,
    ) -> Option<&'a ClassifiedNode> {
        let origin = source.normalized_center();

        self.nodes
            .iter()
            .filter(|node| node.id != source.id && !excluded.contains(&node.id))
            .filter_map(|node| {
                let target = node.normalized_center();
                let dx = target.x - origin.x;
                let dy = target.y - origin.y;

                if dx.abs() >= max_distance || dy.abs() >= max_distance {
                    return None;
                }

                weighted_distance(dx, dy, direction).map(|distance| (node, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(node, _)| node)
    }
}

fn weighted_distance(dx: f64, dy: f64, direction: Direction) -> Option<f64> {
    match direction {
        Direction::Right if dx > 0.0 => Some(dy.abs() * 10.0 + dx),
        Direction::Left if dx < 0.0 => Some(dy.abs() * 10.0 + dx.abs()),
        Direction::Down if dy > 0.0 => Some(dx.abs() * 10.0 + dy),
        Direction::Up if dy < 0.0 => Some(dx.abs() * 10.0 + dy.abs()),
        _ => None,
    }
}
