//! Cross-domain transition generation: wall-to-floor drops at the base plate
//! and wall-to-wall corner hops where two walls share a world-XY endpoint.
//!
//! Grounded on `graph_builder.py::TransitionGenerator`. That source also
//! sketches a `FLOOR_TO_CEILING_COST` transition type which it never
//! actually wires a generator for; this module mirrors that by exposing the
//! cost constant and the `TransitionKind` variant without a corresponding
//! generator function.

use crate::domain::RoutingDomain;
use crate::geometry::Point2D;
use crate::graph::{MultiDomainGraph, TransitionEdge, TransitionKind};
use std::collections::HashMap;

pub const WALL_TO_FLOOR_COST: f64 = 2.0;
pub const WALL_TO_WALL_COST: f64 = 1.5;
pub const FLOOR_TO_CEILING_COST: f64 = 2.5;

/// A wall's placement in world XY, used to project its local `u` coordinate
/// onto the floor plate it sits on.
#[derive(Clone, Copy, Debug)]
pub struct WallPlacement {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl WallPlacement {
    fn direction(&self) -> (f64, f64) {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        let length = (dx * dx + dy * dy).sqrt();
        if length > 1e-9 {
            (dx / length, dy / length)
        } else {
            (1.0, 0.0)
        }
    }

    fn world_xy_at_u(&self, u: f64) -> (f64, f64) {
        let (dx, dy) = self.direction();
        (self.start.0 + u * dx, self.start.1 + u * dy)
    }
}

/// Generates transition edges and queues them on `graph`. Keeps a running
/// counter so repeated calls within one assembly never collide on id.
#[derive(Default)]
pub struct TransitionGenerator {
    counter: usize,
}

impl TransitionGenerator {
    pub fn new() -> Self {
        TransitionGenerator::default()
    }

    /// For every wall-graph node within `bottom_tolerance` of the wall's
    /// `v_min`, connects it to the nearest floor-graph node (in world XY)
    /// within `max_distance`, at `cost` each way.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_wall_to_floor_transitions(
        &mut self,
        graph: &mut MultiDomainGraph,
        wall: &RoutingDomain,
        floor: &RoutingDomain,
        placement: WallPlacement,
        bottom_tolerance: f64,
        max_distance: f64,
        cost: f64,
    ) -> Vec<TransitionEdge> {
        let wall_nodes = self.domain_node_locations(graph, &wall.id);
        let floor_nodes = self.domain_node_locations(graph, &floor.id);

        let bottom_nodes: Vec<(String, Point2D)> = wall_nodes
            .into_iter()
            .filter(|(_, loc)| (loc.v - wall.v_min).abs() < bottom_tolerance)
            .collect();

        let mut generated = Vec::new();

        for (wall_local, wall_loc) in bottom_nodes {
            let (world_x, world_y) = placement.world_xy_at_u(wall_loc.u);

            let mut closest: Option<(&String, f64, Point2D)> = None;
            for (floor_local, floor_loc) in &floor_nodes {
                let dist = (world_x - floor_loc.u).abs() + (world_y - floor_loc.v).abs();
                if closest.as_ref().map(|(_, d, _)| dist < *d).unwrap_or(true) {
                    closest = Some((floor_local, dist, *floor_loc));
                }
            }

            let Some((floor_local, dist, floor_loc)) = closest else {
                continue;
            };
            if dist >= max_distance {
                continue;
            }

            let id = format!("trans_w2f_{}", self.counter);
            self.counter += 1;

            let transition = TransitionEdge {
                id,
                kind: TransitionKind::WallToFloor,
                from_domain: wall.id.clone(),
                from_node: wall_local,
                from_loc: wall_loc,
                to_domain: floor.id.clone(),
                to_node: floor_local.clone(),
                to_loc: floor_loc,
                cost,
                bidirectional: true,
            };
            graph.queue_transition(transition.clone());
            generated.push(transition);
        }

        generated
    }

    /// Walls sharing a rounded world-XY endpoint generate a single
    /// transition between wall A's max-u end node and wall B's min-u start
    /// node.
    pub fn generate_wall_to_wall_corner_transitions(
        &mut self,
        graph: &mut MultiDomainGraph,
        wall_a: &RoutingDomain,
        wall_b: &RoutingDomain,
        cost: f64,
    ) -> Option<TransitionEdge> {
        let nodes_a = self.domain_node_locations(graph, &wall_a.id);
        let nodes_b = self.domain_node_locations(graph, &wall_b.id);

        let (end_a, loc_a) = nodes_a
            .into_iter()
            .max_by(|(_, a), (_, b)| a.u.partial_cmp(&b.u).unwrap())?;
        let (start_b, loc_b) = nodes_b
            .into_iter()
            .min_by(|(_, a), (_, b)| a.u.partial_cmp(&b.u).unwrap())?;

        let id = format!("trans_w2w_{}", self.counter);
        self.counter += 1;

        let transition = TransitionEdge {
            id,
            kind: TransitionKind::WallToWallCorner,
            from_domain: wall_a.id.clone(),
            from_node: end_a,
            from_loc: loc_a,
            to_domain: wall_b.id.clone(),
            to_node: start_b,
            to_loc: loc_b,
            cost,
            bidirectional: true,
        };
        graph.queue_transition(transition.clone());
        Some(transition)
    }

    fn domain_node_locations(&self, graph: &MultiDomainGraph, domain_id: &str) -> Vec<(String, Point2D)> {
        graph.node_locations_in_domain(domain_id)
    }
}

/// Groups walls by a rounded world-XY endpoint and generates one corner
/// transition for every pair sharing that point. T-junctions (a wall ending
/// partway along another) are not detected -- only shared endpoints are.
pub fn generate_corner_transitions(
    graph: &mut MultiDomainGraph,
    walls: &[(&RoutingDomain, WallPlacement)],
    cost: f64,
    rounding: f64,
) -> Vec<TransitionEdge> {
    let mut endpoint_groups: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let round_key = |p: (f64, f64)| -> (i64, i64) {
        (
            (p.0 / rounding).round() as i64,
            (p.1 / rounding).round() as i64,
        )
    };

    for (idx, (_, placement)) in walls.iter().enumerate() {
        endpoint_groups.entry(round_key(placement.start)).or_default().push(idx);
        endpoint_groups.entry(round_key(placement.end)).or_default().push(idx);
    }

    let mut generator = TransitionGenerator::new();
    let mut generated = Vec::new();

    for group in endpoint_groups.values() {
        if group.len() < 2 {
            continue;
        }
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let (wall_a, _) = walls[group[i]];
                let (wall_b, _) = walls[group[j]];
                if let Some(t) = generator.generate_wall_to_wall_corner_transitions(graph, wall_a, wall_b, cost) {
                    generated.push(t);
                }
            }
        }
    }

    generated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::route::SegmentDirection;

    fn wall_with_two_nodes(id: &str) -> RoutingDomain {
        RoutingDomain::new(id, crate::domain::DomainKind::WallCavity, 0.0, 4.0, 0.0, 8.0, 0.292)
    }

    #[test]
    fn wall_to_floor_connects_bottom_node_to_nearest_floor_node() {
        let wall = wall_with_two_nodes("wall_1");
        let floor = RoutingDomain::new("floor_0", crate::domain::DomainKind::FloorCavity, -5.0, 5.0, -5.0, 5.0, 0.75);

        let mut graph = MultiDomainGraph::new();
        graph.add_domain_edge(
            "wall_1",
            "n0",
            Point2D::new(2.0, 0.0),
            "n1",
            Point2D::new(2.0, 4.0),
            Edge::new(4.0, 1.0, SegmentDirection::Vertical),
        );
        graph.add_node("floor_0", "f0", Point2D::new(2.0, 0.0), false);

        let placement = WallPlacement { start: (0.0, 0.0), end: (4.0, 0.0) };
        let mut gen = TransitionGenerator::new();
        let transitions = gen.generate_wall_to_floor_transitions(&mut graph, &wall, &floor, placement, 0.5, 2.0, WALL_TO_FLOOR_COST);

        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to_node, "f0");
        graph.build_unified_graph();
        let neighbors = graph.neighbors("wall_1:n0");
        assert!(neighbors.iter().any(|(id, _)| id == "floor_0:f0"));
    }

    #[test]
    fn corner_transition_links_max_u_end_to_min_u_start() {
        let wall_a = wall_with_two_nodes("wall_a");
        let wall_b = wall_with_two_nodes("wall_b");

        let mut graph = MultiDomainGraph::new();
        graph.add_node("wall_a", "start", Point2D::new(0.0, 4.0), false);
        graph.add_node("wall_a", "end", Point2D::new(4.0, 4.0), false);
        graph.add_node("wall_b", "start", Point2D::new(0.0, 4.0), false);
        graph.add_node("wall_b", "end", Point2D::new(4.0, 4.0), false);

        let mut gen = TransitionGenerator::new();
        let transition = gen
            .generate_wall_to_wall_corner_transitions(&mut graph, &wall_a, &wall_b, WALL_TO_WALL_COST)
            .unwrap();

        assert_eq!(transition.from_node, "end");
        assert_eq!(transition.to_node, "start");
    }

    #[test]
    fn corner_grouping_only_links_walls_sharing_an_endpoint() {
        let wall_a = wall_with_two_nodes("wall_a");
        let wall_b = wall_with_two_nodes("wall_b");
        let wall_c = wall_with_two_nodes("wall_c");

        let mut graph = MultiDomainGraph::new();
        for (id, u) in [("wall_a", 0.0), ("wall_b", 0.0), ("wall_c", 0.0)] {
            graph.add_node(id, "start", Point2D::new(u, 0.0), false);
            graph.add_node(id, "end", Point2D::new(u + 4.0, 0.0), false);
        }

        let placement_a = WallPlacement { start: (0.0, 0.0), end: (4.0, 0.0) };
        let placement_b = WallPlacement { start: (4.0, 0.0), end: (8.0, 0.0) };
        let placement_c = WallPlacement { start: (20.0, 20.0), end: (24.0, 20.0) };

        let walls = [(&wall_a, placement_a), (&wall_b, placement_b), (&wall_c, placement_c)];
        let generated = generate_corner_transitions(&mut graph, &walls, WALL_TO_WALL_COST, 0.01);

        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].from_domain, "wall_a");
        assert_eq!(generated[0].to_domain, "wall_b");
    }
}
