//! Wall-cavity routing graph builder: a 2D lattice in UV coordinates (U
//! along the wall's length, V vertical) with stud/plate crossing costs.

use crate::domain::RoutingDomain;
use crate::geometry::Point2D;
use crate::graph::{Edge, MultiDomainGraph};
use crate::obstacle::ObstacleKind;
use crate::occupancy::OccupancyMap;
use crate::route::SegmentDirection;
use fnv::FnvHashMap;

pub const DEFAULT_RESOLUTION_U: f64 = 0.333;
pub const DEFAULT_RESOLUTION_V: f64 = 0.5;
pub const STUD_PENETRATION_COST: f64 = 5.0;

/// Builds the wall-cavity grid lattice for one `RoutingDomain` directly into
/// a shared `MultiDomainGraph`.
pub struct WallGraphBuilder<'a> {
    domain: &'a RoutingDomain,
    resolution_u: f64,
    resolution_v: f64,
    grid_lookup: FnvHashMap<(i64, i64), String>,
}

impl<'a> WallGraphBuilder<'a> {
    pub fn new(domain: &'a RoutingDomain, resolution_u: f64, resolution_v: f64) -> Self {
        WallGraphBuilder {
            domain,
            resolution_u,
            resolution_v,
            grid_lookup: FnvHashMap::default(),
        }
    }

    /// Lays out grid nodes at `resolution_u` x `resolution_v` spacing, then
    /// connects each to its right and upward neighbor with a cost-weighted
    /// edge. A node whose location collides with an existing occupied
    /// segment is skipped entirely, along with any edge that would have
    /// touched it.
    pub fn build_grid_graph(&mut self, graph: &mut MultiDomainGraph, occupancy: Option<&OccupancyMap>) {
        self.grid_lookup.clear();

        let (min_u, max_u, min_v, max_v) = (self.domain.u_min, self.domain.u_max, self.domain.v_min, self.domain.v_max);
        let num_u = (((max_u - min_u) / self.resolution_u) as i64 + 1).max(2);
        let num_v = (((max_v - min_v) / self.resolution_v) as i64 + 1).max(2);

        for i in 0..num_u {
            for j in 0..num_v {
                let u = (min_u + i as f64 * self.resolution_u).min(max_u);
                let v = (min_v + j as f64 * self.resolution_v).min(max_v);

                if let Some(occ) = occupancy {
                    if !self.check_node_available(occ, (u, v)) {
                        continue;
                    }
                }

                let local_id = format!("n{i}_{j}");
                graph.add_node(&self.domain.id, &local_id, Point2D::new(u, v), false);
                self.grid_lookup.insert((i, j), local_id);
            }
        }

        for i in 0..num_u {
            for j in 0..num_v {
                let Some(local_id) = self.grid_lookup.get(&(i, j)).cloned() else {
                    continue;
                };
                let loc = Point2D::new(
                    (min_u + i as f64 * self.resolution_u).min(max_u),
                    (min_v + j as f64 * self.resolution_v).min(max_v),
                );

                if let Some(right_id) = self.grid_lookup.get(&(i + 1, j)).cloned() {
                    let right_loc = Point2D::new(
                        (min_u + (i + 1) as f64 * self.resolution_u).min(max_u),
                        loc.v,
                    );
                    self.add_edge(graph, &local_id, loc, &right_id, right_loc, SegmentDirection::Horizontal);
                }
                if let Some(up_id) = self.grid_lookup.get(&(i, j + 1)).cloned() {
                    let up_loc = Point2D::new(loc.u, (min_v + (j + 1) as f64 * self.resolution_v).min(max_v));
                    self.add_edge(graph, &local_id, loc, &up_id, up_loc, SegmentDirection::Vertical);
                }
            }
        }
    }

    fn add_edge(
        &self,
        graph: &mut MultiDomainGraph,
        local_a: &str,
        loc_a: Point2D,
        local_b: &str,
        loc_b: Point2D,
        direction: SegmentDirection,
    ) {
        let base_cost = loc_a.manhattan_distance_to(loc_b);

        let mut multiplier = 1.0f64;
        let mut crosses_stud = false;
        let mut crosses_plate = false;
        let mut blocked = false;

        for obstacle in &self.domain.obstacles {
            if !obstacle.intersects_segment(loc_a, loc_b) {
                continue;
            }
            match obstacle.kind {
                ObstacleKind::Stud => {
                    if obstacle.penetrable {
                        multiplier = multiplier.max(STUD_PENETRATION_COST);
                        crosses_stud = true;
                    } else {
                        blocked = true;
                    }
                }
                ObstacleKind::Plate => {
                    if !obstacle.penetrable {
                        blocked = true;
                        crosses_plate = true;
                    }
                }
                _ => {
                    if !obstacle.penetrable {
                        blocked = true;
                    } else {
                        multiplier = multiplier.max(STUD_PENETRATION_COST);
                    }
                }
            }
        }

        if blocked {
            return;
        }

        let mut edge = Edge::new(base_cost, multiplier, direction);
        edge.crosses_stud = crosses_stud;
        edge.crosses_plate = crosses_plate;
        graph.add_domain_edge(&self.domain.id, local_a, loc_a, local_b, loc_b, edge);
    }

    /// Adds one node per terminal, connected to the up-to-four grid nodes
    /// surrounding its containing cell. Returns the local ids created, in
    /// the same order as `terminals`.
    pub fn add_terminal_nodes(&self, graph: &mut MultiDomainGraph, terminals: &[(f64, f64)]) -> Vec<String> {
        terminals
            .iter()
            .enumerate()
            .map(|(idx, &(u, v))| {
                let local_id = format!("terminal_{idx}");
                let loc = Point2D::new(u, v);
                graph.add_node(&self.domain.id, &local_id, loc, true);
                self.connect_to_grid(graph, &local_id, loc);
                local_id
            })
            .collect()
    }

    fn connect_to_grid(&self, graph: &mut MultiDomainGraph, terminal_id: &str, loc: Point2D) {
        let i = ((loc.u - self.domain.u_min) / self.resolution_u) as i64;
        let j = ((loc.v - self.domain.v_min) / self.resolution_v) as i64;

        for di in 0..2 {
            for dj in 0..2 {
                let Some(grid_id) = self.grid_lookup.get(&(i + di, j + dj)) else {
                    continue;
                };
                let Some(grid_loc) = graph.location_of(&graph.unified_id_of(&self.domain.id, grid_id)) else {
                    continue;
                };
                let distance = loc.manhattan_distance_to(grid_loc);
                graph.add_domain_edge(
                    &self.domain.id,
                    terminal_id,
                    loc,
                    grid_id,
                    grid_loc,
                    Edge::new(distance, 1.0, SegmentDirection::infer(loc, grid_loc)),
                );
            }
        }
    }

    /// A candidate node location is available only if no existing occupied
    /// segment passes within `diameter / 2 + 0.05` ft of it.
    fn check_node_available(&self, occupancy: &OccupancyMap, location: (f64, f64)) -> bool {
        let point = Point2D::new(location.0, location.1);
        occupancy.get_segments(&self.domain.id).iter().all(|seg| {
            point_to_segment_distance(point, seg.start, seg.end) >= seg.diameter / 2.0 + 0.05
        })
    }
}

fn point_to_segment_distance(p: Point2D, s1: Point2D, s2: Point2D) -> f64 {
    let dx = s2.u - s1.u;
    let dy = s2.v - s1.v;
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-10 {
        return p.distance_to(s1);
    }
    let t = (((p.u - s1.u) * dx + (p.v - s1.v) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = Point2D::new(s1.u + t * dx, s1.v + t * dy);
    p.distance_to(closest)
}
