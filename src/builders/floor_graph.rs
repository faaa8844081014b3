//! Floor-cavity routing graph builder: a 2D lattice in XY with joist
//! crossing costs, distinguishing solid joists from web-truss joists and
//! supporting web-opening-zone cost reduction after the fact.

use crate::domain::RoutingDomain;
use crate::geometry::Point2D;
use crate::graph::{Edge, MultiDomainGraph};
use crate::obstacle::ObstacleKind;
use crate::occupancy::OccupancyMap;
use crate::route::SegmentDirection;
use fnv::FnvHashMap;

pub const DEFAULT_RESOLUTION: f64 = 1.0;
pub const JOIST_PENETRATION_COST: f64 = 3.0;
pub const SOLID_JOIST_COST: f64 = 8.0;

/// A zone (in the floor's XY bounds) where a joist's web is open, making
/// penetration markedly cheaper than the surrounding solid web.
pub struct WebOpeningZone {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

pub struct FloorGraphBuilder<'a> {
    domain: &'a RoutingDomain,
    resolution_x: f64,
    resolution_y: f64,
    grid_lookup: FnvHashMap<(i64, i64), String>,
}

impl<'a> FloorGraphBuilder<'a> {
    pub fn new(domain: &'a RoutingDomain, resolution_x: f64, resolution_y: f64) -> Self {
        FloorGraphBuilder {
            domain,
            resolution_x,
            resolution_y,
            grid_lookup: FnvHashMap::default(),
        }
    }

    pub fn build_grid_graph(&mut self, graph: &mut MultiDomainGraph, occupancy: Option<&OccupancyMap>) {
        self.grid_lookup.clear();

        let (min_x, max_x, min_y, max_y) = (self.domain.u_min, self.domain.u_max, self.domain.v_min, self.domain.v_max);
        let num_x = (((max_x - min_x) / self.resolution_x) as i64 + 1).max(2);
        let num_y = (((max_y - min_y) / self.resolution_y) as i64 + 1).max(2);

        for i in 0..num_x {
            for j in 0..num_y {
                let x = (min_x + i as f64 * self.resolution_x).min(max_x);
                let y = (min_y + j as f64 * self.resolution_y).min(max_y);

                if let Some(occ) = occupancy {
                    if !self.check_node_available(occ, (x, y)) {
                        continue;
                    }
                }

                let local_id = format!("n{i}_{j}");
                graph.add_node(&self.domain.id, &local_id, Point2D::new(x, y), false);
                self.grid_lookup.insert((i, j), local_id);
            }
        }

        for i in 0..num_x {
            for j in 0..num_y {
                let Some(local_id) = self.grid_lookup.get(&(i, j)).cloned() else {
                    continue;
                };
                let loc = Point2D::new(
                    (min_x + i as f64 * self.resolution_x).min(max_x),
                    (min_y + j as f64 * self.resolution_y).min(max_y),
                );

                if let Some(right_id) = self.grid_lookup.get(&(i + 1, j)).cloned() {
                    let right_loc = Point2D::new((min_x + (i + 1) as f64 * self.resolution_x).min(max_x), loc.v);
                    self.add_edge(graph, &local_id, loc, &right_id, right_loc, SegmentDirection::Horizontal);
                }
                if let Some(up_id) = self.grid_lookup.get(&(i, j + 1)).cloned() {
                    let up_loc = Point2D::new(loc.u, (min_y + (j + 1) as f64 * self.resolution_y).min(max_y));
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
        let mut crosses_joist = false;
        let mut blocked = false;

        for obstacle in &self.domain.obstacles {
            if obstacle.kind != ObstacleKind::Joist || !obstacle.intersects_segment(loc_a, loc_b) {
                continue;
            }
            if !obstacle.penetrable {
                blocked = true;
                continue;
            }
            crosses_joist = true;
            if obstacle.max_penetration_ratio > 0.5 {
                multiplier = multiplier.max(JOIST_PENETRATION_COST);
            } else {
                multiplier = multiplier.max(SOLID_JOIST_COST);
            }
        }

        if blocked {
            return;
        }

        let mut edge = Edge::new(base_cost, multiplier, direction);
        edge.crosses_joist = crosses_joist;
        graph.add_domain_edge(&self.domain.id, local_a, loc_a, local_b, loc_b, edge);
    }

    pub fn add_terminal_nodes(&self, graph: &mut MultiDomainGraph, terminals: &[(f64, f64)]) -> Vec<String> {
        terminals
            .iter()
            .enumerate()
            .map(|(idx, &(x, y))| {
                let local_id = format!("terminal_{idx}");
                let loc = Point2D::new(x, y);
                graph.add_node(&self.domain.id, &local_id, loc, true);
                self.connect_to_grid(graph, &local_id, loc);
                local_id
            })
            .collect()
    }

    fn connect_to_grid(&self, graph: &mut MultiDomainGraph, terminal_id: &str, loc: Point2D) {
        let i = ((loc.u - self.domain.u_min) / self.resolution_x) as i64;
        let j = ((loc.v - self.domain.v_min) / self.resolution_y) as i64;

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

    /// Marks each zone's joist-crossing edges as cheap (`base_cost * 1.5`
    /// instead of the full solid/web multiplier) to reflect an open web.
    pub fn add_web_opening_zones(&self, graph: &mut MultiDomainGraph, zones: &[WebOpeningZone]) {
        for zone in zones {
            graph.reduce_crossing_cost_in_zone(&self.domain.id, zone.x_min, zone.x_max, zone.y_min, zone.y_max, 1.5);
        }
    }

    fn check_node_available(&self, occupancy: &OccupancyMap, location: (f64, f64)) -> bool {
        let point = Point2D::new(location.0, location.1);
        occupancy.get_segments(&self.domain.id).iter().all(|seg| {
            point_to_segment_distance(point, seg.start, seg.end) >= seg.diameter / 2.0 + 0.1
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
