//! A* search over the unified multi-domain graph, plus reconstruction of
//! the node-id path into a `Route`.
//!
//! The open set is a hand-rolled `BinaryHeap` rather than the `pathfinding`
//! crate's `astar()`: edge weights here are `f64` (not `Ord`), and the search
//! needs a monotonic tie-break counter plus an optional `blocked_nodes`
//! exclusion set that don't map onto that crate's closure API.

use crate::graph::MultiDomainGraph;
use crate::route::{Route, RouteSegment};
use fnv::{FnvHashMap, FnvHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Outcome of one `find_path_with_result` call.
#[derive(Clone, Debug, Default)]
pub struct PathResult {
    pub path: Vec<String>,
    pub total_cost: f64,
    pub visited_count: usize,
    pub success: bool,
    /// First-occurrence dedup of each node's domain along the path -- distinct
    /// from `Route::domains_crossed`'s consecutive dedup.
    pub domains_crossed: Vec<String>,
}

impl PathResult {
    fn failure(visited_count: usize) -> Self {
        PathResult {
            path: Vec::new(),
            total_cost: f64::INFINITY,
            visited_count,
            success: false,
            domains_crossed: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct OpenEntry {
    priority: f64,
    tie_break: u64,
    node: String,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.tie_break == other.tie_break
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    /// Reversed so `BinaryHeap` (a max-heap) pops the lowest `priority` first,
    /// breaking ties by the lowest (earliest-inserted) `tie_break`.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.tie_break.cmp(&self.tie_break))
    }
}

/// Manhattan-distance A* with an optional node-exclusion set, mirroring the
/// `heapq`-based open set it was ported from.
#[derive(Default)]
pub struct AStarPathfinder;

impl AStarPathfinder {
    pub fn new() -> Self {
        AStarPathfinder
    }

    pub fn find_path_with_result(
        &self,
        graph: &MultiDomainGraph,
        start: &str,
        goal: &str,
        blocked_nodes: Option<&FnvHashSet<String>>,
    ) -> PathResult {
        let is_blocked = |id: &str| blocked_nodes.map(|b| b.contains(id)).unwrap_or(false);

        if start == goal {
            return PathResult {
                path: vec![start.to_string()],
                total_cost: 0.0,
                visited_count: 1,
                success: true,
                domains_crossed: domain_of(start).into_iter().collect(),
            };
        }
        if is_blocked(start) || is_blocked(goal) {
            return PathResult::failure(0);
        }

        let goal_loc = graph.location_of(goal);
        let heuristic = |id: &str| -> f64 {
            match (graph.location_of(id), goal_loc) {
                (Some(a), Some(b)) => a.manhattan_distance_to(b),
                // Missing location data never invalidates admissibility, it just
                // degrades A* toward Dijkstra for that node.
                _ => 0.0,
            }
        };

        let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut counter: u64 = 0;
        let mut g_score: FnvHashMap<String, f64> = FnvHashMap::default();
        let mut came_from: FnvHashMap<String, String> = FnvHashMap::default();
        let mut closed: FnvHashSet<String> = FnvHashSet::default();
        let mut visited_count = 0usize;

        g_score.insert(start.to_string(), 0.0);
        open.push(OpenEntry {
            priority: heuristic(start),
            tie_break: counter,
            node: start.to_string(),
        });
        counter += 1;

        while let Some(current) = open.pop() {
            if closed.contains(&current.node) {
                continue;
            }
            visited_count += 1;

            if current.node == goal {
                let path = reconstruct_path(&came_from, &current.node);
                return PathResult {
                    total_cost: *g_score.get(&current.node).unwrap_or(&0.0),
                    domains_crossed: domains_crossed_for(&path),
                    path,
                    visited_count,
                    success: true,
                };
            }

            closed.insert(current.node.clone());
            let current_g = *g_score.get(&current.node).unwrap_or(&f64::INFINITY);

            for (neighbor, weight) in graph.neighbors(&current.node) {
                if closed.contains(&neighbor) || is_blocked(&neighbor) {
                    continue;
                }
                let tentative = current_g + weight;
                if tentative < *g_score.get(&neighbor).unwrap_or(&f64::INFINITY) {
                    g_score.insert(neighbor.clone(), tentative);
                    came_from.insert(neighbor.clone(), current.node.clone());
                    open.push(OpenEntry {
                        priority: tentative + heuristic(&neighbor),
                        tie_break: counter,
                        node: neighbor,
                    });
                    counter += 1;
                }
            }
        }

        PathResult::failure(visited_count)
    }
}

fn reconstruct_path(came_from: &FnvHashMap<String, String>, goal: &str) -> Vec<String> {
    let mut path = vec![goal.to_string()];
    let mut current = goal;
    while let Some(prev) = came_from.get(current) {
        path.push(prev.clone());
        current = prev;
    }
    path.reverse();
    path
}

fn domain_of(unified_id: &str) -> Option<String> {
    unified_id.split(':').next().map(|s| s.to_string())
}

fn domains_crossed_for(path: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for id in path {
        if let Some(d) = domain_of(id) {
            if !out.contains(&d) {
                out.push(d);
            }
        }
    }
    out
}

/// Turns a unified-graph node-id path into a `Route`, one segment per edge
/// traversed. Segments never span domains -- a crossed transition still
/// produces one segment per side, tagged with that side's `domain_id`.
pub fn reconstruct_route(
    graph: &MultiDomainGraph,
    path: &[String],
    route_id: impl Into<String>,
    system_type: impl Into<String>,
) -> Route {
    let mut route = Route::new(route_id, system_type);
    if path.is_empty() {
        return route;
    }

    route.source = graph.location_of(&path[0]);
    for window in path.windows(2) {
        let (from_id, to_id) = (&window[0], &window[1]);
        let (Some(from_loc), Some(to_loc)) = (graph.location_of(from_id), graph.location_of(to_id)) else {
            continue;
        };
        let domain_id = domain_of(from_id).unwrap_or_default();
        let mut segment = RouteSegment::new(from_loc, to_loc, domain_id);
        if let Some(edge) = graph.edge_between(from_id, to_id) {
            segment.cost = edge.weight;
            segment.crosses_obstacle = edge.crosses_stud || edge.crosses_joist || edge.crosses_plate;
            segment.obstacle_kind = if edge.crosses_stud {
                Some("stud".to_string())
            } else if edge.crosses_joist {
                Some("joist".to_string())
            } else if edge.crosses_plate {
                Some("plate".to_string())
            } else {
                None
            };
        }
        route.add_segment(segment);
    }
    route.target = graph.location_of(path.last().unwrap());

    route
}

/// The subset of `path` that crosses a cross-domain transition node, in
/// path order. Useful for reporting which corners/floor-drops a route used.
pub fn transition_nodes_on_path<'a>(graph: &MultiDomainGraph, path: &'a [String]) -> Vec<&'a str> {
    path.iter()
        .filter(|id| graph.node(id).map(|n| n.is_transition).unwrap_or(false))
        .map(|s| s.as_str())
        .collect()
}
