//! The unified multi-domain graph: one `petgraph` graph assembled from
//! per-domain subgraphs plus transition edges, serving as the A* substrate.

pub mod transitions;

use crate::geometry::Point2D;
use crate::route::SegmentDirection;
use fnv::FnvHashMap;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::Directed;
use serde::{Deserialize, Serialize};

/// A node in the unified graph: a point within exactly one domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub domain_id: String,
    pub loc: Point2D,
    pub is_terminal: bool,
    pub is_transition: bool,
    pub connected_transitions: Vec<String>,
}

/// A within-domain edge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub weight: f64,
    pub base_cost: f64,
    pub direction: SegmentDirection,
    pub crosses_stud: bool,
    pub crosses_joist: bool,
    pub crosses_plate: bool,
}

impl Edge {
    pub fn new(base_cost: f64, multiplier: f64, direction: SegmentDirection) -> Self {
        Edge {
            weight: base_cost * multiplier,
            base_cost,
            direction,
            crosses_stud: false,
            crosses_joist: false,
            crosses_plate: false,
        }
    }

    pub fn transition(cost: f64) -> Self {
        Edge {
            weight: cost,
            base_cost: cost,
            direction: SegmentDirection::Horizontal,
            crosses_stud: false,
            crosses_joist: false,
            crosses_plate: false,
        }
    }
}

/// A cross-domain connection produced by the transition generator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionEdge {
    pub id: String,
    pub kind: TransitionKind,
    pub from_domain: String,
    pub from_node: String,
    pub from_loc: Point2D,
    pub to_domain: String,
    pub to_node: String,
    pub to_loc: Point2D,
    pub cost: f64,
    pub bidirectional: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    WallToFloor,
    WallToWallCorner,
    FloorToCeiling,
}

fn unified_id(domain_id: &str, local_id: &str) -> String {
    format!("{domain_id}:{local_id}")
}

/// Assembles per-domain subgraphs and transition edges into one graph.
#[derive(Default)]
pub struct MultiDomainGraph {
    graph: Graph<GraphNode, Edge, Directed>,
    node_index: FnvHashMap<String, NodeIndex>,
    pending_transitions: Vec<TransitionEdge>,
    dirty: bool,
}

impl MultiDomainGraph {
    pub fn new() -> Self {
        MultiDomainGraph::default()
    }

    /// Adds (or returns the existing) node for `(domain_id, local_id)`.
    pub fn add_node(&mut self, domain_id: &str, local_id: &str, loc: Point2D, is_terminal: bool) -> NodeIndex {
        let uid = unified_id(domain_id, local_id);
        if let Some(&idx) = self.node_index.get(&uid) {
            return idx;
        }
        let node = GraphNode {
            id: uid.clone(),
            domain_id: domain_id.to_string(),
            loc,
            is_terminal,
            is_transition: false,
            connected_transitions: Vec::new(),
        };
        let idx = self.graph.add_node(node);
        self.node_index.insert(uid, idx);
        idx
    }

    /// Adds a bidirectional within-domain edge between two already-known (or
    /// newly created) local nodes.
    pub fn add_domain_edge(
        &mut self,
        domain_id: &str,
        local_a: &str,
        loc_a: Point2D,
        local_b: &str,
        loc_b: Point2D,
        edge: Edge,
    ) {
        let a = self.add_node(domain_id, local_a, loc_a, false);
        let b = self.add_node(domain_id, local_b, loc_b, false);
        self.graph.add_edge(a, b, edge.clone());
        self.graph.add_edge(b, a, edge);
    }

    /// Adds an exact-location terminal node and wires it directly to the
    /// `k` nearest already-present nodes in `domain_id` (by Manhattan
    /// distance), each at a Manhattan-weight edge. Mirrors what
    /// `WallGraphBuilder`/`FloorGraphBuilder::add_terminal_nodes` do against
    /// their own grid lattice, generalized to work from the unified graph's
    /// own node index alone -- the orchestrator calls this per-connector and
    /// per-target without needing to know either domain's grid resolution.
    /// A no-op beyond the node insertion if the domain has no other nodes
    /// yet (returns the lone terminal, unconnected).
    pub fn connect_terminal(&mut self, domain_id: &str, local_id: &str, loc: Point2D, k: usize) -> String {
        self.add_node(domain_id, local_id, loc, true);

        let mut candidates = self.node_locations_in_domain(domain_id);
        candidates.retain(|(other_local, _)| other_local != local_id);
        candidates.sort_by(|(_, a), (_, b)| {
            let da = (a.u - loc.u).abs() + (a.v - loc.v).abs();
            let db = (b.u - loc.u).abs() + (b.v - loc.v).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

        for (other_local, other_loc) in candidates.into_iter().take(k) {
            let distance = loc.manhattan_distance_to(other_loc);
            self.add_domain_edge(
                domain_id,
                local_id,
                loc,
                &other_local,
                other_loc,
                Edge::new(distance, 1.0, SegmentDirection::infer(loc, other_loc)),
            );
        }

        unified_id(domain_id, local_id)
    }

    pub fn node_index_of(&self, domain_id: &str, local_id: &str) -> Option<NodeIndex> {
        self.node_index.get(&unified_id(domain_id, local_id)).copied()
    }

    pub fn unified_id_of(&self, domain_id: &str, local_id: &str) -> String {
        unified_id(domain_id, local_id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn location_of(&self, id: &str) -> Option<Point2D> {
        self.node(id).map(|n| n.loc)
    }

    /// Queues a transition for the next `build_unified_graph()` call. Setting
    /// the dirty flag here (rather than inserting eagerly) is what makes the
    /// unified graph "lazy": callers can queue many transitions and pay the
    /// assembly cost once.
    pub fn queue_transition(&mut self, transition: TransitionEdge) {
        self.pending_transitions.push(transition);
        self.dirty = true;
    }

    pub fn mark_stale(&mut self) {
        self.dirty = true;
    }

    /// Flushes any queued transitions into the graph. A no-op when nothing
    /// is pending. Callers may invoke this directly, or simply call
    /// `find_path`, which does so implicitly.
    pub fn build_unified_graph(&mut self) {
        if !self.dirty {
            return;
        }
        for t in self.pending_transitions.drain(..) {
            let from = self.node_index.get(&unified_id(&t.from_domain, &t.from_node)).copied();
            let to = self.node_index.get(&unified_id(&t.to_domain, &t.to_node)).copied();
            if let (Some(from_idx), Some(to_idx)) = (from, to) {
                self.graph.add_edge(from_idx, to_idx, Edge::transition(t.cost));
                if t.bidirectional {
                    self.graph.add_edge(to_idx, from_idx, Edge::transition(t.cost));
                }
                if let Some(node) = self.graph.node_weight_mut(from_idx) {
                    node.is_transition = true;
                    node.connected_transitions.push(t.id.clone());
                }
                if let Some(node) = self.graph.node_weight_mut(to_idx) {
                    node.is_transition = true;
                    node.connected_transitions.push(t.id.clone());
                }
            }
        }
        self.dirty = false;
    }

    /// Neighbor `(unified_id, edge_weight)` pairs for `id`, via petgraph's
    /// adjacency. Infinite-weight edges are never inserted in the first
    /// place (builders omit them), so every edge here is traversable.
    pub fn neighbors(&self, id: &str) -> Vec<(String, f64)> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .map(|e| (self.graph[e.target()].id.clone(), e.weight().weight))
            .collect()
    }

    /// The edge directly connecting `from` to `to`, if any -- used by path
    /// reconstruction to recover per-hop cost and obstacle-crossing metadata
    /// that `neighbors()`'s flattened `(id, weight)` pairs discard.
    pub fn edge_between(&self, from: &str, to: &str) -> Option<&Edge> {
        let &from_idx = self.node_index.get(from)?;
        let &to_idx = self.node_index.get(to)?;
        self.graph
            .edges(from_idx)
            .find(|e| e.target() == to_idx)
            .map(|e| e.weight())
    }

    /// Every `(local_id, location)` pair currently in `domain_id`, used by
    /// the transition generator to find candidate endpoints without
    /// reaching into petgraph internals.
    pub fn node_locations_in_domain(&self, domain_id: &str) -> Vec<(String, Point2D)> {
        self.graph
            .node_indices()
            .filter_map(|idx| {
                let node = &self.graph[idx];
                if node.domain_id == domain_id {
                    let local_id = node.id.strip_prefix(&format!("{domain_id}:"))?.to_string();
                    Some((local_id, node.loc))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Applies `multiplier` to the base cost of every joist-crossing edge in
    /// `domain_id` whose midpoint falls inside `[u_min, u_max] x [v_min,
    /// v_max]` -- used to mark web-opening zones as preferred penetration
    /// paths after the floor lattice has already been built.
    pub fn reduce_crossing_cost_in_zone(
        &mut self,
        domain_id: &str,
        u_min: f64,
        u_max: f64,
        v_min: f64,
        v_max: f64,
        multiplier: f64,
    ) {
        let edge_indices: Vec<_> = self.graph.edge_indices().collect();
        for e in edge_indices {
            let Some((a, b)) = self.graph.edge_endpoints(e) else {
                continue;
            };
            let (node_a, node_b) = (&self.graph[a], &self.graph[b]);
            if node_a.domain_id != domain_id || node_b.domain_id != domain_id {
                continue;
            }
            let mid_u = (node_a.loc.u + node_b.loc.u) / 2.0;
            let mid_v = (node_a.loc.v + node_b.loc.v) / 2.0;
            if mid_u < u_min || mid_u > u_max || mid_v < v_min || mid_v > v_max {
                continue;
            }
            if let Some(edge) = self.graph.edge_weight_mut(e) {
                if edge.crosses_joist {
                    edge.weight = edge.base_cost * multiplier;
                }
            }
        }
    }
}
