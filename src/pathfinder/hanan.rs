//! Hanan-grid rectilinear Steiner tree construction: lay horizontal/vertical
//! lines through every terminal, compute a Kruskal MST over the resulting
//! lattice, then prune to the minimal tree actually needed to connect the
//! terminals.

use crate::geometry::Point2D;
use crate::obstacle::Obstacle;
use crate::route::{Route, RouteSegment, SegmentDirection};
use fnv::{FnvHashMap, FnvHashSet};
use std::collections::HashMap;

/// The lattice formed by drawing a horizontal and vertical line through
/// every terminal. Hanan's theorem guarantees an optimal rectilinear Steiner
/// tree uses only points from this grid.
#[derive(Clone, Debug, Default)]
pub struct HananGrid {
    pub terminals: Vec<(f64, f64)>,
    pub x_coords: Vec<f64>,
    pub y_coords: Vec<f64>,
    pub points: Vec<(f64, f64)>,
    point_to_idx: HashMap<(i64, i64), usize>,
    pub terminal_indices: Vec<usize>,
    pub blocked: FnvHashSet<usize>,
    pub high_cost: FnvHashMap<usize, f64>,
    tolerance: f64,
}

fn quantize(value: f64, tolerance: f64) -> i64 {
    (value / tolerance).round() as i64
}

impl HananGrid {
    pub fn from_terminals(terminals: &[(f64, f64)], obstacles: &[Obstacle], tolerance: f64) -> Self {
        if terminals.is_empty() {
            return HananGrid { tolerance, ..Default::default() };
        }

        let mut x_keys: FnvHashSet<i64> = FnvHashSet::default();
        let mut y_keys: FnvHashSet<i64> = FnvHashSet::default();
        for &(x, y) in terminals {
            x_keys.insert(quantize(x, tolerance));
            y_keys.insert(quantize(y, tolerance));
        }

        let mut x_coord_keys: Vec<i64> = x_keys.into_iter().collect();
        let mut y_coord_keys: Vec<i64> = y_keys.into_iter().collect();
        x_coord_keys.sort_unstable();
        y_coord_keys.sort_unstable();

        let x_coords: Vec<f64> = x_coord_keys.iter().map(|&k| k as f64 * tolerance).collect();
        let y_coords: Vec<f64> = y_coord_keys.iter().map(|&k| k as f64 * tolerance).collect();

        let mut points = Vec::with_capacity(x_coords.len() * y_coords.len());
        let mut point_to_idx = HashMap::new();
        for &y in &y_coords {
            for &x in &x_coords {
                let idx = points.len();
                points.push((x, y));
                point_to_idx.insert((quantize(x, tolerance), quantize(y, tolerance)), idx);
            }
        }

        let terminal_indices: Vec<usize> = terminals
            .iter()
            .filter_map(|&(tx, ty)| point_to_idx.get(&(quantize(tx, tolerance), quantize(ty, tolerance))).copied())
            .collect();

        let mut grid = HananGrid {
            terminals: terminals.to_vec(),
            x_coords,
            y_coords,
            points,
            point_to_idx,
            terminal_indices,
            blocked: FnvHashSet::default(),
            high_cost: FnvHashMap::default(),
            tolerance,
        };
        grid.mark_obstacles(obstacles);
        grid
    }

    fn mark_obstacles(&mut self, obstacles: &[Obstacle]) {
        for (idx, &(x, y)) in self.points.clone().iter().enumerate() {
            let p = Point2D::new(x, y);
            for obstacle in obstacles {
                if !obstacle.contains_point(p) {
                    continue;
                }
                if !obstacle.penetrable {
                    self.blocked.insert(idx);
                } else {
                    let current = self.high_cost.get(&idx).copied().unwrap_or(1.0);
                    self.high_cost.insert(idx, current.max(5.0));
                }
            }
        }
    }

    pub fn get_neighbors(&self, point_idx: usize) -> Vec<usize> {
        if point_idx >= self.points.len() {
            return Vec::new();
        }
        let (x, y) = self.points[point_idx];
        let xi = self.x_coords.iter().position(|&v| v == x);
        let yi = self.y_coords.iter().position(|&v| v == y);
        let (Some(xi), Some(yi)) = (xi, yi) else {
            return Vec::new();
        };

        let mut neighbors = Vec::with_capacity(4);
        if xi > 0 {
            if let Some(&idx) = self.point_to_idx.get(&(quantize(self.x_coords[xi - 1], self.tolerance), quantize(y, self.tolerance))) {
                neighbors.push(idx);
            }
        }
        if xi + 1 < self.x_coords.len() {
            if let Some(&idx) = self.point_to_idx.get(&(quantize(self.x_coords[xi + 1], self.tolerance), quantize(y, self.tolerance))) {
                neighbors.push(idx);
            }
        }
        if yi > 0 {
            if let Some(&idx) = self.point_to_idx.get(&(quantize(x, self.tolerance), quantize(self.y_coords[yi - 1], self.tolerance))) {
                neighbors.push(idx);
            }
        }
        if yi + 1 < self.y_coords.len() {
            if let Some(&idx) = self.point_to_idx.get(&(quantize(x, self.tolerance), quantize(self.y_coords[yi + 1], self.tolerance))) {
                neighbors.push(idx);
            }
        }
        neighbors
    }

    /// `f64::INFINITY` if either endpoint is blocked; otherwise Manhattan
    /// distance scaled by the higher of the two endpoints' penetration
    /// multipliers.
    pub fn get_edge_cost(&self, from_idx: usize, to_idx: usize) -> f64 {
        if self.blocked.contains(&from_idx) || self.blocked.contains(&to_idx) {
            return f64::INFINITY;
        }
        let (p1, p2) = (self.points[from_idx], self.points[to_idx]);
        let base_cost = (p1.0 - p2.0).abs() + (p1.1 - p2.1).abs();

        let mut multiplier = 1.0f64;
        if let Some(&c) = self.high_cost.get(&from_idx) {
            multiplier = multiplier.max(c);
        }
        if let Some(&c) = self.high_cost.get(&to_idx) {
            multiplier = multiplier.max(c);
        }
        base_cost * multiplier
    }

    /// Every undirected edge in the lattice with a finite cost, each counted once.
    pub fn get_all_edges(&self) -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::new();
        let mut seen: FnvHashSet<(usize, usize)> = FnvHashSet::default();

        for idx in 0..self.points.len() {
            for neighbor_idx in self.get_neighbors(idx) {
                let key = (idx.min(neighbor_idx), idx.max(neighbor_idx));
                if seen.contains(&key) {
                    continue;
                }
                seen.insert(key);
                let cost = self.get_edge_cost(idx, neighbor_idx);
                if cost.is_finite() {
                    edges.push((idx, neighbor_idx, cost));
                }
            }
        }
        edges
    }

    pub fn is_terminal(&self, point_idx: usize) -> bool {
        self.terminal_indices.contains(&point_idx)
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind { parent: (0..n).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) -> bool {
        let (mut root_x, root_y) = (self.find(x), self.find(y));
        if root_x == root_y {
            return false;
        }
        let mut root_y = root_y;
        if self.rank[root_x] < self.rank[root_y] {
            std::mem::swap(&mut root_x, &mut root_y);
        }
        self.parent[root_y] = root_x;
        if self.rank[root_x] == self.rank[root_y] {
            self.rank[root_x] += 1;
        }
        true
    }
}

/// Kruskal MST over a `HananGrid`, restricted to (and pruned down to) the
/// edges actually needed to connect a set of terminals.
pub struct HananMST<'a> {
    grid: &'a HananGrid,
}

impl<'a> HananMST<'a> {
    pub fn new(grid: &'a HananGrid) -> Self {
        HananMST { grid }
    }

    /// Kruskal's algorithm, stopping as soon as every terminal shares a
    /// component, then pruning non-terminal leaf "tails" left dangling by
    /// the early stop.
    pub fn compute_mst(&self, terminal_indices: Option<&[usize]>) -> Vec<(usize, usize, f64)> {
        let terminals: Vec<usize> = terminal_indices.map(|t| t.to_vec()).unwrap_or_else(|| self.grid.terminal_indices.clone());
        if terminals.len() < 2 {
            return Vec::new();
        }

        let mut all_edges = self.grid.get_all_edges();
        all_edges.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap());

        let mut uf = UnionFind::new(self.grid.points.len());
        let terminal_set: FnvHashSet<usize> = terminals.iter().copied().collect();
        let mut mst_edges = Vec::new();

        for (u, v, cost) in all_edges {
            if uf.find(u) != uf.find(v) {
                uf.union(u, v);
                mst_edges.push((u, v, cost));
                if all_terminals_connected(&mut uf, &terminal_set) {
                    break;
                }
            }
        }

        prune_unnecessary_edges(mst_edges, &terminal_set)
    }
}

fn all_terminals_connected(uf: &mut UnionFind, terminal_set: &FnvHashSet<usize>) -> bool {
    let mut terminals = terminal_set.iter().copied();
    let Some(first) = terminals.next() else {
        return true;
    };
    let first_root = uf.find(first);
    terminals.all(|t| uf.find(t) == first_root)
}

/// Strips non-terminal leaf "tails" the early-stopping Kruskal pass can leave
/// behind, iterating until no more leaves can be removed.
fn prune_unnecessary_edges(
    edges: Vec<(usize, usize, f64)>,
    terminal_set: &FnvHashSet<usize>,
) -> Vec<(usize, usize, f64)> {
    let mut adj: FnvHashMap<usize, Vec<(usize, f64)>> = FnvHashMap::default();
    for &(u, v, cost) in &edges {
        adj.entry(u).or_default().push((v, cost));
        adj.entry(v).or_default().push((u, cost));
    }

    let mut changed = true;
    while changed {
        changed = false;
        let leaf_nodes: Vec<usize> = adj
            .iter()
            .filter(|(node, neighbors)| !terminal_set.contains(*node) && neighbors.len() == 1)
            .map(|(&node, _)| node)
            .collect();
        for node in leaf_nodes {
            let Some(neighbors) = adj.get(&node).cloned() else { continue };
            if let Some(&(neighbor, _)) = neighbors.first() {
                if let Some(entry) = adj.get_mut(&neighbor) {
                    entry.retain(|&(n, _)| n != node);
                }
                adj.remove(&node);
                changed = true;
            }
        }
    }

    let mut pruned = Vec::new();
    let mut seen: FnvHashSet<(usize, usize)> = FnvHashSet::default();
    for (u, v, cost) in edges {
        if !adj.contains_key(&u) || !adj.contains_key(&v) {
            continue;
        }
        let key = (u.min(v), u.max(v));
        if seen.contains(&key) {
            continue;
        }
        let still_adjacent = adj.get(&u).map(|ns| ns.iter().any(|&(n, _)| n == v)).unwrap_or(false);
        if still_adjacent {
            pruned.push((u, v, cost));
            seen.insert(key);
        }
    }
    pruned
}

/// Converts a pruned MST into route segments, optionally first collapsing
/// collinear degree-2 Steiner points into a single straight edge.
pub struct SteinerTreeBuilder<'a> {
    grid: &'a HananGrid,
    mst_edges: Vec<(usize, usize, f64)>,
}

impl<'a> SteinerTreeBuilder<'a> {
    pub fn new(grid: &'a HananGrid, mst_edges: Vec<(usize, usize, f64)>) -> Self {
        SteinerTreeBuilder { grid, mst_edges }
    }

    fn adjacency(&self) -> FnvHashMap<usize, Vec<(usize, f64)>> {
        let mut adj: FnvHashMap<usize, Vec<(usize, f64)>> = FnvHashMap::default();
        for &(u, v, cost) in &self.mst_edges {
            adj.entry(u).or_default().push((v, cost));
            adj.entry(v).or_default().push((u, cost));
        }
        adj
    }

    /// Collapses every non-terminal, degree-2 node whose two neighbors share
    /// an axis with it (the path runs straight through) into one edge
    /// spanning both neighbors, repeating until no more such nodes remain.
    pub fn prune_steiner_points(mut self) -> Vec<(usize, usize, f64)> {
        loop {
            let adj = self.adjacency();
            let terminal_set: FnvHashSet<usize> = self.grid.terminal_indices.iter().copied().collect();

            let mut prunable = FnvHashSet::default();
            for (&node, neighbors) in &adj {
                if terminal_set.contains(&node) || neighbors.len() != 2 {
                    continue;
                }
                let p = self.grid.points[node];
                let p1 = self.grid.points[neighbors[0].0];
                let p2 = self.grid.points[neighbors[1].0];
                let same_x = (p.0 - p1.0).abs() < 1e-6 && (p.0 - p2.0).abs() < 1e-6;
                let same_y = (p.1 - p1.1).abs() < 1e-6 && (p.1 - p2.1).abs() < 1e-6;
                if same_x || same_y {
                    prunable.insert(node);
                }
            }

            if prunable.is_empty() {
                return self.mst_edges;
            }

            let mut new_edges: Vec<(usize, usize, f64)> = self
                .mst_edges
                .iter()
                .filter(|(u, v, _)| !prunable.contains(u) && !prunable.contains(v))
                .copied()
                .collect();

            for &node in &prunable {
                if let Some(neighbors) = adj.get(&node) {
                    if neighbors.len() == 2 {
                        let (n1, c1) = neighbors[0];
                        let (n2, c2) = neighbors[1];
                        new_edges.push((n1, n2, c1 + c2));
                    }
                }
            }

            self.mst_edges = new_edges;
        }
    }

    /// BFS from `source_idx` over the (pruned) tree, emitting one
    /// `RouteSegment` per edge traversed, directed away from the source.
    pub fn to_route_segments(&self, source_idx: usize, domain_id: &str) -> Vec<RouteSegment> {
        let adj = self.adjacency();
        if !adj.contains_key(&source_idx) {
            return Vec::new();
        }

        let terminal_set: FnvHashSet<usize> = self.grid.terminal_indices.iter().copied().collect();
        let mut segments = Vec::new();
        let mut visited: FnvHashSet<usize> = FnvHashSet::default();
        visited.insert(source_idx);
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(source_idx);

        while let Some(current) = queue.pop_front() {
            let current_pt = self.grid.points[current];
            let Some(neighbors) = adj.get(&current) else { continue };
            for &(neighbor_idx, cost) in neighbors {
                if visited.contains(&neighbor_idx) {
                    continue;
                }
                visited.insert(neighbor_idx);
                queue.push_back(neighbor_idx);

                let neighbor_pt = self.grid.points[neighbor_idx];
                let dx = (neighbor_pt.0 - current_pt.0).abs();
                let dy = (neighbor_pt.1 - current_pt.1).abs();
                let direction = if dx > dy { SegmentDirection::Horizontal } else { SegmentDirection::Vertical };

                let mut segment = RouteSegment::new(
                    Point2D::new(current_pt.0, current_pt.1),
                    Point2D::new(neighbor_pt.0, neighbor_pt.1),
                    domain_id,
                );
                segment.direction = direction;
                segment.cost = cost;
                segment.is_steiner = !terminal_set.contains(&neighbor_idx);
                segments.push(segment);
            }
        }

        segments
    }

    pub fn get_steiner_points(&self) -> Vec<(f64, f64)> {
        let terminal_set: FnvHashSet<usize> = self.grid.terminal_indices.iter().copied().collect();
        let mut tree_nodes: FnvHashSet<usize> = FnvHashSet::default();
        for &(u, v, _) in &self.mst_edges {
            tree_nodes.insert(u);
            tree_nodes.insert(v);
        }
        tree_nodes
            .into_iter()
            .filter(|n| !terminal_set.contains(n))
            .map(|n| self.grid.points[n])
            .collect()
    }

    pub fn to_route(
        &self,
        route_id: impl Into<String>,
        system_type: impl Into<String>,
        source_idx: usize,
        domain_id: &str,
    ) -> Route {
        let mut route = Route::new(route_id, system_type);
        route.source = self.grid.points.get(source_idx).map(|&(x, y)| Point2D::new(x, y));
        for segment in self.to_route_segments(source_idx, domain_id) {
            route.target = Some(segment.end);
            route.add_segment(segment);
        }
        if route.segments.is_empty() {
            route.target = route.source;
        }
        route
    }
}

/// Builds a grid from `terminals`, computes its MST, and (by default) prunes
/// collinear Steiner points -- the one-call entry point most callers want.
pub fn compute_hanan_mst(
    terminals: &[(f64, f64)],
    obstacles: &[Obstacle],
    prune: bool,
    tolerance: f64,
) -> (HananGrid, Vec<(usize, usize, f64)>) {
    let grid = HananGrid::from_terminals(terminals, obstacles, tolerance);
    let mst = HananMST::new(&grid);
    let mut edges = mst.compute_mst(None);

    if prune && !edges.is_empty() {
        let builder = SteinerTreeBuilder::new(&grid, edges);
        edges = builder.prune_steiner_points();
    }

    (grid, edges)
}
