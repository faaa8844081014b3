//! Top-level assembly facade: turns a set of wall/floor `RoutingDomain`s plus
//! their world-space placements into a fully wired `MultiDomainGraph`, or a
//! ready-to-use `OAHSRouter`.
//!
//! Grounded on `graph_builder.py`'s `UnifiedGraphBuilder.build_from_walls`:
//! build each wall's lattice, the optional floor lattice, wall-to-floor
//! transitions per wall, wall-to-wall corner transitions between walls
//! sharing an endpoint, then flush the unified graph.

use crate::builders::{FloorGraphBuilder, WallGraphBuilder};
use crate::config::RouterConfig;
use crate::domain::RoutingDomain;
use crate::graph::transitions::{generate_corner_transitions, TransitionGenerator, WallPlacement};
use crate::graph::MultiDomainGraph;
use crate::heuristics::HeuristicRegistry;
use crate::occupancy::OccupancyMap;
use crate::orchestrator::OAHSRouter;

/// A wall cavity plus the world-XY placement of its two ends, used to project
/// its local `u` coordinate onto world space for corner and floor transitions.
#[derive(Clone)]
pub struct WallSpec {
    pub domain: RoutingDomain,
    pub placement: WallPlacement,
}

impl WallSpec {
    pub fn new(domain: RoutingDomain, placement: WallPlacement) -> Self {
        WallSpec { domain, placement }
    }
}

/// Assembles a unified `MultiDomainGraph` (and, via `build_router`, a ready
/// `OAHSRouter`) from raw wall/floor domains, following the grid resolutions
/// and transition costs in `config`.
pub struct RouterBuilder {
    config: RouterConfig,
}

impl RouterBuilder {
    pub fn new(config: RouterConfig) -> Self {
        RouterBuilder { config }
    }

    /// Builds each wall's grid lattice, the optional floor's grid lattice,
    /// wall-to-floor transitions for every wall, and wall-to-wall corner
    /// transitions for walls sharing a world-XY endpoint, then flushes the
    /// queued transitions into the unified graph.
    pub fn build_graph(
        &self,
        walls: &[WallSpec],
        floor: Option<&RoutingDomain>,
        occupancy: Option<&OccupancyMap>,
    ) -> MultiDomainGraph {
        let mut graph = MultiDomainGraph::new();

        for wall in walls {
            let mut builder = WallGraphBuilder::new(
                &wall.domain,
                self.config.grid_resolution_wall_u,
                self.config.grid_resolution_wall_v,
            );
            builder.build_grid_graph(&mut graph, occupancy);
        }

        if let Some(floor) = floor {
            let mut builder = FloorGraphBuilder::new(
                floor,
                self.config.grid_resolution_floor_x,
                self.config.grid_resolution_floor_y,
            );
            builder.build_grid_graph(&mut graph, occupancy);
        }

        if let Some(floor) = floor {
            let mut transition_gen = TransitionGenerator::new();
            for wall in walls {
                transition_gen.generate_wall_to_floor_transitions(
                    &mut graph,
                    &wall.domain,
                    floor,
                    wall.placement,
                    self.config.default_clearance.max(0.1),
                    self.config.grid_resolution_floor_x.max(self.config.grid_resolution_floor_y),
                    self.config.wall_to_floor_cost,
                );
            }
        }

        let wall_refs: Vec<(&RoutingDomain, WallPlacement)> =
            walls.iter().map(|w| (&w.domain, w.placement)).collect();
        generate_corner_transitions(&mut graph, &wall_refs, self.config.wall_to_wall_cost, 0.01);

        graph.build_unified_graph();
        graph
    }

    /// Builds the graph via `build_graph` (with a fresh, empty occupancy map)
    /// and wraps it in a ready `OAHSRouter` carrying the default heuristic
    /// registry and every supplied domain.
    pub fn build_router(&self, walls: &[WallSpec], floor: Option<&RoutingDomain>) -> OAHSRouter {
        let occupancy = OccupancyMap::new();
        let graph = self.build_graph(walls, floor, Some(&occupancy));

        let mut domains: Vec<RoutingDomain> = walls.iter().map(|w| w.domain.clone()).collect();
        if let Some(floor) = floor {
            domains.push(floor.clone());
        }

        OAHSRouter::new(graph, occupancy, HeuristicRegistry::default(), self.config.clone()).with_domains(domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainKind;

    fn wall(id: &str, length: f64) -> WallSpec {
        WallSpec::new(
            RoutingDomain::standard_wall(id, length, 8.0, 0.292, 1.333, 0.125, 0.125, true, true),
            WallPlacement { start: (0.0, 0.0), end: (length, 0.0) },
        )
    }

    #[test]
    fn build_graph_wires_a_single_wall_with_no_floor() {
        let builder = RouterBuilder::new(RouterConfig::default());
        let graph = builder.build_graph(&[wall("w1", 10.0)], None, None);
        assert!(graph.node_count() > 0);
        assert!(graph.edge_count() > 0);
    }

    #[test]
    fn build_graph_connects_wall_bottom_to_floor() {
        let builder = RouterBuilder::new(RouterConfig::default());
        let floor = RoutingDomain::new("floor_0", DomainKind::FloorCavity, -2.0, 12.0, -2.0, 12.0, 0.75);
        let graph = builder.build_graph(&[wall("w1", 10.0)], Some(&floor), None);

        let wall_bottom = graph
            .node_locations_in_domain("w1")
            .into_iter()
            .find(|(_, loc)| loc.v.abs() < 1e-9)
            .map(|(local, _)| graph.unified_id_of("w1", &local))
            .unwrap();
        let neighbors = graph.neighbors(&wall_bottom);
        assert!(neighbors.iter().any(|(id, _)| id.starts_with("floor_0:")));
    }

    #[test]
    fn build_graph_links_two_walls_sharing_a_corner() {
        let builder = RouterBuilder::new(RouterConfig::default());
        let wall_a = wall("w_a", 8.0);
        let mut wall_b = wall("w_b", 8.0);
        wall_b.placement = WallPlacement { start: (8.0, 0.0), end: (8.0, 8.0) };

        let graph = builder.build_graph(&[wall_a, wall_b], None, None);
        let corner = graph
            .node_locations_in_domain("w_a")
            .into_iter()
            .filter(|(_, loc)| (loc.u - 8.0).abs() < 1e-6)
            .map(|(local, _)| graph.unified_id_of("w_a", &local))
            .find_map(|id| {
                let neighbors = graph.neighbors(&id);
                neighbors.iter().any(|(n, _)| n.starts_with("w_b:")).then_some(id)
            });
        assert!(corner.is_some());
    }

    #[test]
    fn build_router_registers_every_domain_for_heuristic_lookup() {
        let builder = RouterBuilder::new(RouterConfig::default());
        let floor = RoutingDomain::new("floor_0", DomainKind::FloorCavity, -2.0, 12.0, -2.0, 12.0, 0.75);
        let router = builder.build_router(&[wall("w1", 10.0)], Some(&floor));
        assert!(router.graph().node_count() > 0);
        assert!(router.occupancy().get_segments("w1").is_empty());
    }
}
