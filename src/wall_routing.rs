//! Phase-2 in-wall routing: carries a fixture penetration from its entry
//! point on a wall cavity out to a top- or bottom-plate exit point, without
//! any cross-domain or cross-wall context. A secondary, narrower surface than
//! [`crate::orchestrator::OAHSRouter`] for callers that only need "does this
//! pipe clear this one wall cavity."
//!
//! Grounded on `wall_router.py`, which has no counterpart module in this
//! codebase's lineage -- the dataclasses, exit-point rules, and routing loop
//! below translate it directly into the crate's graph/pathfinder primitives.

use crate::config::RouterConfig;
use crate::domain::{DomainKind, Opening, RoutingDomain};
use crate::geometry::Point2D;
use crate::graph::MultiDomainGraph;
use crate::obstacle::{Obstacle, ObstacleKind};
use crate::pathfinder::astar::{reconstruct_route, AStarPathfinder};
use crate::route::Route;
use fnv::FnvHashMap;
use log::*;
use serde::{Deserialize, Serialize};

const EXIT_CLEARANCE: f64 = 0.042;
const EXIT_MARGIN: f64 = 0.05;

/// Vertical framing members, each with its own max penetration ratio.
const PENETRABLE_ELEMENT_TYPES: &[(&str, f64)] = &[
    ("stud", 0.4),
    ("king_stud", 0.4),
    ("trimmer", 0.4),
    ("sill_cripple", 0.4),
    ("header_cripple", 0.4),
    ("header", 0.25),
    ("sill_plate", 0.25),
];

const NON_PENETRABLE_ELEMENT_TYPES: &[&str] = &["top_plate", "bottom_plate"];

fn penetration_ratio_for(element_type: &str) -> Option<f64> {
    PENETRABLE_ELEMENT_TYPES
        .iter()
        .find(|(name, _)| *name == element_type)
        .map(|(_, ratio)| *ratio)
}

/// Which plate edge a route exits through.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitEdge {
    Top,
    Bottom,
}

impl ExitEdge {
    /// Sanitary and domestic water systems drop to the bottom plate; vent
    /// rises to the top. Anything else defaults to bottom, same as the
    /// unrecognized-system-type fallback.
    fn for_system(system_type: &str) -> Self {
        match system_type {
            "Vent" => ExitEdge::Top,
            _ => ExitEdge::Bottom,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ExitEdge::Top => "top",
            ExitEdge::Bottom => "bottom",
        }
    }
}

/// An exact framing element position, overriding the derived 16"-OC stud
/// layout when supplied.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FramingElement {
    pub id: String,
    pub element_type: String,
    pub profile_width: f64,
    pub u_coord: f64,
    pub v_start: f64,
    pub v_end: f64,
}

/// A wall's geometry and placement, independent of any `RoutingDomain`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WallData {
    pub wall_id: String,
    pub wall_length: f64,
    pub wall_height: f64,
    pub wall_thickness: f64,
    pub openings: Vec<Opening>,
    pub origin: (f64, f64, f64),
    pub x_axis: (f64, f64),
}

impl WallData {
    fn uv_to_world(&self, uv: (f64, f64)) -> (f64, f64, f64) {
        let (u, v) = uv;
        let world_x = self.origin.0 + self.x_axis.0 * u;
        let world_y = self.origin.1 + self.x_axis.1 * u;
        let world_z = self.origin.2 + v;
        (world_x, world_y, world_z)
    }
}

/// One fixture penetration awaiting in-wall routing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WallPenetration {
    pub connector_id: String,
    pub system_type: String,
    pub wall_id: String,
    pub wall_uv: (f64, f64),
    pub fixture_type: Option<String>,
    /// "wall" (default) routes in-wall; "floor" is passed through untouched
    /// in `route_all_walls`.
    pub target: String,
}

/// Where a route exits the wall cavity -- the handoff point for any
/// downstream wall-to-wall or wall-to-floor connector logic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WallExitPoint {
    pub wall_id: String,
    pub exit_edge: ExitEdge,
    pub wall_uv: (f64, f64),
    pub world_location: (f64, f64, f64),
    pub system_type: String,
    pub connector_id: String,
}

/// A single in-wall route from penetration to exit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WallRoute {
    pub connector_id: String,
    pub system_type: String,
    pub wall_id: String,
    pub entry_uv: (f64, f64),
    pub exit_uv: (f64, f64),
    pub exit_edge: ExitEdge,
    pub route: Route,
    pub stud_crossings: usize,
    pub fixture_type: Option<String>,
}

/// A penetration that could not be routed through the wall, with an
/// actionable reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnroutedPenetration {
    pub connector_id: String,
    pub system_type: String,
    pub wall_id: String,
    pub entry_uv: (f64, f64),
    pub reason: String,
}

/// Complete Phase-2 result: successfully routed penetrations, their exit
/// points, unrouted penetrations with guidance, and floor penetrations
/// passed through unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WallRoutingResult {
    pub wall_routes: Vec<WallRoute>,
    pub exit_points: Vec<WallExitPoint>,
    pub unrouted: Vec<UnroutedPenetration>,
    pub floor_passthroughs: Vec<WallPenetration>,
    pub status: String,
    pub needs: Vec<String>,
    pub obstacle_source: String,
}

impl WallRoutingResult {
    fn new() -> Self {
        WallRoutingResult {
            status: "ready".to_string(),
            obstacle_source: "derived".to_string(),
            ..Default::default()
        }
    }

    fn finalize_status(&mut self) {
        if !self.unrouted.is_empty() {
            self.status = "needs_input".to_string();
            for u in &self.unrouted {
                self.needs.push(format!("{} ({}) in wall {}: {}", u.connector_id, u.system_type, u.wall_id, u.reason));
            }
        }
    }
}

fn create_framing_obstacles(elements: &[FramingElement], wall_id: &str, wall_length: f64) -> Vec<Obstacle> {
    let mut obstacles = Vec::new();

    for elem in elements {
        if (elem.v_end - elem.v_start).abs() < 1e-6 {
            continue;
        }

        let is_plate = NON_PENETRABLE_ELEMENT_TYPES.contains(&elem.element_type.as_str());
        let (penetrable, max_pen) = if is_plate {
            (false, 0.0)
        } else {
            penetration_ratio_for(&elem.element_type).map(|r| (true, r)).unwrap_or((true, 0.4))
        };

        let (u_min, u_max) = if is_plate {
            (0.0, wall_length)
        } else {
            (elem.u_coord - elem.profile_width / 2.0, elem.u_coord + elem.profile_width / 2.0)
        };

        let kind = if is_plate { ObstacleKind::Plate } else { ObstacleKind::Stud };

        obstacles.push(Obstacle::new(
            format!("{wall_id}_frame_{}", elem.id),
            kind,
            u_min,
            elem.v_start,
            u_max,
            elem.v_end,
            penetrable,
            max_pen,
        ));
    }

    obstacles
}

/// Builds a wall's routing domain with progressive refinement: exact framing
/// positions when supplied, otherwise a derived 16"-OC stud layout. Openings
/// are applied in both modes. Returns the domain plus which path was taken
/// ("derived" or "framing").
pub fn create_wall_routing_domain(
    wall: &WallData,
    framing: Option<&[FramingElement]>,
    config: &RouterConfig,
) -> (RoutingDomain, String) {
    let (mut domain, obstacle_source) = match framing {
        Some(elements) => {
            let mut domain = RoutingDomain::new(
                wall.wall_id.clone(),
                DomainKind::WallCavity,
                0.0,
                wall.wall_length,
                0.0,
                wall.wall_height,
                wall.wall_thickness,
            );
            for obstacle in create_framing_obstacles(elements, &wall.wall_id, wall.wall_length) {
                domain.add_obstacle(obstacle);
            }
            (domain, "framing".to_string())
        }
        None => {
            let domain = RoutingDomain::standard_wall(
                wall.wall_id.clone(),
                wall.wall_length,
                wall.wall_height,
                wall.wall_thickness,
                config.stud_spacing,
                config.stud_width,
                config.plate_thickness,
                true,
                true,
            );
            (domain, "derived".to_string())
        }
    };

    for opening in &wall.openings {
        domain.add_opening(opening);
    }

    (domain, obstacle_source)
}

/// Picks the wall-UV exit point for a penetration: same U as the entry (a
/// straight vertical drop or rise), V placed just inside the preferred plate
/// zone with clearance, clamped to stay within the domain bounds.
fn select_exit_point(entry_uv: (f64, f64), system_type: &str, domain: &RoutingDomain, plate_thickness: f64) -> ((f64, f64), ExitEdge) {
    let exit_edge = ExitEdge::for_system(system_type);

    let exit_v = match exit_edge {
        ExitEdge::Top => domain.v_max - plate_thickness - EXIT_CLEARANCE,
        ExitEdge::Bottom => domain.v_min + plate_thickness + EXIT_CLEARANCE,
    };

    let exit_u = entry_uv.0.clamp(domain.u_min + EXIT_MARGIN, domain.u_max - EXIT_MARGIN);
    let exit_v = exit_v.clamp(domain.v_min + EXIT_MARGIN, domain.v_max - EXIT_MARGIN);

    ((exit_u, exit_v), exit_edge)
}

fn count_stud_crossings(route: &Route) -> usize {
    route.segments.iter().filter(|s| s.crosses_obstacle).count()
}

/// Routes every penetration assigned to one wall independently: builds the
/// wall's grid graph once, then runs entry-to-exit A* per penetration.
pub fn route_wall(
    wall_id: &str,
    penetrations: &[WallPenetration],
    wall: &WallData,
    framing: Option<&[FramingElement]>,
    config: &RouterConfig,
) -> WallRoutingResult {
    let mut result = WallRoutingResult::new();

    if penetrations.is_empty() {
        return result;
    }

    let (domain, obstacle_source) = create_wall_routing_domain(wall, framing, config);
    result.obstacle_source = obstacle_source;

    let mut graph = MultiDomainGraph::new();
    let mut builder =
        crate::builders::WallGraphBuilder::new(&domain, config.grid_resolution_wall_u, config.grid_resolution_wall_v);
    builder.build_grid_graph(&mut graph, None);

    let pathfinder = AStarPathfinder::new();

    for pen in penetrations {
        let (exit_uv, exit_edge) = select_exit_point(pen.wall_uv, &pen.system_type, &domain, config.plate_thickness);

        let source_ids = builder.add_terminal_nodes(&mut graph, &[pen.wall_uv]);
        let target_ids = builder.add_terminal_nodes(&mut graph, &[exit_uv]);

        if source_ids.is_empty() || target_ids.is_empty() {
            result.unrouted.push(UnroutedPenetration {
                connector_id: pen.connector_id.clone(),
                system_type: pen.system_type.clone(),
                wall_id: wall_id.to_string(),
                entry_uv: pen.wall_uv,
                reason: "Failed to add terminal nodes to graph".to_string(),
            });
            continue;
        }

        let start = graph.unified_id_of(wall_id, &source_ids[0]);
        let goal = graph.unified_id_of(wall_id, &target_ids[0]);
        let path_result = pathfinder.find_path_with_result(&graph, &start, &goal, None);

        if !path_result.success {
            result.unrouted.push(UnroutedPenetration {
                connector_id: pen.connector_id.clone(),
                system_type: pen.system_type.clone(),
                wall_id: wall_id.to_string(),
                entry_uv: pen.wall_uv,
                reason: format!(
                    "No path found to {} plate (visited {} nodes)",
                    exit_edge.as_str(),
                    path_result.visited_count
                ),
            });
            continue;
        }

        let route = reconstruct_route(&graph, &path_result.path, format!("wall_route_{}", pen.connector_id), pen.system_type.clone());
        let stud_crossings = count_stud_crossings(&route);

        debug!(
            "Routed {} in wall {}: entry=({:.2}, {:.2}) -> exit=({:.2}, {:.2}) {}, {} stud crossings, cost={:.2}",
            pen.connector_id,
            wall_id,
            pen.wall_uv.0,
            pen.wall_uv.1,
            exit_uv.0,
            exit_uv.1,
            exit_edge.as_str(),
            stud_crossings,
            route.total_cost,
        );

        result.wall_routes.push(WallRoute {
            connector_id: pen.connector_id.clone(),
            system_type: pen.system_type.clone(),
            wall_id: wall_id.to_string(),
            entry_uv: pen.wall_uv,
            exit_uv,
            exit_edge,
            route,
            stud_crossings,
            fixture_type: pen.fixture_type.clone(),
        });

        result.exit_points.push(WallExitPoint {
            wall_id: wall_id.to_string(),
            exit_edge,
            wall_uv: exit_uv,
            world_location: wall.uv_to_world(exit_uv),
            system_type: pen.system_type.clone(),
            connector_id: pen.connector_id.clone(),
        });
    }

    result.finalize_status();
    result
}

/// Groups penetrations by wall and routes each wall independently. Floor
/// penetrations (`target == "floor"`) are passed through unchanged, and a
/// penetration naming an unknown wall is reported unrouted rather than
/// silently dropped.
pub fn route_all_walls(
    penetrations: &[WallPenetration],
    walls: &[WallData],
    framing: &FnvHashMap<String, Vec<FramingElement>>,
    config: &RouterConfig,
) -> WallRoutingResult {
    let mut result = WallRoutingResult::new();

    if penetrations.is_empty() {
        warn!("No penetrations provided");
        return result;
    }
    if walls.is_empty() {
        warn!("No walls provided");
        result.status = "needs_input".to_string();
        result.needs.push("No walls provided".to_string());
        return result;
    }

    let wall_lookup: FnvHashMap<&str, &WallData> = walls.iter().map(|w| (w.wall_id.as_str(), w)).collect();

    let mut wall_penetrations: FnvHashMap<String, Vec<WallPenetration>> = FnvHashMap::default();
    for pen in penetrations {
        if pen.target == "floor" {
            result.floor_passthroughs.push(pen.clone());
            continue;
        }
        if !wall_lookup.contains_key(pen.wall_id.as_str()) {
            result.unrouted.push(UnroutedPenetration {
                connector_id: pen.connector_id.clone(),
                system_type: pen.system_type.clone(),
                wall_id: pen.wall_id.clone(),
                entry_uv: pen.wall_uv,
                reason: format!("Wall '{}' not found", pen.wall_id),
            });
            continue;
        }
        wall_penetrations.entry(pen.wall_id.clone()).or_default().push(pen.clone());
    }

    let mut obstacle_sources: Vec<String> = Vec::new();
    for (wall_id, pens) in &wall_penetrations {
        let wall = wall_lookup[wall_id.as_str()];
        let wall_framing = framing.get(wall_id).map(|v| v.as_slice());
        let wall_result = route_wall(wall_id, pens, wall, wall_framing, config);

        result.wall_routes.extend(wall_result.wall_routes);
        result.exit_points.extend(wall_result.exit_points);
        result.unrouted.extend(wall_result.unrouted);
        obstacle_sources.push(wall_result.obstacle_source);
    }

    let has_framing = obstacle_sources.iter().any(|s| s == "framing");
    let has_derived = obstacle_sources.iter().any(|s| s == "derived");
    result.obstacle_source = if has_framing && has_derived {
        "mixed".to_string()
    } else if has_framing {
        "framing".to_string()
    } else {
        "derived".to_string()
    };

    result.finalize_status();

    info!(
        "Phase 2 complete: {} wall routes, {} exit points, {} unrouted, {} floor passthroughs, obstacle_source={}",
        result.wall_routes.len(),
        result.exit_points.len(),
        result.unrouted.len(),
        result.floor_passthroughs.len(),
        result.obstacle_source,
    );

    result
}

/// Summary counters for a completed Phase-2 result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WallRoutingStats {
    pub total_wall_penetrations: usize,
    pub routed: usize,
    pub unrouted: usize,
    pub floor_passthroughs: usize,
    pub success_rate: f64,
    pub walls_routed: usize,
    pub routes_per_wall: FnvHashMap<String, usize>,
    pub systems_routed: FnvHashMap<String, usize>,
    pub exit_edges: FnvHashMap<String, usize>,
    pub obstacle_source: String,
    pub total_stud_crossings: Option<usize>,
    pub avg_stud_crossings: Option<f64>,
    pub avg_route_cost: Option<f64>,
    pub max_route_cost: Option<f64>,
}

pub fn generate_stats(result: &WallRoutingResult) -> WallRoutingStats {
    let mut wall_counts: FnvHashMap<String, usize> = FnvHashMap::default();
    let mut system_counts: FnvHashMap<String, usize> = FnvHashMap::default();
    let mut exit_edge_counts: FnvHashMap<String, usize> = FnvHashMap::default();
    let mut stud_crossings: Vec<usize> = Vec::new();
    let mut costs: Vec<f64> = Vec::new();

    for wr in &result.wall_routes {
        *wall_counts.entry(wr.wall_id.clone()).or_insert(0) += 1;
        *system_counts.entry(wr.system_type.clone()).or_insert(0) += 1;
        *exit_edge_counts.entry(wr.exit_edge.as_str().to_string()).or_insert(0) += 1;
        stud_crossings.push(wr.stud_crossings);
        costs.push(wr.route.total_cost);
    }

    let total = result.wall_routes.len() + result.unrouted.len();

    WallRoutingStats {
        total_wall_penetrations: total,
        routed: result.wall_routes.len(),
        unrouted: result.unrouted.len(),
        floor_passthroughs: result.floor_passthroughs.len(),
        success_rate: result.wall_routes.len() as f64 / total.max(1) as f64,
        walls_routed: wall_counts.len(),
        routes_per_wall: wall_counts,
        systems_routed: system_counts,
        exit_edges: exit_edge_counts,
        obstacle_source: result.obstacle_source.clone(),
        total_stud_crossings: (!stud_crossings.is_empty()).then(|| stud_crossings.iter().sum()),
        avg_stud_crossings: (!stud_crossings.is_empty())
            .then(|| stud_crossings.iter().sum::<usize>() as f64 / stud_crossings.len() as f64),
        avg_route_cost: (!costs.is_empty()).then(|| costs.iter().sum::<f64>() / costs.len() as f64),
        max_route_cost: costs.iter().cloned().fold(None, |acc, c| Some(acc.map_or(c, |a: f64| a.max(c)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> WallData {
        WallData {
            wall_id: "wall_1".into(),
            wall_length: 10.0,
            wall_height: 8.0,
            wall_thickness: 0.292,
            openings: Vec::new(),
            origin: (0.0, 0.0, 0.0),
            x_axis: (1.0, 0.0),
        }
    }

    fn penetration(id: &str, system_type: &str, uv: (f64, f64)) -> WallPenetration {
        WallPenetration {
            connector_id: id.into(),
            system_type: system_type.into(),
            wall_id: "wall_1".into(),
            wall_uv: uv,
            fixture_type: None,
            target: "wall".into(),
        }
    }

    #[test]
    fn sanitary_exits_bottom_vent_exits_top() {
        assert_eq!(ExitEdge::for_system("Sanitary"), ExitEdge::Bottom);
        assert_eq!(ExitEdge::for_system("Vent"), ExitEdge::Top);
        assert_eq!(ExitEdge::for_system("Unknown"), ExitEdge::Bottom);
    }

    #[test]
    fn route_wall_finds_a_path_from_entry_to_exit() {
        let config = RouterConfig::default();
        let wall = wall();
        let pens = vec![penetration("c1", "Sanitary", (3.0, 4.0))];
        let result = route_wall("wall_1", &pens, &wall, None, &config);
        assert_eq!(result.status, "ready");
        assert_eq!(result.wall_routes.len(), 1);
        assert_eq!(result.wall_routes[0].exit_edge, ExitEdge::Bottom);
        assert!(result.wall_routes[0].exit_uv.1 < result.wall_routes[0].entry_uv.1);
    }

    #[test]
    fn route_all_walls_routes_floor_penetrations_through_unchanged() {
        let config = RouterConfig::default();
        let walls = vec![wall()];
        let mut floor_pen = penetration("c2", "Sanitary", (1.0, 1.0));
        floor_pen.target = "floor".into();
        let pens = vec![penetration("c1", "Sanitary", (3.0, 4.0)), floor_pen];

        let result = route_all_walls(&pens, &walls, &FnvHashMap::default(), &config);
        assert_eq!(result.floor_passthroughs.len(), 1);
        assert_eq!(result.wall_routes.len(), 1);
        assert_eq!(result.obstacle_source, "derived");
    }

    #[test]
    fn unknown_wall_is_reported_unrouted_not_dropped() {
        let config = RouterConfig::default();
        let walls = vec![wall()];
        let mut pen = penetration("c1", "Sanitary", (3.0, 4.0));
        pen.wall_id = "missing_wall".into();
        let result = route_all_walls(&[pen], &walls, &FnvHashMap::default(), &config);
        assert_eq!(result.status, "needs_input");
        assert_eq!(result.unrouted.len(), 1);
    }

    #[test]
    fn generate_stats_computes_success_rate_and_averages() {
        let config = RouterConfig::default();
        let walls = vec![wall()];
        let pens = vec![penetration("c1", "Sanitary", (3.0, 4.0))];
        let result = route_all_walls(&pens, &walls, &FnvHashMap::default(), &config);
        let stats = generate_stats(&result);
        assert_eq!(stats.routed, 1);
        assert!((stats.success_rate - 1.0).abs() < 1e-9);
        assert!(stats.avg_route_cost.is_some());
    }
}
