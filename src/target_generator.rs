//! Orchestrates the per-system heuristics to find and rank routing targets
//! for connectors, plus standalone wet-wall detection and target synthesis
//! from wall/connector data.

use crate::connector::ConnectorInfo;
use crate::domain::RoutingDomain;
use crate::heuristics::HeuristicRegistry;
use crate::targets::{RoutingTarget, TargetCandidate, TargetKind};
use std::collections::HashMap;

/// Minimal wall geometry a caller supplies for wet-wall detection and target
/// synthesis: an id plus either an explicit center or a start/end pair the
/// center is derived from.
#[derive(Clone, Debug)]
pub struct WallGeometry {
    pub wall_id: String,
    pub center: Option<(f64, f64, f64)>,
    pub start: Option<(f64, f64, f64)>,
    pub end: Option<(f64, f64, f64)>,
}

impl WallGeometry {
    fn resolved_center(&self) -> Option<(f64, f64, f64)> {
        if let Some(c) = self.center {
            return Some(c);
        }
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some(((s.0 + e.0) / 2.0, (s.1 + e.1) / 2.0, s.2)),
            _ => None,
        }
    }
}

/// A wall identified as carrying (or worth carrying) plumbing stack targets.
#[derive(Clone, Debug, Default)]
pub struct WetWallInfo {
    pub wall_id: String,
    pub fixture_count: usize,
    pub has_stack: bool,
    pub is_back_to_back: bool,
    pub score: f64,
}

const PLUMBING_SYSTEMS: &[&str] =
    &["Sanitary", "Vent", "DomesticHotWater", "DomesticColdWater", "DHW", "DCW"];

/// Counts plumbing fixtures per wall, scores each wall as a wet-wall
/// candidate, and boosts back-to-back pairs. Sorted descending by score.
pub fn detect_wet_walls(
    walls: &[WallGeometry],
    connectors: &[ConnectorInfo],
    adjacency_threshold: f64,
) -> Vec<WetWallInfo> {
    let mut wall_fixtures: HashMap<String, Vec<&ConnectorInfo>> = HashMap::new();
    for connector in connectors {
        if let Some(wall_id) = &connector.wall_id {
            if PLUMBING_SYSTEMS.contains(&connector.system_type.as_str()) {
                wall_fixtures.entry(wall_id.clone()).or_default().push(connector);
            }
        }
    }

    let mut wet_walls: Vec<WetWallInfo> = wall_fixtures
        .into_iter()
        .filter(|(_, fixtures)| fixtures.len() >= 2)
        .map(|(wall_id, fixtures)| {
            let has_toilet = fixtures
                .iter()
                .any(|c| c.fixture_type.as_deref().map(|f| f.to_lowercase().contains("toilet")).unwrap_or(false));
            let has_sink = fixtures
                .iter()
                .any(|c| c.fixture_type.as_deref().map(|f| f.to_lowercase().contains("sink")).unwrap_or(false));

            let mut score = fixtures.len() as f64 * 10.0;
            if has_toilet {
                score += 20.0;
            }
            if has_sink {
                score += 10.0;
            }

            WetWallInfo {
                wall_id,
                fixture_count: fixtures.len(),
                has_stack: false,
                is_back_to_back: false,
                score,
            }
        })
        .collect();

    let centers: HashMap<&str, (f64, f64, f64)> = walls
        .iter()
        .filter_map(|w| w.resolved_center().map(|c| (w.wall_id.as_str(), c)))
        .collect();

    for i in 0..wet_walls.len() {
        for j in (i + 1)..wet_walls.len() {
            let back_to_back = match (centers.get(wet_walls[i].wall_id.as_str()), centers.get(wet_walls[j].wall_id.as_str())) {
                (Some(&a), Some(&b)) => are_back_to_back(a, b, adjacency_threshold),
                _ => false,
            };
            if back_to_back {
                wet_walls[i].is_back_to_back = true;
                wet_walls[j].is_back_to_back = true;
                wet_walls[i].score += 15.0;
                wet_walls[j].score += 15.0;
            }
        }
    }

    wet_walls.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    wet_walls
}

fn are_back_to_back(center_a: (f64, f64, f64), center_b: (f64, f64, f64), threshold: f64) -> bool {
    let dx = (center_a.0 - center_b.0).abs();
    let dy = (center_a.1 - center_b.1).abs();
    (dx < threshold && dy > threshold * 2.0) || (dy < threshold && dx > threshold * 2.0)
}

/// Generates wet-wall targets (one per detected wet wall) and, optionally,
/// floor-penetration targets for fixtures with no `wall_id` at all.
pub fn generate_targets_from_walls(
    walls: &[WallGeometry],
    connectors: &[ConnectorInfo],
    include_floor_penetrations: bool,
) -> Vec<RoutingTarget> {
    let mut targets = Vec::new();
    let mut counter = 0usize;

    let wet_walls = detect_wet_walls(walls, connectors, 2.0);
    for wet_wall in &wet_walls {
        let Some(wall_data) = walls.iter().find(|w| w.wall_id == wet_wall.wall_id) else {
            continue;
        };
        let Some(center) = wall_data.resolved_center() else {
            continue;
        };

        let mut metadata = HashMap::new();
        metadata.insert("wall_id".to_string(), serde_json::json!(wet_wall.wall_id));
        metadata.insert("fixture_count".to_string(), serde_json::json!(wet_wall.fixture_count));
        metadata.insert("is_back_to_back".to_string(), serde_json::json!(wet_wall.is_back_to_back));

        targets.push(RoutingTarget {
            id: format!("wet_wall_{counter}"),
            kind: TargetKind::WetWall,
            world_xyz: center,
            domain_id: wet_wall.wall_id.clone(),
            plane_uv: (center.0, center.1),
            systems_served: vec![
                "Sanitary".into(),
                "Vent".into(),
                "DomesticHotWater".into(),
                "DomesticColdWater".into(),
                "DHW".into(),
                "DCW".into(),
            ],
            capacity: 0.333,
            priority: (10 - wet_wall.fixture_count as i32).max(0),
            is_available: true,
            metadata,
        });
        counter += 1;
    }

    if include_floor_penetrations {
        targets.extend(generate_floor_penetration_targets(connectors, counter));
    }

    targets
}

/// Floor-penetration targets for fixtures with no `wall_id` (e.g. an island
/// sink) -- these drop straight down to the floor cavity below.
fn generate_floor_penetration_targets(connectors: &[ConnectorInfo], start_counter: usize) -> Vec<RoutingTarget> {
    let mut targets = Vec::new();
    let mut counter = start_counter;

    for connector in connectors {
        if connector.wall_id.is_some() {
            continue;
        }
        if !matches!(connector.system_type.as_str(), "Sanitary" | "DomesticHotWater" | "DomesticColdWater") {
            continue;
        }

        let mut metadata = HashMap::new();
        if let Some(fixture_id) = &connector.fixture_id {
            metadata.insert("fixture_id".to_string(), serde_json::json!(fixture_id));
        }
        metadata.insert("generated_for".to_string(), serde_json::json!(connector.id));

        targets.push(RoutingTarget {
            id: format!("floor_pen_{counter}"),
            kind: TargetKind::FloorPenetration,
            world_xyz: (connector.location.0, connector.location.1, connector.location.2 - 0.5),
            domain_id: "floor_0".to_string(),
            plane_uv: (connector.location.0, connector.location.1),
            systems_served: vec![connector.system_type.clone()],
            capacity: 0.333,
            priority: 5,
            is_available: true,
            metadata,
        });
        counter += 1;
    }

    targets
}

/// Stateful façade over the heuristic registry plus a caller-accumulated
/// catalog of targets/domains, for callers that want to add targets
/// incrementally rather than pass full slices on every call.
#[derive(Default)]
pub struct TargetCandidateGenerator {
    heuristics: HeuristicRegistry,
    targets: Vec<RoutingTarget>,
    domains: Vec<RoutingDomain>,
}

impl TargetCandidateGenerator {
    pub fn new() -> Self {
        TargetCandidateGenerator {
            heuristics: HeuristicRegistry::default(),
            targets: Vec::new(),
            domains: Vec::new(),
        }
    }

    pub fn add_target(&mut self, target: RoutingTarget) {
        self.targets.push(target);
    }

    pub fn add_targets(&mut self, targets: impl IntoIterator<Item = RoutingTarget>) {
        self.targets.extend(targets);
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn add_domain(&mut self, domain: RoutingDomain) {
        self.domains.push(domain);
    }

    pub fn add_domains(&mut self, domains: impl IntoIterator<Item = RoutingDomain>) {
        self.domains.extend(domains);
    }

    pub fn targets(&self) -> &[RoutingTarget] {
        &self.targets
    }

    pub fn domains(&self) -> &[RoutingDomain] {
        &self.domains
    }

    pub fn find_candidates(&self, connector: &ConnectorInfo, max_candidates: usize) -> Vec<TargetCandidate> {
        let heuristic = self.heuristics.for_system(&connector.system_type);
        heuristic.find_candidates(connector, &self.targets, &self.domains, max_candidates)
    }

    pub fn find_all_candidates(
        &self,
        connectors: &[ConnectorInfo],
        max_candidates_per_connector: usize,
    ) -> HashMap<String, Vec<TargetCandidate>> {
        connectors
            .iter()
            .map(|c| (c.id.clone(), self.find_candidates(c, max_candidates_per_connector)))
            .collect()
    }
}
