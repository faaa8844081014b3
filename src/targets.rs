//! Valid routing destinations and the per-system compatibility table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kinds of routing targets.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    WetWall,
    FloorPenetration,
    CeilingPenetration,
    Shaft,
    PanelBoundary,
    Equipment,
    MainLine,
}

/// System type -> compatible target kinds. Built-in, immutable configuration.
pub fn system_target_compatibility(system_type: &str) -> &'static [TargetKind] {
    use TargetKind::*;
    match system_type {
        "Sanitary" => &[WetWall, FloorPenetration, Shaft],
        "Vent" => &[WetWall, CeilingPenetration, Shaft],
        "DomesticHotWater" | "DomesticColdWater" => {
            &[WetWall, FloorPenetration, CeilingPenetration, Shaft]
        }
        "Power" => &[PanelBoundary, CeilingPenetration, Equipment],
        "Lighting" => &[CeilingPenetration, PanelBoundary],
        "Data" => &[PanelBoundary, CeilingPenetration, Equipment],
        "LowVoltage" => &[PanelBoundary, CeilingPenetration],
        "SupplyAir" | "ReturnAir" | "Exhaust" => &[CeilingPenetration, Shaft],
        _ => &[],
    }
}

/// A valid destination for MEP routes: a wet wall, floor penetration, shaft,
/// panel boundary, equipment connection, or building main.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingTarget {
    pub id: String,
    pub kind: TargetKind,
    /// World (x, y, z).
    pub world_xyz: (f64, f64, f64),
    pub domain_id: String,
    /// Domain-plane (u, v).
    pub plane_uv: (f64, f64),
    #[serde(default)]
    pub systems_served: Vec<String>,
    /// Maximum pipe diameter this target will accept, in feet.
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_capacity() -> f64 {
    0.333
}

fn default_true() -> bool {
    true
}

impl RoutingTarget {
    pub fn can_serve_system(&self, system_type: &str) -> bool {
        if self.systems_served.is_empty() {
            system_target_compatibility(system_type).contains(&self.kind)
        } else {
            self.systems_served.iter().any(|s| s == system_type)
        }
    }

    pub fn can_fit_pipe(&self, diameter: f64) -> bool {
        diameter <= self.capacity
    }

    pub fn distance_to(&self, point: (f64, f64, f64)) -> f64 {
        let dx = self.world_xyz.0 - point.0;
        let dy = self.world_xyz.1 - point.1;
        let dz = self.world_xyz.2 - point.2;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn plane_distance_to(&self, point: (f64, f64)) -> f64 {
        let du = self.plane_uv.0 - point.0;
        let dv = self.plane_uv.1 - point.1;
        (du * du + dv * dv).sqrt()
    }

    pub fn manhattan_distance_to(&self, point: (f64, f64)) -> f64 {
        (self.plane_uv.0 - point.0).abs() + (self.plane_uv.1 - point.1).abs()
    }
}

/// A ranked candidate target for a connector. Lower `score` is better.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetCandidate {
    pub target: RoutingTarget,
    pub score: f64,
    pub distance: f64,
    pub domain_id: String,
    pub requires_floor_routing: bool,
    pub notes: String,
}

/// Filters targets to those compatible with `system_type`, fitting
/// `min_capacity`, and currently available.
pub fn filter_targets_for_system<'a>(
    targets: &'a [RoutingTarget],
    system_type: &str,
    min_capacity: f64,
) -> Vec<&'a RoutingTarget> {
    targets
        .iter()
        .filter(|t| t.can_serve_system(system_type) && t.can_fit_pipe(min_capacity) && t.is_available)
        .collect()
}

/// Ranks targets by distance from `from_point`, combined with `priority`
/// (`score = distance + priority * 0.1`). This is the Fallback heuristic's
/// scoring rule, also usable directly without registering any heuristic.
pub fn rank_targets_by_distance(
    targets: &[RoutingTarget],
    from_point: (f64, f64, f64),
    use_manhattan: bool,
) -> Vec<TargetCandidate> {
    let mut candidates: Vec<TargetCandidate> = targets
        .iter()
        .map(|target| {
            let distance = if use_manhattan {
                let from_2d = (from_point.0, from_point.1);
                (from_2d.0 - target.world_xyz.0).abs()
                    + (from_2d.1 - target.world_xyz.1).abs()
                    + (from_point.2 - target.world_xyz.2).abs()
            } else {
                target.distance_to(from_point)
            };

            let score = distance + target.priority as f64 * 0.1;

            TargetCandidate {
                target: target.clone(),
                score,
                distance,
                domain_id: target.domain_id.clone(),
                requires_floor_routing: target.kind == TargetKind::FloorPenetration,
                notes: format!("Distance: {distance:.2} ft, Priority: {}", target.priority),
            }
        })
        .collect();

    candidates.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wet_wall() -> RoutingTarget {
        RoutingTarget {
            id: "t1".into(),
            kind: TargetKind::WetWall,
            world_xyz: (5.0, 0.5, 0.0),
            domain_id: "wall_1".into(),
            plane_uv: (5.0, 0.5),
            systems_served: Vec::new(),
            capacity: 0.333,
            priority: 0,
            is_available: true,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn compatibility_falls_back_to_kind_table_when_systems_served_empty() {
        let t = wet_wall();
        assert!(t.can_serve_system("Sanitary"));
        assert!(!t.can_serve_system("Power"));
    }

    #[test]
    fn explicit_systems_served_overrides_kind_table() {
        let mut t = wet_wall();
        t.systems_served = vec!["Custom".into()];
        assert!(t.can_serve_system("Custom"));
        assert!(!t.can_serve_system("Sanitary"));
    }

    #[test]
    fn rank_targets_sorts_ascending_by_score() {
        let near = wet_wall();
        let mut far = wet_wall();
        far.id = "t2".into();
        far.world_xyz = (50.0, 0.5, 0.0);
        far.plane_uv = (50.0, 0.5);

        let ranked = rank_targets_by_distance(&[far.clone(), near.clone()], (5.0, 0.5, 0.0), true);
        assert_eq!(ranked[0].target.id, "t1");
        assert_eq!(ranked[1].target.id, "t2");
    }
}
