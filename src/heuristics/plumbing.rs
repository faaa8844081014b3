//! Sanitary (drain), vent, and supply (DHW/DCW) target heuristics.

use super::base::TargetHeuristic;
use crate::connector::ConnectorInfo;
use crate::domain::RoutingDomain;
use crate::targets::{RoutingTarget, TargetCandidate, TargetKind};

/// Sanitary (drain) systems: gravity-only, rejects upward targets, prefers
/// wet walls and shafts, penalizes long horizontal runs (slope maintenance).
pub struct SanitaryHeuristic {
    pub wet_wall_bonus: f64,
    pub shaft_bonus: f64,
    pub toilet_size_threshold: f64,
}

impl Default for SanitaryHeuristic {
    fn default() -> Self {
        SanitaryHeuristic {
            wet_wall_bonus: -10.0,
            shaft_bonus: -5.0,
            toilet_size_threshold: 0.25,
        }
    }
}

impl TargetHeuristic for SanitaryHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &["Sanitary"]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        &[TargetKind::WetWall, TargetKind::Shaft, TargetKind::FloorPenetration]
    }

    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        domain: Option<&RoutingDomain>,
    ) -> f64 {
        let mut score = self.base_score(connector, target);

        // Sanitary routes must go DOWN (gravity).
        if target.world_xyz.2 > connector.location.2 {
            return f64::INFINITY;
        }

        if target.kind == TargetKind::WetWall {
            score += self.wet_wall_bonus;
        }
        if target.kind == TargetKind::Shaft {
            score += self.shaft_bonus;
        }

        let horizontal_distance =
            (connector.location.0 - target.world_xyz.0).abs() + (connector.location.1 - target.world_xyz.1).abs();
        score += horizontal_distance * 0.5;

        if let Some(fixture_type) = &connector.fixture_type {
            if fixture_type.to_lowercase().contains("toilet") && target.capacity < self.toilet_size_threshold {
                return f64::INFINITY;
            }
        }

        let _ = domain;
        score
    }

    fn find_candidates(
        &self,
        connector: &ConnectorInfo,
        targets: &[RoutingTarget],
        domains: &[RoutingDomain],
        max_candidates: usize,
    ) -> Vec<TargetCandidate> {
        // Pre-filter targets above the connector's elevation so they never
        // surface as an attempted target at all, not merely scored to infinity.
        let below: Vec<RoutingTarget> = targets
            .iter()
            .filter(|t| t.world_xyz.2 <= connector.location.2)
            .cloned()
            .collect();

        let mut candidates = base_find_candidates(self, connector, &below, domains, max_candidates);
        for c in &mut candidates {
            c.notes = format!(
                "Sanitary: {:?}, elevation drop: {:.2} ft",
                c.target.kind,
                connector.location.2 - c.target.world_xyz.2
            );
        }
        candidates
    }
}

/// Vent systems: route UPWARD to atmosphere, small penalty (not rejection)
/// for downward targets (trap loops), prefers wet walls, penalizes ceilings.
pub struct VentHeuristic {
    pub wet_wall_bonus: f64,
    pub ceiling_penalty: f64,
}

impl Default for VentHeuristic {
    fn default() -> Self {
        VentHeuristic {
            wet_wall_bonus: -8.0,
            ceiling_penalty: 5.0,
        }
    }
}

impl TargetHeuristic for VentHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &["Vent"]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        &[TargetKind::WetWall, TargetKind::Shaft, TargetKind::CeilingPenetration]
    }

    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        _domain: Option<&RoutingDomain>,
    ) -> f64 {
        let mut score = self.base_score(connector, target);

        if target.world_xyz.2 < connector.location.2 {
            score += 5.0;
        }
        if target.kind == TargetKind::WetWall {
            score += self.wet_wall_bonus;
        }
        if target.kind == TargetKind::CeilingPenetration {
            score += self.ceiling_penalty;
        }

        score
    }

    fn find_candidates(
        &self,
        connector: &ConnectorInfo,
        targets: &[RoutingTarget],
        domains: &[RoutingDomain],
        max_candidates: usize,
    ) -> Vec<TargetCandidate> {
        let mut candidates = base_find_candidates(self, connector, targets, domains, max_candidates);
        for c in &mut candidates {
            c.notes = format!("Vent: {:?}", c.target.kind);
        }
        candidates
    }
}

/// Domestic hot/cold water: pressure systems, more flexible than gravity
/// drains. Hot water specifically penalizes long runs for heat loss.
pub struct SupplyHeuristic {
    pub wet_wall_bonus: f64,
    pub hot_water_length_penalty: f64,
}

impl Default for SupplyHeuristic {
    fn default() -> Self {
        SupplyHeuristic {
            wet_wall_bonus: -5.0,
            hot_water_length_penalty: 0.3,
        }
    }
}

impl TargetHeuristic for SupplyHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &["DomesticHotWater", "DomesticColdWater", "DHW", "DCW"]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        &[
            TargetKind::WetWall,
            TargetKind::CeilingPenetration,
            TargetKind::FloorPenetration,
            TargetKind::Shaft,
        ]
    }

    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        _domain: Option<&RoutingDomain>,
    ) -> f64 {
        let mut score = self.base_score(connector, target);

        if target.kind == TargetKind::WetWall {
            score += self.wet_wall_bonus;
        }

        if matches!(connector.system_type.as_str(), "DomesticHotWater" | "DHW") {
            let distance = (connector.location.0 - target.world_xyz.0).abs()
                + (connector.location.1 - target.world_xyz.1).abs()
                + (connector.location.2 - target.world_xyz.2).abs();
            score += self.hot_water_length_penalty * distance;
        }

        score
    }

    fn find_candidates(
        &self,
        connector: &ConnectorInfo,
        targets: &[RoutingTarget],
        domains: &[RoutingDomain],
        max_candidates: usize,
    ) -> Vec<TargetCandidate> {
        let mut candidates = base_find_candidates(self, connector, targets, domains, max_candidates);
        for c in &mut candidates {
            c.notes = format!("Supply ({}): {:?}", connector.system_type, c.target.kind);
        }
        candidates
    }
}

/// Shared candidate-generation body for the plumbing heuristics: the default
/// trait method already does filter/score/sort/truncate, so each heuristic's
/// `find_candidates` override exists only to customize the `notes` field.
fn base_find_candidates<H: TargetHeuristic + ?Sized>(
    heuristic: &H,
    connector: &ConnectorInfo,
    targets: &[RoutingTarget],
    domains: &[RoutingDomain],
    max_candidates: usize,
) -> Vec<TargetCandidate> {
    let filtered = heuristic.filter_available(targets, connector);
    let mut candidates: Vec<TargetCandidate> = filtered
        .into_iter()
        .filter(|t| heuristic.preferred_target_kinds().contains(&t.kind))
        .filter_map(|target| {
            let domain = domains.iter().find(|d| d.id == target.domain_id);
            let score = heuristic.score_target(connector, target, domain);
            if score.is_finite() {
                let distance = target.plane_distance_to(connector.plane_xy());
                Some(TargetCandidate {
                    target: target.clone(),
                    score,
                    distance,
                    domain_id: target.domain_id.clone(),
                    requires_floor_routing: target.kind == TargetKind::FloorPenetration,
                    notes: String::new(),
                })
            } else {
                None
            }
        })
        .collect();

    candidates.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap());
    candidates.truncate(max_candidates);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorDirection;
    use std::collections::HashMap;

    fn connector_at(elevation: f64) -> ConnectorInfo {
        ConnectorInfo {
            id: "c1".into(),
            system_type: "Sanitary".into(),
            location: (5.0, 4.0, elevation),
            direction: ConnectorDirection::Outward,
            diameter: 0.333,
            fixture_id: None,
            fixture_type: None,
            wall_id: Some("wall_1".into()),
            elevation,
            metadata: HashMap::new(),
        }
    }

    fn target_at(elevation: f64, kind: TargetKind) -> RoutingTarget {
        RoutingTarget {
            id: "t1".into(),
            kind,
            world_xyz: (5.0, 0.5, elevation),
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
    fn sanitary_rejects_upward_targets() {
        let h = SanitaryHeuristic::default();
        let connector = connector_at(1.0);
        let target = target_at(3.0, TargetKind::WetWall);
        assert_eq!(h.score_target(&connector, &target, None), f64::INFINITY);
    }

    #[test]
    fn sanitary_find_candidates_prefilters_above_elevation_targets() {
        let h = SanitaryHeuristic::default();
        let connector = connector_at(1.0);
        let above = target_at(3.0, TargetKind::WetWall);
        let below = target_at(0.0, TargetKind::WetWall);
        let candidates = h.find_candidates(&connector, &[above, below.clone()], &[], 5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].target.id, below.id);
    }

    #[test]
    fn sanitary_rejects_small_toilet_targets() {
        let h = SanitaryHeuristic::default();
        let mut connector = connector_at(1.0);
        connector.fixture_type = Some("Toilet".into());
        let mut target = target_at(0.0, TargetKind::WetWall);
        target.capacity = 0.2;
        assert_eq!(h.score_target(&connector, &target, None), f64::INFINITY);
    }

    #[test]
    fn vent_penalizes_but_does_not_reject_downward_targets() {
        let h = VentHeuristic::default();
        let connector = connector_at(3.0);
        let target = target_at(0.0, TargetKind::WetWall);
        let score = h.score_target(&connector, &target, None);
        assert!(score.is_finite());
    }

    #[test]
    fn hot_water_adds_length_penalty_cold_water_does_not() {
        let mut hot = connector_at(1.0);
        hot.system_type = "DHW".into();
        let mut cold = connector_at(1.0);
        cold.system_type = "DCW".into();
        let target = target_at(0.0, TargetKind::WetWall);

        let h = SupplyHeuristic::default();
        let hot_score = h.score_target(&hot, &target, None);
        let cold_score = h.score_target(&cold, &target, None);
        assert!(hot_score > cold_score);
    }
}
