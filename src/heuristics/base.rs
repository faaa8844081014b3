//! `TargetHeuristic`: the trait every per-system target-selection strategy
//! implements, plus the base scoring formula shared by all of them.

use crate::connector::ConnectorInfo;
use crate::domain::RoutingDomain;
use crate::targets::{RoutingTarget, TargetCandidate, TargetKind};

/// Base scoring weights shared by every heuristic.
pub const DISTANCE_WEIGHT: f64 = 1.0;
pub const PRIORITY_WEIGHT: f64 = 0.1;
pub const FLOOR_CHANGE_PENALTY: f64 = 10.0;

fn manhattan_distance_3d(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs() + (a.2 - b.2).abs()
}

/// Per-system target-selection strategy. Each heuristic advertises the
/// system names it handles and the target kinds it prefers (ordered), and
/// scores candidate targets -- lower is better.
pub trait TargetHeuristic {
    fn system_types(&self) -> &'static [&'static str];

    fn preferred_target_kinds(&self) -> &'static [TargetKind];

    /// Base score: Manhattan 3D distance + weighted priority + elevation-change penalty.
    fn base_score(&self, connector: &ConnectorInfo, target: &RoutingTarget) -> f64 {
        let distance = manhattan_distance_3d(connector.location, target.world_xyz);
        let floor_delta = (connector.elevation - target.world_xyz.2).abs() / 10.0;
        DISTANCE_WEIGHT * distance
            + PRIORITY_WEIGHT * target.priority as f64
            + FLOOR_CHANGE_PENALTY * floor_delta
    }

    /// Full score for this heuristic; override to add system-specific terms.
    /// `f64::INFINITY` rejects the target outright.
    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        _domain: Option<&RoutingDomain>,
    ) -> f64 {
        self.base_score(connector, target)
    }

    /// Filters, scores, and ranks up to `max_candidates` targets for this
    /// connector, ascending by score.
    fn find_candidates(
        &self,
        connector: &ConnectorInfo,
        targets: &[RoutingTarget],
        domains: &[RoutingDomain],
        max_candidates: usize,
    ) -> Vec<TargetCandidate> {
        let mut candidates: Vec<TargetCandidate> = self
            .filter_available(targets, connector)
            .into_iter()
            .filter(|t| self.preferred_target_kinds().contains(&t.kind))
            .map(|target| {
                let domain = domains.iter().find(|d| d.id == target.domain_id);
                let score = self.score_target(connector, target, domain);
                (target, score)
            })
            .filter(|(_, score)| score.is_finite())
            .map(|(target, score)| {
                let distance = target.plane_distance_to(connector.plane_xy());
                TargetCandidate {
                    target: target.clone(),
                    score,
                    distance,
                    domain_id: target.domain_id.clone(),
                    requires_floor_routing: target.kind == TargetKind::FloorPenetration,
                    notes: String::new(),
                }
            })
            .collect();

        candidates.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap());
        candidates.truncate(max_candidates);
        candidates
    }

    /// `is_available`, `can_fit_pipe`, and `can_serve_system` filters shared
    /// by every heuristic's `find_candidates`.
    fn filter_available<'a>(
        &self,
        targets: &'a [RoutingTarget],
        connector: &ConnectorInfo,
    ) -> Vec<&'a RoutingTarget> {
        targets
            .iter()
            .filter(|t| {
                t.is_available
                    && t.can_fit_pipe(connector.diameter)
                    && t.can_serve_system(&connector.system_type)
            })
            .collect()
    }
}

/// Used when no heuristic is registered for a system: pure distance ranking.
pub struct FallbackHeuristic;

impl TargetHeuristic for FallbackHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &[]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        use TargetKind::*;
        &[
            WetWall,
            FloorPenetration,
            CeilingPenetration,
            Shaft,
            PanelBoundary,
            Equipment,
            MainLine,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorDirection;
    use std::collections::HashMap;

    fn connector() -> ConnectorInfo {
        ConnectorInfo {
            id: "c1".into(),
            system_type: "Sanitary".into(),
            location: (5.0, 4.0, 1.0),
            direction: ConnectorDirection::Outward,
            diameter: 0.333,
            fixture_id: None,
            fixture_type: None,
            wall_id: Some("wall_1".into()),
            elevation: 1.0,
            metadata: HashMap::new(),
        }
    }

    fn target() -> RoutingTarget {
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
    fn base_score_matches_weighted_formula() {
        let h = FallbackHeuristic;
        let c = connector();
        let t = target();
        let expected = manhattan_distance_3d(c.location, t.world_xyz) * DISTANCE_WEIGHT
            + t.priority as f64 * PRIORITY_WEIGHT
            + FLOOR_CHANGE_PENALTY * ((c.elevation - t.world_xyz.2).abs() / 10.0);
        assert!((h.base_score(&c, &t) - expected).abs() < 1e-9);
    }

    #[test]
    fn fallback_accepts_every_preferred_kind() {
        let h = FallbackHeuristic;
        assert!(h.preferred_target_kinds().contains(&TargetKind::WetWall));
        assert!(h.preferred_target_kinds().contains(&TargetKind::MainLine));
    }
}
