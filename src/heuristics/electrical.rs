//! Power, data, and lighting target heuristics.

use super::base::TargetHeuristic;
use crate::connector::ConnectorInfo;
use crate::domain::RoutingDomain;
use crate::targets::TargetKind;
use crate::targets::RoutingTarget;

/// Power (branch circuit) wiring: prefers panel boundaries and ceiling runs,
/// gives a flat bonus to equipment connections.
pub struct PowerHeuristic {
    pub panel_boundary_bonus: f64,
    pub ceiling_bonus: f64,
    pub equipment_bonus: f64,
}

impl Default for PowerHeuristic {
    fn default() -> Self {
        PowerHeuristic {
            panel_boundary_bonus: -8.0,
            ceiling_bonus: -3.0,
            equipment_bonus: -2.0,
        }
    }
}

impl TargetHeuristic for PowerHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &["Power"]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        &[TargetKind::PanelBoundary, TargetKind::CeilingPenetration, TargetKind::Equipment]
    }

    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        _domain: Option<&RoutingDomain>,
    ) -> f64 {
        let mut score = self.base_score(connector, target);
        match target.kind {
            TargetKind::PanelBoundary => score += self.panel_boundary_bonus,
            TargetKind::CeilingPenetration => score += self.ceiling_bonus,
            TargetKind::Equipment => score += self.equipment_bonus,
            _ => {}
        }
        score
    }
}

/// Structured cabling: strongly prefers patch panels (unless the target is
/// flagged as a non-data panel, in which case the bonus is halved), penalizes
/// Cat6 runs beyond the 300 ft length limit.
pub struct DataHeuristic {
    pub patch_panel_bonus: f64,
    pub ceiling_bonus: f64,
    pub cat6_length_limit: f64,
}

impl Default for DataHeuristic {
    fn default() -> Self {
        DataHeuristic {
            patch_panel_bonus: -10.0,
            ceiling_bonus: -5.0,
            cat6_length_limit: 300.0,
        }
    }
}

impl TargetHeuristic for DataHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &["Data"]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        &[TargetKind::PanelBoundary, TargetKind::CeilingPenetration, TargetKind::Equipment]
    }

    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        _domain: Option<&RoutingDomain>,
    ) -> f64 {
        let mut score = self.base_score(connector, target);

        if target.kind == TargetKind::PanelBoundary {
            let is_data_panel = target
                .metadata
                .get("panel_type")
                .and_then(|v| v.as_str())
                .map(|s| s == "data")
                .unwrap_or(true);
            score += if is_data_panel {
                self.patch_panel_bonus
            } else {
                self.patch_panel_bonus * 0.5
            };
        }
        if target.kind == TargetKind::CeilingPenetration {
            score += self.ceiling_bonus;
        }

        let distance = (connector.location.0 - target.world_xyz.0).abs()
            + (connector.location.1 - target.world_xyz.1).abs()
            + (connector.location.2 - target.world_xyz.2).abs();
        if distance > self.cat6_length_limit {
            score += (distance - self.cat6_length_limit) * 2.0;
        }

        score
    }
}

/// Lighting circuits: strongly prefers ceiling penetrations, gives switch
/// legs at panel boundaries (wall switches) a smaller bonus.
pub struct LightingHeuristic {
    pub ceiling_bonus: f64,
    pub wall_switch_bonus: f64,
}

impl Default for LightingHeuristic {
    fn default() -> Self {
        LightingHeuristic {
            ceiling_bonus: -10.0,
            wall_switch_bonus: -5.0,
        }
    }
}

impl TargetHeuristic for LightingHeuristic {
    fn system_types(&self) -> &'static [&'static str] {
        &["Lighting"]
    }

    fn preferred_target_kinds(&self) -> &'static [TargetKind] {
        &[TargetKind::CeilingPenetration, TargetKind::PanelBoundary]
    }

    fn score_target(
        &self,
        connector: &ConnectorInfo,
        target: &RoutingTarget,
        _domain: Option<&RoutingDomain>,
    ) -> f64 {
        let mut score = self.base_score(connector, target);
        if target.kind == TargetKind::CeilingPenetration {
            score += self.ceiling_bonus;
        }
        if target.kind == TargetKind::PanelBoundary {
            score += self.wall_switch_bonus;
        }
        score
    }
}
