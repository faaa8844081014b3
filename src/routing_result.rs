//! The orchestrator's output value objects: successful routes, residual
//! failures annotated with a reason, and summary statistics.

use crate::connector::ConnectorInfo;
use crate::route::Route;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A connector that could not be routed, with an actionable reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedConnector {
    pub connector: ConnectorInfo,
    pub reason: String,
    #[serde(default)]
    pub attempted_targets: Vec<String>,
    #[serde(default = "default_error_code")]
    pub error_code: String,
    #[serde(default = "default_true")]
    pub recoverable: bool,
}

fn default_error_code() -> String {
    "ROUTING_FAILED".to_string()
}

fn default_true() -> bool {
    true
}

/// Aggregate counters sealed once `route_all` completes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RoutingStatistics {
    pub total_connectors: usize,
    pub successful_routes: usize,
    pub failed_routes: usize,
    pub total_length: f64,
    pub total_cost: f64,
    pub routing_time_ms: f64,
    pub conflicts_resolved: usize,
    pub reroute_attempts: usize,
}

impl RoutingStatistics {
    /// `successful_routes / total_connectors * 100`, or 0 when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.total_connectors == 0 {
            0.0
        } else {
            (self.successful_routes as f64 / self.total_connectors as f64) * 100.0
        }
    }
}

/// Complete output of one `route_all` call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingResult {
    pub routes: Vec<Route>,
    pub failed: Vec<FailedConnector>,
    pub statistics: RoutingStatistics,
    pub timestamp: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RoutingResult {
    pub fn new() -> Self {
        RoutingResult {
            routes: Vec::new(),
            failed: Vec::new(),
            statistics: RoutingStatistics::default(),
            timestamp: Utc::now().to_rfc3339(),
            metadata: HashMap::new(),
        }
    }

    pub fn add_route(&mut self, route: Route) {
        self.statistics.successful_routes += 1;
        self.statistics.total_length += route.total_length;
        self.statistics.total_cost += route.total_cost;
        self.routes.push(route);
    }

    pub fn add_failure(
        &mut self,
        connector: ConnectorInfo,
        reason: impl Into<String>,
        attempted_targets: Vec<String>,
        error_code: impl Into<String>,
    ) {
        self.statistics.failed_routes += 1;
        self.failed.push(FailedConnector {
            connector,
            reason: reason.into(),
            attempted_targets,
            error_code: error_code.into(),
            recoverable: true,
        });
    }

    pub fn get_routes_by_system(&self, system_type: &str) -> Vec<&Route> {
        self.routes.iter().filter(|r| r.system_type == system_type).collect()
    }

    pub fn get_routes_in_domain(&self, domain_id: &str) -> Vec<&Route> {
        self.routes
            .iter()
            .filter(|r| r.segments.iter().any(|s| s.domain_id == domain_id))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RoutingResult {
    fn default() -> Self {
        RoutingResult::new()
    }
}

/// The request shape a caller hands to the orchestrator: connectors, targets,
/// and configuration together, plus `validate()` for pre-flight input checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingRequest {
    pub connectors: Vec<ConnectorInfo>,
    pub targets: Vec<crate::targets::RoutingTarget>,
    pub config: crate::config::RouterConfig,
}

impl RoutingRequest {
    /// Basic structural validation -- missing ids/system types, empty
    /// connector or target lists. Does not check geometric consistency.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.connectors.is_empty() {
            errors.push("no connectors provided".to_string());
        }
        if self.targets.is_empty() {
            errors.push("no targets provided".to_string());
        }
        for (i, c) in self.connectors.iter().enumerate() {
            if c.id.is_empty() {
                errors.push(format!("connector[{i}] missing id"));
            }
            if c.system_type.is_empty() {
                errors.push(format!("connector[{i}] missing system_type"));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorDirection;

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

    #[test]
    fn success_rate_is_zero_when_nothing_attempted() {
        let stats = RoutingStatistics::default();
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_computes_percentage() {
        let mut stats = RoutingStatistics::default();
        stats.total_connectors = 4;
        stats.successful_routes = 3;
        assert!((stats.success_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn add_route_and_add_failure_update_statistics() {
        let mut result = RoutingResult::new();
        let mut route = Route::new("r1", "Sanitary");
        route.add_segment(crate::route::RouteSegment::new(
            crate::geometry::Point2D::new(0.0, 0.0),
            crate::geometry::Point2D::new(1.0, 0.0),
            "wall_1",
        ));
        result.add_route(route);
        result.add_failure(connector(), "No path found", vec!["t1".into()], "NO_PATH");

        assert_eq!(result.statistics.successful_routes, 1);
        assert_eq!(result.statistics.failed_routes, 1);
        assert!(!result.is_complete());
    }

    #[test]
    fn validate_flags_empty_lists() {
        let req = RoutingRequest {
            connectors: Vec::new(),
            targets: Vec::new(),
            config: crate::config::RouterConfig::default(),
        };
        let errors = req.validate();
        assert!(errors.iter().any(|e| e.contains("connectors")));
        assert!(errors.iter().any(|e| e.contains("targets")));
    }
}
