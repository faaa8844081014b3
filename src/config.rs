//! `RouterConfig`: every tunable default threaded through the builders and
//! the orchestrator. Nothing here is process-global; a caller constructs one
//! and passes it explicitly.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub grid_resolution_wall_u: f64,
    pub grid_resolution_wall_v: f64,
    pub grid_resolution_floor_x: f64,
    pub grid_resolution_floor_y: f64,

    pub stud_spacing: f64,
    pub stud_width: f64,
    pub plate_thickness: f64,

    pub default_clearance: f64,

    pub stud_penetration_cost: f64,
    pub joist_solid_cost: f64,
    pub joist_web_cost: f64,
    pub wall_to_floor_cost: f64,
    pub wall_to_wall_cost: f64,
    pub floor_to_ceiling_cost: f64,

    pub max_candidates_per_connector: usize,

    pub sanitary_slope_per_foot: f64,
    pub sanitary_min_slope_per_foot: f64,
    pub elbow_min_segment_length: f64,

    pub cat6_length_limit: f64,
    pub toilet_min_capacity: f64,

    pub hanan_tolerance: f64,
    pub hanan_obstacle_cost_multiplier: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            grid_resolution_wall_u: 0.333,
            grid_resolution_wall_v: 0.5,
            grid_resolution_floor_x: 1.0,
            grid_resolution_floor_y: 1.0,

            stud_spacing: 1.333,
            stud_width: 0.125,
            plate_thickness: 0.125,

            default_clearance: 0.0417,

            stud_penetration_cost: 5.0,
            joist_solid_cost: 8.0,
            joist_web_cost: 3.0,
            wall_to_floor_cost: 2.0,
            wall_to_wall_cost: 1.5,
            floor_to_ceiling_cost: 2.5,

            max_candidates_per_connector: 5,

            sanitary_slope_per_foot: 0.0208,
            sanitary_min_slope_per_foot: 0.0104,
            elbow_min_segment_length: 0.5,

            cat6_length_limit: 300.0,
            toilet_min_capacity: 0.25,

            hanan_tolerance: 1e-6,
            hanan_obstacle_cost_multiplier: 5.0,
        }
    }
}
