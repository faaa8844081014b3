//! A fixture's pipe/wire terminal to be routed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorDirection {
    Inward,
    Outward,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectorInfo {
    pub id: String,
    pub system_type: String,
    /// World (x, y, z).
    pub location: (f64, f64, f64),
    pub direction: ConnectorDirection,
    pub diameter: f64,
    #[serde(default)]
    pub fixture_id: Option<String>,
    #[serde(default)]
    pub fixture_type: Option<String>,
    /// The wall/domain id this connector exits through, used as the source
    /// domain for pathfinding.
    #[serde(default)]
    pub wall_id: Option<String>,
    pub elevation: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ConnectorInfo {
    pub fn plane_xy(&self) -> (f64, f64) {
        (self.location.0, self.location.1)
    }
}
