//! Groups MEP system-type strings into trades, with trade-level priority
//! order and minimum inter-trade clearance. Supplemental to the flat
//! per-system priority map `orchestrator::ConnectorSequencer` uses by
//! default; a caller that supplies a `TradeConfig` gets trade-grouped
//! sequencing instead.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trade {
    Plumbing,
    Hvac,
    FireProtection,
    Electrical,
}

pub const DEFAULT_TRADE_ORDER: [Trade; 4] =
    [Trade::Plumbing, Trade::Hvac, Trade::FireProtection, Trade::Electrical];

fn default_trade_systems(trade: Trade) -> &'static [&'static str] {
    match trade {
        Trade::Plumbing => &[
            "sanitary_drain",
            "sanitary_vent",
            "domestic_hot_water",
            "domestic_cold_water",
            "dhw",
            "dcw",
            "sanitary",
            "vent",
            "storm_drain",
        ],
        Trade::Hvac => &[
            "supply_air",
            "return_air",
            "exhaust_air",
            "outside_air",
            "refrigerant",
            "condensate",
        ],
        Trade::FireProtection => &["fire_sprinkler", "fire_standpipe"],
        Trade::Electrical => &[
            "power",
            "lighting",
            "data",
            "low_voltage",
            "audio",
            "security",
            "controls",
        ],
    }
}

fn default_clearance(trade: Trade) -> f64 {
    match trade {
        Trade::Plumbing => 0.25,
        Trade::Hvac => 0.5,
        Trade::FireProtection => 0.167,
        Trade::Electrical => 0.125,
    }
}

/// Groups system types into trades and supplies priority/clearance lookups.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TradeConfig {
    pub trade_order: Vec<Trade>,
    pub trade_systems: Vec<(Trade, Vec<String>)>,
    pub clearances: Vec<(Trade, f64)>,
    /// `None` means every trade runs.
    pub enabled_trades: Option<HashSet<Trade>>,
}

impl Default for TradeConfig {
    fn default() -> Self {
        TradeConfig {
            trade_order: DEFAULT_TRADE_ORDER.to_vec(),
            trade_systems: DEFAULT_TRADE_ORDER
                .iter()
                .map(|&t| (t, default_trade_systems(t).iter().map(|s| s.to_string()).collect()))
                .collect(),
            clearances: DEFAULT_TRADE_ORDER.iter().map(|&t| (t, default_clearance(t))).collect(),
            enabled_trades: None,
        }
    }
}

impl TradeConfig {
    /// Case-insensitive lookup across `trade_systems`.
    pub fn get_trade_for_system(&self, system_type: &str) -> Option<Trade> {
        let lower = system_type.to_lowercase();
        self.trade_systems
            .iter()
            .find(|(_, systems)| systems.iter().any(|s| s.to_lowercase() == lower))
            .map(|(trade, _)| *trade)
    }

    pub fn get_systems_for_trade(&self, trade: Trade) -> &[String] {
        self.trade_systems
            .iter()
            .find(|(t, _)| *t == trade)
            .map(|(_, systems)| systems.as_slice())
            .unwrap_or(&[])
    }

    /// Minimum inter-trade clearance in feet; 0.125 if the trade is unknown.
    pub fn get_clearance(&self, trade: Trade) -> f64 {
        self.clearances
            .iter()
            .find(|(t, _)| *t == trade)
            .map(|(_, c)| *c)
            .unwrap_or(0.125)
    }

    /// Position of `trade` in `trade_order`, or `trade_order.len()` if absent.
    pub fn get_priority(&self, trade: Trade) -> usize {
        self.trade_order
            .iter()
            .position(|&t| t == trade)
            .unwrap_or(self.trade_order.len())
    }

    pub fn is_trade_enabled(&self, trade: Trade) -> bool {
        match &self.enabled_trades {
            None => true,
            Some(set) => set.contains(&trade),
        }
    }

    pub fn get_enabled_trades(&self) -> Vec<Trade> {
        match &self.enabled_trades {
            None => self.trade_order.clone(),
            Some(set) => self.trade_order.iter().copied().filter(|t| set.contains(t)).collect(),
        }
    }
}

/// An optional partitioning aid for multi-zone buildings: used only to
/// pre-filter connectors/walls before a routing call. Has no effect on the
/// routing algorithm itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingZone {
    pub id: String,
    pub name: String,
    pub level: i32,
    pub bounds: (f64, f64, f64, f64),
    pub wall_ids: Vec<String>,
    pub connector_ids: Vec<String>,
}

impl RoutingZone {
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let (x_min, y_min, x_max, y_max) = self.bounds;
        x >= x_min && x <= x_max && y >= y_min && y <= y_max
    }
}
