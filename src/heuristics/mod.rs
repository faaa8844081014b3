//! Per-system target-selection heuristics.

pub mod base;
pub mod electrical;
pub mod plumbing;

pub use base::{FallbackHeuristic, TargetHeuristic};
pub use electrical::{DataHeuristic, LightingHeuristic, PowerHeuristic};
pub use plumbing::{SanitaryHeuristic, SupplyHeuristic, VentHeuristic};

/// Builds the default registry: one heuristic instance per system type it
/// advertises via `system_types()`, falling back to `FallbackHeuristic` for
/// anything unregistered.
pub struct HeuristicRegistry {
    heuristics: Vec<Box<dyn TargetHeuristic>>,
    fallback: FallbackHeuristic,
}

impl HeuristicRegistry {
    pub fn new() -> Self {
        HeuristicRegistry {
            heuristics: Vec::new(),
            fallback: FallbackHeuristic,
        }
    }

    pub fn register(&mut self, heuristic: Box<dyn TargetHeuristic>) {
        self.heuristics.push(heuristic);
    }

    pub fn for_system(&self, system_type: &str) -> &dyn TargetHeuristic {
        for h in &self.heuristics {
            if h.system_types().contains(&system_type) {
                return h.as_ref();
            }
        }
        &self.fallback
    }
}

impl Default for HeuristicRegistry {
    fn default() -> Self {
        let mut registry = HeuristicRegistry::new();
        registry.register(Box::new(SanitaryHeuristic::default()));
        registry.register(Box::new(VentHeuristic::default()));
        registry.register(Box::new(SupplyHeuristic::default()));
        registry.register(Box::new(PowerHeuristic::default()));
        registry.register(Box::new(DataHeuristic::default()));
        registry.register(Box::new(LightingHeuristic::default()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_system_to_its_heuristic() {
        let registry = HeuristicRegistry::default();
        let h = registry.for_system("Sanitary");
        assert!(h.system_types().contains(&"Sanitary"));
    }

    #[test]
    fn registry_falls_back_for_unknown_system() {
        let registry = HeuristicRegistry::default();
        let h = registry.for_system("Unknown");
        assert!(h.system_types().is_empty());
    }
}
