//! Tracks reserved line segments per domain and answers clearance queries.

use crate::geometry::Point2D;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// A reserved pipe/conduit run within a single domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OccupiedSegment {
    pub route_id: String,
    pub system_type: String,
    pub trade: String,
    pub start: Point2D,
    pub end: Point2D,
    pub diameter: f64,
    /// Harmless extra metadata for future conflict-resolution ordering; it
    /// does not otherwise affect the conflict predicate below.
    #[serde(default)]
    pub priority: i32,
}

impl OccupiedSegment {
    pub fn new(
        route_id: impl Into<String>,
        system_type: impl Into<String>,
        trade: impl Into<String>,
        start: Point2D,
        end: Point2D,
        diameter: f64,
    ) -> Self {
        OccupiedSegment {
            route_id: route_id.into(),
            system_type: system_type.into(),
            trade: trade.into(),
            start,
            end,
            diameter,
            priority: 0,
        }
    }
}

/// Default clearance between independently-routed segments: 1/2 inch.
pub const DEFAULT_CLEARANCE: f64 = 0.0417;

/// The single source of truth for what space in each domain is reserved.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OccupancyMap {
    segments: FnvHashMap<String, Vec<OccupiedSegment>>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        OccupancyMap::default()
    }

    /// Appends unconditionally; callers must have already validated via `is_available`.
    pub fn reserve(&mut self, domain_id: impl Into<String>, segment: OccupiedSegment) {
        self.segments.entry(domain_id.into()).or_default().push(segment);
    }

    /// Removes every segment tagged with `route_id` from `domain_id`; returns the count removed.
    pub fn release(&mut self, domain_id: &str, route_id: &str) -> usize {
        match self.segments.get_mut(domain_id) {
            Some(list) => {
                let before = list.len();
                list.retain(|s| s.route_id != route_id);
                before - list.len()
            }
            None => 0,
        }
    }

    /// Removes every segment tagged with `route_id` across all domains.
    pub fn release_all(&mut self, route_id: &str) -> usize {
        let domain_ids: Vec<String> = self.segments.keys().cloned().collect();
        domain_ids
            .into_iter()
            .map(|domain_id| self.release(&domain_id, route_id))
            .sum()
    }

    pub fn get_segments(&self, domain_id: &str) -> &[OccupiedSegment] {
        self.segments
            .get(domain_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a proposed segment can be reserved without violating clearance
    /// against any existing segment in the same domain. Returns the first
    /// conflicting route id, if any.
    pub fn is_available(
        &self,
        domain_id: &str,
        proposed_start: Point2D,
        proposed_end: Point2D,
        diameter: f64,
        clearance: f64,
    ) -> (bool, Option<String>) {
        for existing in self.get_segments(domain_id) {
            let min_distance = segment_to_segment_distance(
                proposed_start,
                proposed_end,
                existing.start,
                existing.end,
            );
            let required = diameter / 2.0 + existing.diameter / 2.0 + clearance;
            if min_distance < required {
                return (false, Some(existing.route_id.clone()));
            }
        }
        (true, None)
    }

    /// Returns the full list of conflicting segments (not short-circuit), for
    /// diagnostic reporting.
    pub fn get_conflicts(
        &self,
        domain_id: &str,
        proposed_start: Point2D,
        proposed_end: Point2D,
        diameter: f64,
        clearance: f64,
    ) -> Vec<OccupiedSegment> {
        self.get_segments(domain_id)
            .iter()
            .filter(|existing| {
                let min_distance = segment_to_segment_distance(
                    proposed_start,
                    proposed_end,
                    existing.start,
                    existing.end,
                );
                let required = diameter / 2.0 + existing.diameter / 2.0 + clearance;
                min_distance < required
            })
            .cloned()
            .collect()
    }
}

/// Minimum distance between two line segments: zero if they intersect,
/// otherwise the minimum of the four point-to-segment distances between
/// each segment's endpoints and the other segment.
fn segment_to_segment_distance(a1: Point2D, a2: Point2D, b1: Point2D, b2: Point2D) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }

    let d1 = point_to_segment_distance(a1, b1, b2);
    let d2 = point_to_segment_distance(a2, b1, b2);
    let d3 = point_to_segment_distance(b1, a1, a2);
    let d4 = point_to_segment_distance(b2, a1, a2);

    d1.min(d2).min(d3).min(d4)
}

fn point_to_segment_distance(p: Point2D, s1: Point2D, s2: Point2D) -> f64 {
    let dx = s2.u - s1.u;
    let dy = s2.v - s1.v;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-12 {
        return p.distance_to(s1);
    }

    let t = ((p.u - s1.u) * dx + (p.v - s1.v) * dy) / len_sq;
    let t_clamped = t.clamp(0.0, 1.0);
    let closest = Point2D::new(s1.u + t_clamped * dx, s1.v + t_clamped * dy);
    p.distance_to(closest)
}

fn orientation(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    (b.u - a.u) * (c.v - a.v) - (b.v - a.v) * (c.u - a.u)
}

fn on_segment(p: Point2D, s1: Point2D, s2: Point2D) -> bool {
    p.u >= s1.u.min(s2.u) - 1e-9
        && p.u <= s1.u.max(s2.u) + 1e-9
        && p.v >= s1.v.min(s2.v) - 1e-9
        && p.v <= s1.v.max(s2.v) + 1e-9
}

fn segments_intersect(a1: Point2D, a2: Point2D, b1: Point2D, b2: Point2D) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0) && o1.abs() > 1e-12 && o2.abs() > 1e-12
    {
        return true;
    }

    // Collinear special cases: endpoint lies on the other segment.
    if o1.abs() < 1e-9 && on_segment(b1, a1, a2) {
        return true;
    }
    if o2.abs() < 1e-9 && on_segment(b2, a1, a2) {
        return true;
    }
    if o3.abs() < 1e-9 && on_segment(a1, b1, b2) {
        return true;
    }
    if o4.abs() < 1e-9 && on_segment(a2, b1, b2) {
        return true;
    }

    false
}
