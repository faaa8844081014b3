//! Sanitary/vent post-processing: slope application, 90°-to-45° elbow
//! optimization, and flow-direction tagging.
//!
//! `postprocess/sanitary.py` is an unfinished stub (module docstring and
//! imports only, no bodies), so the algorithms below have no prior
//! implementation to port from.
//!
//! Segments carry only domain-local `(u, v)` coordinates, not world
//! elevation, so slope here tracks a *relative* running elevation seeded at
//! `0.0` per route (or an explicit starting value the caller supplies) and
//! recorded as `z_start`/`z_end` segment metadata -- not a literal edit of
//! `u`/`v`, since those remain the routing-plane coordinates everything else
//! (occupancy, obstacle checks) keys on.

use crate::config::RouterConfig;
use crate::geometry::Point2D;
use crate::route::{Route, RouteSegment, SegmentDirection};
use serde_json::Value;

const Z_START_KEY: &str = "z_start";
const Z_END_KEY: &str = "z_end";
const GEOMETRY_VIOLATION_KEY: &str = "geometry_violation";
const INSUFFICIENT_SLOPE_KEY: &str = "insufficient_slope";
const ELBOW_KEY: &str = "elbow";
const UPSTREAM_KEY: &str = "upstream_end";
const DOWNSTREAM_KEY: &str = "downstream_end";

/// Applies the full L8 pipeline to every sanitary/vent route in `result`,
/// in place. Non-sanitary, non-vent routes are left untouched.
pub fn postprocess_result(result: &mut crate::routing_result::RoutingResult, config: &RouterConfig) {
    for route in &mut result.routes {
        process_route(route, config, 0.0);
    }
}

/// Applies slope, elbow optimization, and flow tagging to one route, if it's
/// a sanitary or vent system. `start_elevation` seeds the relative running
/// elevation for the slope pass.
pub fn process_route(route: &mut Route, config: &RouterConfig, start_elevation: f64) {
    match route.system_type.as_str() {
        "Sanitary" => {
            apply_slope(route, start_elevation, config.sanitary_slope_per_foot, config.sanitary_min_slope_per_foot);
            optimize_elbows(route, config.elbow_min_segment_length);
            assign_flow_direction(route, false);
        }
        "Vent" => {
            apply_slope(route, start_elevation, config.sanitary_slope_per_foot, config.sanitary_min_slope_per_foot);
            optimize_elbows(route, config.elbow_min_segment_length);
            assign_flow_direction(route, true);
        }
        _ => {}
    }
}

/// For each segment, imposes `end_z = start_z - slope_per_foot * length`. A
/// `slope_per_foot` below `min_slope_per_foot` is rejected: the minimum is
/// substituted instead and the route is flagged `insufficient_slope`. A
/// segment whose computed end elevation ends up *above* its start (only
/// possible with a misconfigured non-positive slope) is flagged
/// `geometry_violation` but kept.
fn apply_slope(route: &mut Route, start_elevation: f64, slope_per_foot: f64, min_slope_per_foot: f64) {
    let mut effective_slope = slope_per_foot;
    if slope_per_foot < min_slope_per_foot {
        route.metadata.insert(INSUFFICIENT_SLOPE_KEY.to_string(), Value::Bool(true));
        effective_slope = min_slope_per_foot;
    }

    let mut running = start_elevation;
    for segment in &mut route.segments {
        let start_z = running;
        let end_z = start_z - effective_slope * segment.length;

        segment.metadata.insert(Z_START_KEY.to_string(), serde_json::json!(start_z));
        segment.metadata.insert(Z_END_KEY.to_string(), serde_json::json!(end_z));

        if end_z > start_z + 1e-9 {
            segment.metadata.insert(GEOMETRY_VIOLATION_KEY.to_string(), Value::Bool(true));
            route.metadata.insert(GEOMETRY_VIOLATION_KEY.to_string(), Value::Bool(true));
        }

        running = end_z;
    }
}

/// Replaces every adjacent perpendicular (horizontal/vertical) segment pair
/// whose lengths both meet `min_segment_length` with a shrunk pair plus one
/// diagonal segment spanning the corner. The insertion offset is
/// `min(len1, len2) / 2`, so it never exceeds either original segment's half
/// length.
fn optimize_elbows(route: &mut Route, min_segment_length: f64) {
    let original: Vec<RouteSegment> = std::mem::take(&mut route.segments);
    let mut rebuilt: Vec<RouteSegment> = Vec::with_capacity(original.len());

    let mut i = 0;
    while i < original.len() {
        if i + 1 < original.len() && is_elbow_candidate(&original[i], &original[i + 1], min_segment_length) {
            let (first, diagonal, second) = split_elbow(&original[i], &original[i + 1]);
            rebuilt.push(first);
            rebuilt.push(diagonal);
            rebuilt.push(second);
            i += 2;
        } else {
            rebuilt.push(original[i].clone());
            i += 1;
        }
    }

    route.segments = rebuilt;
    recompute_totals(route);
}

fn is_elbow_candidate(a: &RouteSegment, b: &RouteSegment, min_segment_length: f64) -> bool {
    a.domain_id == b.domain_id
        && a.length >= min_segment_length
        && b.length >= min_segment_length
        && matches!(
            (a.direction, b.direction),
            (SegmentDirection::Horizontal, SegmentDirection::Vertical)
                | (SegmentDirection::Vertical, SegmentDirection::Horizontal)
        )
}

fn split_elbow(a: &RouteSegment, b: &RouteSegment) -> (RouteSegment, RouteSegment, RouteSegment) {
    let offset = (a.length.min(b.length) / 2.0).max(0.0);

    let dir_a = unit_vector(a.start, a.end);
    let dir_b = unit_vector(b.start, b.end);

    let new_a_end = a.end.sub(dir_a.scale(offset));
    let new_b_start = b.start.add(dir_b.scale(offset));

    let mut shrunk_a = RouteSegment::new(a.start, new_a_end, a.domain_id.clone());
    shrunk_a.crosses_obstacle = a.crosses_obstacle;
    shrunk_a.obstacle_kind = a.obstacle_kind.clone();

    let mut diagonal = RouteSegment::new(new_a_end, new_b_start, a.domain_id.clone());
    diagonal.metadata.insert(ELBOW_KEY.to_string(), Value::Bool(true));

    let mut shrunk_b = RouteSegment::new(new_b_start, b.end, b.domain_id.clone());
    shrunk_b.crosses_obstacle = b.crosses_obstacle;
    shrunk_b.obstacle_kind = b.obstacle_kind.clone();

    (shrunk_a, diagonal, shrunk_b)
}

fn unit_vector(start: Point2D, end: Point2D) -> Point2D {
    let delta = end.sub(start);
    let length = start.distance_to(end);
    if length < 1e-9 {
        Point2D::new(0.0, 0.0)
    } else {
        delta.scale(1.0 / length)
    }
}

fn recompute_totals(route: &mut Route) {
    route.total_cost = route.segments.iter().map(|s| s.cost).sum();
    route.total_length = route.segments.iter().map(|s| s.length).sum();
    route.domains_crossed.clear();
    for segment in &route.segments {
        if route.domains_crossed.last().map(|d: &String| d.as_str()) != Some(segment.domain_id.as_str())
            && !segment.domain_id.is_empty()
        {
            route.domains_crossed.push(segment.domain_id.clone());
        }
    }
}

/// Tags each segment's endpoints as the upstream/downstream side of flow.
/// Sanitary flows fixture-to-target (`start` is upstream); vent reverses the
/// tagging since the fixture is the vent run's downstream end.
fn assign_flow_direction(route: &mut Route, reversed: bool) {
    let (upstream, downstream) = if reversed { ("end", "start") } else { ("start", "end") };
    for segment in &mut route.segments {
        segment.metadata.insert(UPSTREAM_KEY.to_string(), Value::String(upstream.to_string()));
        segment.metadata.insert(DOWNSTREAM_KEY.to_string(), Value::String(downstream.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteSegment;

    fn sanitary_route() -> Route {
        let mut route = Route::new("r1", "Sanitary");
        route.add_segment(RouteSegment::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0), "wall_1"));
        route.add_segment(RouteSegment::new(Point2D::new(10.0, 0.0), Point2D::new(10.0, 5.0), "wall_1"));
        route
    }

    #[test]
    fn slope_drops_elevation_along_the_run() {
        let mut route = sanitary_route();
        apply_slope(&mut route, 10.0, 0.0208, 0.0104);

        let first = &route.segments[0];
        let expected_end = 10.0 - 0.0208 * 10.0;
        assert!((first.metadata[Z_END_KEY].as_f64().unwrap() - expected_end).abs() < 1e-9);
        assert!(first.metadata.get(GEOMETRY_VIOLATION_KEY).is_none());
    }

    #[test]
    fn slope_below_minimum_is_flagged_and_substituted() {
        let mut route = sanitary_route();
        apply_slope(&mut route, 10.0, 0.005, 0.0104);
        assert_eq!(route.metadata[INSUFFICIENT_SLOPE_KEY], Value::Bool(true));
        let first = &route.segments[0];
        let expected_end = 10.0 - 0.0104 * 10.0;
        assert!((first.metadata[Z_END_KEY].as_f64().unwrap() - expected_end).abs() < 1e-9);
    }

    #[test]
    fn negative_slope_flags_geometry_violation_but_keeps_route() {
        let mut route = sanitary_route();
        apply_slope(&mut route, 10.0, -0.02, 0.0104);
        assert_eq!(route.metadata[GEOMETRY_VIOLATION_KEY], Value::Bool(true));
        assert_eq!(route.segments.len(), 2);
    }

    #[test]
    fn elbow_optimization_inserts_a_diagonal_between_perpendicular_segments() {
        let mut route = sanitary_route();
        optimize_elbows(&mut route, 0.5);
        assert_eq!(route.segments.len(), 3);
        assert_eq!(route.segments[1].direction, SegmentDirection::Diagonal);
        assert_eq!(route.segments[1].metadata[ELBOW_KEY], Value::Bool(true));
    }

    #[test]
    fn elbow_optimization_skips_pairs_shorter_than_the_minimum() {
        let mut route = Route::new("r1", "Sanitary");
        route.add_segment(RouteSegment::new(Point2D::new(0.0, 0.0), Point2D::new(0.2, 0.0), "wall_1"));
        route.add_segment(RouteSegment::new(Point2D::new(0.2, 0.0), Point2D::new(0.2, 0.2), "wall_1"));
        optimize_elbows(&mut route, 0.5);
        assert_eq!(route.segments.len(), 2);
    }

    #[test]
    fn sanitary_flow_tags_fixture_side_as_upstream() {
        let mut route = sanitary_route();
        assign_flow_direction(&mut route, false);
        assert_eq!(route.segments[0].metadata[UPSTREAM_KEY], Value::String("start".into()));
    }

    #[test]
    fn vent_flow_tagging_is_reversed_relative_to_sanitary() {
        let mut route = sanitary_route();
        route.system_type = "Vent".into();
        assign_flow_direction(&mut route, true);
        assert_eq!(route.segments[0].metadata[UPSTREAM_KEY], Value::String("end".into()));
    }

    #[test]
    fn non_sanitary_route_passes_through_process_route_untouched() {
        let mut route = Route::new("r1", "Power");
        route.add_segment(RouteSegment::new(Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0), "wall_1"));
        let config = RouterConfig::default();
        process_route(&mut route, &config, 10.0);
        assert!(route.segments[0].metadata.get(Z_START_KEY).is_none());
    }
}
