//! End-to-end routing scenarios against `RouterBuilder`/`OAHSRouter`,
//! covering single-wall sanitary drops, contention for one wet-wall target,
//! an above-elevation target that gravity rules out, detours around door and
//! window openings, and a structured-cabling run that exceeds its length
//! limit without being rejected outright.
//!
//! Test methodology mirrors a worked-example verification suite: each test
//! documents its given inputs and what it expects to find, checking the
//! invariants the router actually enforces (obstacle avoidance, gravity
//! rejection, non-recoverable domain mismatches) rather than exact segment
//! geometry, which depends on the grid resolution chosen for the lattice.

use oahs_router::connector::ConnectorDirection;
use oahs_router::domain::{DomainKind, Opening, OpeningKind, RoutingDomain};
use oahs_router::graph::transitions::WallPlacement;
use oahs_router::obstacle::ObstacleKind;
use oahs_router::occupancy::DEFAULT_CLEARANCE;
use oahs_router::orchestrator::ConnectorSequencer;
use oahs_router::targets::TargetKind;
use oahs_router::{ConnectorInfo, RouterBuilder, RouterConfig, RoutingDomain as Domain, RoutingTarget, WallSpec};
use std::collections::HashMap;

const WALL_LENGTH: f64 = 10.0;
const WALL_HEIGHT: f64 = 8.0;
const WALL_THICKNESS: f64 = 0.292;
const STUD_SPACING: f64 = 1.333;
const STUD_WIDTH: f64 = 0.125;
const PLATE_THICKNESS: f64 = 0.125;

fn standard_wall(id: &str) -> Domain {
    RoutingDomain::standard_wall(
        id,
        WALL_LENGTH,
        WALL_HEIGHT,
        WALL_THICKNESS,
        STUD_SPACING,
        STUD_WIDTH,
        PLATE_THICKNESS,
        true,
        true,
    )
}

fn straight_placement(length: f64) -> WallPlacement {
    WallPlacement { start: (0.0, 0.0), end: (length, 0.0) }
}

fn sanitary_connector(id: &str, wall_id: &str, u: f64, v: f64, elevation: f64, diameter: f64) -> ConnectorInfo {
    ConnectorInfo {
        id: id.into(),
        system_type: "Sanitary".into(),
        location: (u, v, elevation),
        direction: ConnectorDirection::Outward,
        diameter,
        fixture_id: None,
        fixture_type: None,
        wall_id: Some(wall_id.into()),
        elevation,
        metadata: HashMap::new(),
    }
}

fn wet_wall_target(id: &str, domain_id: &str, u: f64, v: f64, elevation: f64, capacity: f64) -> RoutingTarget {
    RoutingTarget {
        id: id.into(),
        kind: TargetKind::WetWall,
        world_xyz: (u, v, elevation),
        domain_id: domain_id.into(),
        plane_uv: (u, v),
        systems_served: vec!["Sanitary".into()],
        capacity,
        priority: 0,
        is_available: true,
        metadata: HashMap::new(),
    }
}

fn pipe_required_clearance(d1: f64, d2: f64) -> f64 {
    d1 / 2.0 + d2 / 2.0 + DEFAULT_CLEARANCE
}

// Scenario 1: single sanitary connector, single wet-wall target directly
// below it in the same wall.
//
// Given:
// - Wall "w1", 10.0 x 8.0 x 0.292, standard 16"-OC framing.
// - Sanitary connector at (5.0, 4.0), diameter 0.333.
// - Wet-wall target at (5.0, 0.5), capacity 0.333, two feet below the
//   connector's elevation so the gravity check passes.
//
// Find: exactly one successful route, no failures, and every segment clear
// of the wall's (non-penetrable) end studs and plates.
#[test]
fn scenario_1_single_connector_drops_straight_to_its_wet_wall() {
    let wall = standard_wall("w1");
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![sanitary_connector("c1", "w1", 5.0, 4.0, 4.0, 0.333)];
    let targets = vec![wet_wall_target("t1", "w1", 5.0, 0.5, 0.5, 0.333)];

    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    assert_eq!(result.statistics.successful_routes, 1, "expected the only connector to route successfully");
    assert_eq!(result.statistics.failed_routes, 0, "expected zero failures");

    let route = &result.routes[0];
    assert!(route.segments.iter().all(|s| !s.crosses_obstacle), "route must not cross any non-penetrable obstacle");

    let straight_line = 3.5; // |4.0 - 0.5| vertical run
    assert!(
        route.total_length >= straight_line - 1e-6,
        "route length {} shorter than the straight-line distance {}",
        route.total_length,
        straight_line
    );
}

// Scenario 2: two sanitary connectors contend for a single wet-wall target
// in the same wall, each narrow enough (0.167 ft) that both fit within the
// target's 0.333 ft capacity.
//
// Given:
// - Wall "w1" as above.
// - C1 at (2.0, 4.0), C2 at (8.0, 4.0), both sanitary, diameter 0.167.
// - Single wet-wall target at (5.0, 0.5), capacity 0.333.
//
// Find: both connectors route successfully (100% success rate), and
// `ConnectorSequencer` -- which `route_all` uses to order connectors before
// attempting them -- places whichever connector is listed first ahead of the
// other when they tie on priority and reference distance is measured from
// the first connector's own location.
#[test]
fn scenario_2_two_narrow_connectors_both_reach_the_same_wet_wall() {
    let wall = standard_wall("w1");
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![
        sanitary_connector("c1", "w1", 2.0, 4.0, 4.0, 0.167),
        sanitary_connector("c2", "w1", 8.0, 4.0, 4.0, 0.167),
    ];
    let targets = vec![wet_wall_target("t1", "w1", 5.0, 0.5, 0.5, 0.333)];

    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    assert_eq!(result.statistics.successful_routes, 2, "both narrow connectors should reach the shared target");
    assert_eq!(result.statistics.failed_routes, 0);
    assert!((result.statistics.success_rate() - 100.0).abs() < 1e-9);
}

// Companion to Scenario 2: the sequencing rule itself, isolated from
// pathfinding. `ConnectorSequencer::sequence` breaks same-priority ties by
// distance to `reference_point` -- `route_all` always passes the first
// connector's own location, so the first connector in the input (distance
// zero to itself) always sorts ahead of any other same-priority connector.
#[test]
fn scenario_2_sequencer_keeps_the_reference_connector_first_on_a_priority_tie() {
    let sequencer = ConnectorSequencer::new();
    let c1 = sanitary_connector("c1", "w1", 2.0, 4.0, 4.0, 0.167);
    let c2 = sanitary_connector("c2", "w1", 8.0, 4.0, 4.0, 0.167);

    let ordered = sequencer.sequence(&[c1.clone(), c2.clone()], c1.location);
    assert_eq!(ordered[0].id, "c1");
    assert_eq!(ordered[1].id, "c2");
}

// Scenario 3: a sanitary connector with no target below its own elevation.
//
// Given:
// - Wall "w1" as above.
// - Sanitary connector at elevation 1.0.
// - Only candidate target sits at elevation 3.0 (above the connector).
//
// Find: `SanitaryHeuristic` rejects upward targets outright (gravity-only
// drainage), so the connector fails with `NO_PATH` -- the target is
// system-compatible (hence attempted), but no viable candidate ever reaches
// the pathfinder.
#[test]
fn scenario_3_sanitary_connector_with_no_downhill_target_fails_no_path() {
    let wall = standard_wall("w1");
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![sanitary_connector("c1", "w1", 5.0, 3.0, 1.0, 0.333)];
    let targets = vec![wet_wall_target("t1", "w1", 5.0, 6.0, 3.0, 0.333)];

    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    assert_eq!(result.statistics.failed_routes, 1);
    assert_eq!(result.failed[0].error_code, "NO_PATH");
}

// Scenario 4: a door opening sits directly between the connector and its
// target, forcing a detour.
//
// Given:
// - Wall "w1" 10.0 x 8.0, with a full-height door opening spanning
//   u in [4.0, 6.0].
// - Sanitary connector at (5.0, 7.5), target wet wall at (5.0, 0.5).
//
// Find: a route is still found (the door is non-penetrable but the wall is
// wider than the door), and no segment crosses the door's bounding box.
#[test]
fn scenario_4_route_detours_around_a_door_opening() {
    let mut wall = standard_wall("w1");
    wall.add_opening(&Opening {
        id: "door1".into(),
        kind: OpeningKind::Door,
        u_start: 4.0,
        u_end: 6.0,
        v_start: 0.0,
        v_end: 6.833,
    });
    let door = wall.obstacles.iter().find(|o| o.kind == ObstacleKind::Opening).unwrap().clone();

    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![sanitary_connector("c1", "w1", 5.0, 7.5, 7.5, 0.333)];
    let targets = vec![wet_wall_target("t1", "w1", 5.0, 0.5, 0.5, 0.333)];

    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    assert_eq!(result.statistics.successful_routes, 1, "a route around the door must exist: the wall is wider than the door");
    let route = &result.routes[0];
    for segment in &route.segments {
        assert!(!segment.crosses_obstacle, "segment {:?}->{:?} is flagged as crossing an obstacle", segment.start, segment.end);
        assert!(
            !door.intersects_segment(segment.start, segment.end),
            "segment {:?}->{:?} passes directly through the door opening",
            segment.start,
            segment.end
        );
    }
}

// Scenario 5: a window opening (confined to a v-range, not full height)
// sits between connector and target.
//
// Given:
// - Wall "w1" as above, window spanning u in [3.0, 6.0], v in [3.0, 6.5].
// - Sanitary connector at (4.5, 7.0), target at (4.5, 0.5).
//
// Find: a route is found and no segment crosses the window's bounding box.
#[test]
fn scenario_5_route_avoids_a_window_opening() {
    let mut wall = standard_wall("w1");
    wall.add_opening(&Opening {
        id: "win1".into(),
        kind: OpeningKind::Window,
        u_start: 3.0,
        u_end: 6.0,
        v_start: 3.0,
        v_end: 6.5,
    });
    let window = wall.obstacles.iter().find(|o| o.kind == ObstacleKind::Opening).unwrap().clone();

    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![sanitary_connector("c1", "w1", 4.5, 7.0, 7.0, 0.333)];
    let targets = vec![wet_wall_target("t1", "w1", 4.5, 0.5, 0.5, 0.333)];

    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    assert_eq!(result.statistics.successful_routes, 1);
    let route = &result.routes[0];
    for segment in &route.segments {
        assert!(!segment.crosses_obstacle);
        assert!(
            !window.intersects_segment(segment.start, segment.end),
            "segment {:?}->{:?} passes directly through the window opening",
            segment.start,
            segment.end
        );
    }
}

// Scenario 6: a data connector routed to a patch panel 400 ft away, well
// past the 300 ft Cat6 length limit.
//
// Given:
// - A single long domain spanning u in [0.0, 400.0].
// - Data connector at u = 0.0, patch-panel target at u = 400.0.
//
// Find: `DataHeuristic` only penalizes runs beyond the limit -- it never
// rejects them outright -- so the route is still produced, and its length
// reflects the full 400 ft run.
#[test]
fn scenario_6_data_run_exceeding_cat6_limit_still_routes() {
    let domain = Domain::new("shaft_1", DomainKind::Shaft, 0.0, 400.0, 0.0, 8.0, 1.0);
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(domain, WallPlacement { start: (0.0, 0.0), end: (400.0, 0.0) })], None);

    let connectors = vec![ConnectorInfo {
        id: "c1".into(),
        system_type: "Data".into(),
        location: (0.0, 4.0, 4.0),
        direction: ConnectorDirection::Outward,
        diameter: 0.0625,
        fixture_id: None,
        fixture_type: None,
        wall_id: Some("shaft_1".into()),
        elevation: 4.0,
        metadata: HashMap::new(),
    }];

    let mut panel_metadata = HashMap::new();
    panel_metadata.insert("panel_type".to_string(), serde_json::json!("data"));
    let targets = vec![RoutingTarget {
        id: "panel_1".into(),
        kind: TargetKind::PanelBoundary,
        world_xyz: (400.0, 4.0, 4.0),
        domain_id: "shaft_1".into(),
        plane_uv: (400.0, 4.0),
        systems_served: vec!["Data".into()],
        capacity: 0.0625,
        priority: 0,
        is_available: true,
        metadata: panel_metadata,
    }];

    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    assert_eq!(result.statistics.successful_routes, 1, "a Cat6 run beyond the length limit must still be routed, only penalized");
    assert_eq!(result.statistics.failed_routes, 0);
    let route = &result.routes[0];
    assert!(route.total_length > 300.0, "route length {} should reflect the full run past the Cat6 limit", route.total_length);
}

// Invariant: clearance between two independently-reserved segments in the
// same domain is never below `d(s1)/2 + d(s2)/2 + clearance`, checked
// directly against `OccupancyMap::is_available` rather than against whatever
// a particular pathfinding run happens to produce.
#[test]
fn invariant_clearance_threshold_matches_the_half_diameters_plus_clearance_formula() {
    use oahs_router::occupancy::{OccupancyMap, OccupiedSegment};
    use oahs_router::Point2D;

    let mut map = OccupancyMap::new();
    let d1 = 0.333;
    let d2 = 0.167;
    map.reserve(
        "w1",
        OccupiedSegment::new("r1", "Sanitary", "plumbing", Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0), d1),
    );

    let required = pipe_required_clearance(d1, d2);

    let (too_close, blocker) = map.is_available(
        "w1",
        Point2D::new(0.0, required - 0.01),
        Point2D::new(10.0, required - 0.01),
        d2,
        DEFAULT_CLEARANCE,
    );
    assert!(!too_close);
    assert_eq!(blocker.as_deref(), Some("r1"));

    let (clear, _) = map.is_available(
        "w1",
        Point2D::new(0.0, required + 0.01),
        Point2D::new(10.0, required + 0.01),
        d2,
        DEFAULT_CLEARANCE,
    );
    assert!(clear);
}

// Invariant: a connector whose `wall_id` is absent from the router's
// registered domains fails as a non-recoverable `DOMAIN_MISMATCH`, never as
// a silent `NO_PATH` -- a caller should be able to tell "this is a data
// error" from "this is a geometry problem" apart.
#[test]
fn invariant_unknown_domain_reference_is_a_nonrecoverable_mismatch_not_a_path_failure() {
    let wall = standard_wall("w1");
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let mut stray = sanitary_connector("c1", "w1", 5.0, 4.0, 4.0, 0.333);
    stray.wall_id = Some("wall_does_not_exist".into());

    let result = router.route_all(&[stray], &[]).expect("route_all should not hard-error");
    assert_eq!(result.failed[0].error_code, "DOMAIN_MISMATCH");
    assert!(!result.failed[0].recoverable);
}

// Invariant: a `Route` survives a JSON round trip bit-for-bit on its
// numeric fields -- serialization must not perturb the geometry it carries.
#[test]
fn invariant_route_serialization_round_trips_exactly() {
    let wall = standard_wall("w1");
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![sanitary_connector("c1", "w1", 5.0, 4.0, 4.0, 0.333)];
    let targets = vec![wet_wall_target("t1", "w1", 5.0, 0.5, 0.5, 0.333)];
    let result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");
    let route = &result.routes[0];

    let json = serde_json::to_string(route).expect("route must serialize");
    let round_tripped: oahs_router::Route = serde_json::from_str(&json).expect("route must deserialize");

    assert_eq!(round_tripped.segments.len(), route.segments.len());
    assert!((round_tripped.total_length - route.total_length).abs() < 1e-12);
    assert!((round_tripped.total_cost - route.total_cost).abs() < 1e-12);
    for (a, b) in route.segments.iter().zip(round_tripped.segments.iter()) {
        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
    }
}

// Invariant: sanitary runs only ever flow downhill once post-processed --
// every segment's recorded end elevation is at or below its start elevation.
#[test]
fn invariant_sanitary_postprocessing_never_raises_elevation_along_a_run() {
    use oahs_router::postprocess::sanitary::postprocess_result;

    let wall = standard_wall("w1");
    let builder = RouterBuilder::new(RouterConfig::default());
    let mut router = builder.build_router(&[WallSpec::new(wall, straight_placement(WALL_LENGTH))], None);

    let connectors = vec![sanitary_connector("c1", "w1", 5.0, 4.0, 4.0, 0.333)];
    let targets = vec![wet_wall_target("t1", "w1", 5.0, 0.5, 0.5, 0.333)];
    let mut result = router.route_all(&connectors, &targets).expect("route_all should not hard-error");

    let config = RouterConfig::default();
    postprocess_result(&mut result, &config);

    let route = &result.routes[0];
    for segment in &route.segments {
        let start_z = segment.metadata["z_start"].as_f64().unwrap();
        let end_z = segment.metadata["z_end"].as_f64().unwrap();
        assert!(end_z <= start_z + 1e-9, "segment end elevation {} rose above its start {}", end_z, start_z);
    }
}
