//! Static obstacles within a routing domain: studs, plates, joists, openings.

use crate::geometry::Point2D;
use serde::{Deserialize, Serialize};

/// The kind of framing member (or opening) an obstacle represents.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Stud,
    Plate,
    Joist,
    Opening,
    Pipe,
    Other,
}

/// A closed axis-aligned rectangle blocking or penalizing routing.
///
/// Bounds use named fields rather than a positional tuple: the source system
/// this was distilled from stored obstacle bounds and domain bounds in two
/// different tuple orders, an ambiguity eliminated here entirely.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub kind: ObstacleKind,
    pub u_min: f64,
    pub v_min: f64,
    pub u_max: f64,
    pub v_max: f64,
    pub penetrable: bool,
    pub max_penetration_ratio: f64,
}

impl Obstacle {
    pub fn new(
        id: impl Into<String>,
        kind: ObstacleKind,
        u_min: f64,
        v_min: f64,
        u_max: f64,
        v_max: f64,
        penetrable: bool,
        max_penetration_ratio: f64,
    ) -> Self {
        debug_assert!(u_min < u_max, "obstacle u_min must be < u_max");
        debug_assert!(v_min < v_max, "obstacle v_min must be < v_max");
        Obstacle {
            id: id.into(),
            kind,
            u_min,
            v_min,
            u_max,
            v_max,
            penetrable,
            max_penetration_ratio,
        }
    }

    /// Boundary-inclusive point containment.
    pub fn contains_point(&self, p: Point2D) -> bool {
        p.u >= self.u_min && p.u <= self.u_max && p.v >= self.v_min && p.v <= self.v_max
    }

    /// Exact Liang-Barsky segment/AABB intersection test, boundary-inclusive.
    pub fn intersects_segment(&self, start: Point2D, end: Point2D) -> bool {
        let dx = end.u - start.u;
        let dy = end.v - start.v;

        let mut t_min = 0.0f64;
        let mut t_max = 1.0f64;

        // p*t <= q for each of the four clip planes.
        let checks = [
            (-dx, start.u - self.u_min),
            (dx, self.u_max - start.u),
            (-dy, start.v - self.v_min),
            (dy, self.v_max - start.v),
        ];

        for (p, q) in checks {
            if p.abs() < 1e-12 {
                // Segment is parallel to this clip plane; if outside, no intersection.
                if q < 0.0 {
                    return false;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t_max {
                        return false;
                    }
                    if r > t_min {
                        t_min = r;
                    }
                } else {
                    if r < t_min {
                        return false;
                    }
                    if r < t_max {
                        t_max = r;
                    }
                }
            }
        }

        t_min <= t_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stud() -> Obstacle {
        Obstacle::new("s1", ObstacleKind::Stud, 1.0, 0.0, 1.125, 8.0, true, 0.4)
    }

    #[test]
    fn contains_point_is_boundary_inclusive() {
        let o = stud();
        assert!(o.contains_point(Point2D::new(1.0, 0.0)));
        assert!(o.contains_point(Point2D::new(1.125, 8.0)));
        assert!(!o.contains_point(Point2D::new(0.999, 0.0)));
    }

    #[test]
    fn horizontal_segment_crossing_stud_intersects() {
        let o = stud();
        assert!(o.intersects_segment(Point2D::new(0.0, 4.0), Point2D::new(2.0, 4.0)));
    }

    #[test]
    fn segment_entirely_outside_does_not_intersect() {
        let o = stud();
        assert!(!o.intersects_segment(Point2D::new(5.0, 0.0), Point2D::new(5.0, 8.0)));
    }

    #[test]
    fn segment_touching_edge_counts_as_intersecting() {
        let o = stud();
        // Vertical segment running exactly along u=1.0, the obstacle's left edge.
        assert!(o.intersects_segment(Point2D::new(1.0, -1.0), Point2D::new(1.0, 9.0)));
    }
}
