//! In-plane parametric coordinates shared by every routing domain.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// An immutable point in a domain's `(u, v)` parametric plane.
///
/// `u` runs along a wall's length (or world X for a floor); `v` runs vertical
/// (or world Y for a floor). Coordinates are feet.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Point2D {
    pub u: f64,
    pub v: f64,
}

impl Point2D {
    pub fn new(u: f64, v: f64) -> Self {
        Point2D { u, v }
    }

    pub fn add(self, other: Self) -> Self {
        Point2D::new(self.u + other.u, self.v + other.v)
    }

    pub fn sub(self, other: Self) -> Self {
        Point2D::new(self.u - other.u, self.v - other.v)
    }

    pub fn scale(self, factor: f64) -> Self {
        Point2D::new(self.u * factor, self.v * factor)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        let d = self.sub(other);
        (d.u * d.u + d.v * d.v).sqrt()
    }

    pub fn manhattan_distance_to(self, other: Self) -> f64 {
        (self.u - other.u).abs() + (self.v - other.v).abs()
    }

    pub fn as_tuple(self) -> (f64, f64) {
        (self.u, self.v)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(t: (f64, f64)) -> Self {
        Point2D::new(t.0, t.1)
    }
}

impl PartialEq for Point2D {
    fn eq(&self, other: &Self) -> bool {
        self.u.to_bits() == other.u.to_bits() && self.v.to_bits() == other.v.to_bits()
    }
}
impl Eq for Point2D {}

impl Hash for Point2D {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.u.to_bits().hash(state);
        self.v.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn manhattan_distance_sums_axes() {
        let a = Point2D::new(1.0, 1.0);
        let b = Point2D::new(4.0, 5.0);
        assert!((a.manhattan_distance_to(b) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn add_sub_are_inverses() {
        let a = Point2D::new(2.5, -1.0);
        let b = Point2D::new(0.5, 3.0);
        let round_trip = a.add(b).sub(b);
        assert!((round_trip.u - a.u).abs() < 1e-9);
        assert!((round_trip.v - a.v).abs() < 1e-9);
    }
}
