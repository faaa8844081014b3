//! Routing domains: rectangular 2D regions (wall cavities, floor cavities,
//! ceiling cavities, shafts) carrying a catalog of obstacles.

use crate::geometry::Point2D;
use crate::obstacle::{Obstacle, ObstacleKind};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// Which kind of cavity a `RoutingDomain` represents.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    WallCavity,
    FloorCavity,
    CeilingCavity,
    Shaft,
}

/// An opening (door or window) cut into a wall domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Opening {
    pub id: String,
    pub kind: OpeningKind,
    pub u_start: f64,
    pub u_end: f64,
    /// Only used for windows; doors span the full domain height.
    pub v_start: f64,
    pub v_end: f64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    Door,
    Window,
}

/// A rectangular 2D routing region with typed obstacles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingDomain {
    pub id: String,
    pub kind: DomainKind,
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    pub thickness: f64,
    pub obstacles: Vec<Obstacle>,
    pub transitions: FnvHashSet<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RoutingDomain {
    pub fn new(
        id: impl Into<String>,
        kind: DomainKind,
        u_min: f64,
        u_max: f64,
        v_min: f64,
        v_max: f64,
        thickness: f64,
    ) -> Self {
        RoutingDomain {
            id: id.into(),
            kind,
            u_min,
            u_max,
            v_min,
            v_max,
            thickness,
            obstacles: Vec::new(),
            transitions: FnvHashSet::default(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn add_transition(&mut self, domain_id: impl Into<String>) {
        self.transitions.insert(domain_id.into());
    }

    /// Whether a straight segment between `start` and `end` is free of blocking
    /// obstacles. Penetrable obstacles are ignored when `allow_penetrable` is set.
    pub fn is_path_clear(&self, start: Point2D, end: Point2D, allow_penetrable: bool) -> bool {
        for obstacle in &self.obstacles {
            if allow_penetrable && obstacle.penetrable {
                continue;
            }
            if obstacle.intersects_segment(start, end) {
                return false;
            }
        }
        true
    }

    /// `diameter + 2 * clearance <= thickness`.
    pub fn can_fit_pipe(&self, diameter: f64, clearance: f64) -> bool {
        diameter + 2.0 * clearance <= self.thickness
    }

    pub fn contains_point(&self, p: Point2D) -> bool {
        p.u >= self.u_min && p.u <= self.u_max && p.v >= self.v_min && p.v <= self.v_max
    }

    /// Standard 16"-OC-derived wall factory.
    ///
    /// Generates a run of `stud` obstacles every `stud_spacing`, a non-penetrable
    /// end stud if there's remaining width, and plate obstacles at top/bottom.
    #[allow(clippy::too_many_arguments)]
    pub fn standard_wall(
        id: impl Into<String>,
        length: f64,
        height: f64,
        thickness: f64,
        stud_spacing: f64,
        stud_width: f64,
        plate_thickness: f64,
        has_top_plate: bool,
        has_bottom_plate: bool,
    ) -> Self {
        let id = id.into();
        let bottom_v = if has_bottom_plate { plate_thickness } else { 0.0 };
        let top_v = if has_top_plate {
            height - plate_thickness
        } else {
            height
        };

        let mut domain = RoutingDomain::new(id.clone(), DomainKind::WallCavity, 0.0, length, 0.0, height, thickness);

        let mut center = stud_width / 2.0;
        let mut index = 0;
        while center + stud_width / 2.0 <= length {
            let u_min = center - stud_width / 2.0;
            let u_max = center + stud_width / 2.0;
            domain.add_obstacle(Obstacle::new(
                format!("{id}_stud_{index}"),
                ObstacleKind::Stud,
                u_min,
                bottom_v,
                u_max,
                top_v,
                true,
                0.4,
            ));
            index += 1;
            center += stud_spacing;
        }

        // End stud flush against the far edge, if there's remaining width for one.
        let last_regular_edge = center - stud_spacing + stud_width / 2.0;
        if length - last_regular_edge >= stud_width {
            let u_max = length;
            let u_min = length - stud_width;
            domain.add_obstacle(Obstacle::new(
                format!("{id}_stud_end"),
                ObstacleKind::Stud,
                u_min,
                bottom_v,
                u_max,
                top_v,
                false,
                0.0,
            ));
        }

        if has_bottom_plate {
            domain.add_obstacle(Obstacle::new(
                format!("{id}_plate_bottom"),
                ObstacleKind::Plate,
                0.0,
                0.0,
                length,
                plate_thickness,
                false,
                0.0,
            ));
        }
        if has_top_plate {
            domain.add_obstacle(Obstacle::new(
                format!("{id}_plate_top"),
                ObstacleKind::Plate,
                0.0,
                height - plate_thickness,
                length,
                height,
                false,
                0.0,
            ));
        }

        domain
    }

    /// Injects a door (full-height, non-penetrable) or window (confined box,
    /// non-penetrable) obstacle.
    pub fn add_opening(&mut self, opening: &Opening) {
        let (v_min, v_max) = match opening.kind {
            OpeningKind::Door => (self.v_min, self.v_max),
            OpeningKind::Window => (opening.v_start, opening.v_end),
        };

        self.add_obstacle(Obstacle::new(
            format!("{}_opening", opening.id),
            ObstacleKind::Opening,
            opening.u_start,
            v_min,
            opening.u_end,
            v_max,
            false,
            0.0,
        ));
    }

    /// Standard floor factory: a grid of joist obstacles spanning the floor
    /// plate, each carrying the floor-specific 0.6 max penetration ratio
    /// unless explicitly overridden by the caller.
    pub fn standard_floor(
        id: impl Into<String>,
        length_x: f64,
        length_y: f64,
        thickness: f64,
        joist_spacing: f64,
        joist_width: f64,
    ) -> Self {
        let id = id.into();
        let mut domain = RoutingDomain::new(
            id.clone(),
            DomainKind::FloorCavity,
            0.0,
            length_x,
            0.0,
            length_y,
            thickness,
        );

        let mut center = joist_width / 2.0;
        let mut index = 0;
        while center + joist_width / 2.0 <= length_x {
            let u_min = center - joist_width / 2.0;
            let u_max = center + joist_width / 2.0;
            domain.add_obstacle(Obstacle::new(
                format!("{id}_joist_{index}"),
                ObstacleKind::Joist,
                u_min,
                0.0,
                u_max,
                length_y,
                true,
                0.6,
            ));
            index += 1;
            center += joist_spacing;
        }

        domain
    }
}
