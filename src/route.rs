//! The building blocks of an MEP route: straight axis-aligned segments and
//! the ordered path they form.

use crate::geometry::Point2D;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentDirection {
    Horizontal,
    Vertical,
    Diagonal,
}

impl SegmentDirection {
    /// Infers direction from the endpoints: both axes changing beyond a
    /// small epsilon is diagonal, otherwise whichever axis changed more wins.
    pub fn infer(start: Point2D, end: Point2D) -> Self {
        let du = (end.u - start.u).abs();
        let dv = (end.v - start.v).abs();
        if du > 1e-6 && dv > 1e-6 {
            SegmentDirection::Diagonal
        } else if dv > du {
            SegmentDirection::Vertical
        } else {
            SegmentDirection::Horizontal
        }
    }
}

/// A single straight-line segment in an MEP route.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Point2D,
    pub end: Point2D,
    pub direction: SegmentDirection,
    pub length: f64,
    pub cost: f64,
    pub domain_id: String,
    pub is_steiner: bool,
    pub crosses_obstacle: bool,
    #[serde(default)]
    pub obstacle_kind: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RouteSegment {
    pub fn new(start: Point2D, end: Point2D, domain_id: impl Into<String>) -> Self {
        let length = start.manhattan_distance_to(end);
        let direction = SegmentDirection::infer(start, end);
        RouteSegment {
            start,
            end,
            direction,
            length,
            cost: length,
            domain_id: domain_id.into(),
            is_steiner: false,
            crosses_obstacle: false,
            obstacle_kind: None,
            metadata: HashMap::new(),
        }
    }

    pub fn reversed(&self) -> Self {
        RouteSegment {
            start: self.end,
            end: self.start,
            direction: self.direction,
            length: self.length,
            cost: self.cost,
            domain_id: self.domain_id.clone(),
            is_steiner: self.is_steiner,
            crosses_obstacle: self.crosses_obstacle,
            obstacle_kind: self.obstacle_kind.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// A complete MEP route from source to target, composed of ordered segments.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub system_type: String,
    pub segments: Vec<RouteSegment>,
    pub source: Option<Point2D>,
    pub target: Option<Point2D>,
    pub total_cost: f64,
    pub total_length: f64,
    /// Consecutive de-duplication of each segment's `domain_id` as segments
    /// are appended -- distinct from a path's first-occurrence domain set
    /// (see `pathfinder::astar::PathResult`).
    pub domains_crossed: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Route {
    pub fn new(id: impl Into<String>, system_type: impl Into<String>) -> Self {
        Route {
            id: id.into(),
            system_type: system_type.into(),
            segments: Vec::new(),
            source: None,
            target: None,
            total_cost: 0.0,
            total_length: 0.0,
            domains_crossed: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn add_segment(&mut self, segment: RouteSegment) {
        self.total_cost += segment.cost;
        self.total_length += segment.length;
        if self.domains_crossed.last().map(|d| d.as_str()) != Some(segment.domain_id.as_str())
            && !segment.domain_id.is_empty()
        {
            self.domains_crossed.push(segment.domain_id.clone());
        }
        self.segments.push(segment);
    }
}
