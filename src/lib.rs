//! OAHS (Obstacle-Aware Hanan Sequential) MEP router: plans sanitary, vent,
//! supply, power, data, and lighting runs through framed-building wall and
//! floor cavities.
//!
//! The pipeline runs bottom-up through the modules below: a [`domain`]
//! catalogs a cavity's [`obstacle`]s, [`builders`] lay a grid lattice into
//! one cavity's slice of the unified [`graph`], `graph::transitions`
//! stitches cavities together, [`pathfinder`] searches the result, and
//! [`orchestrator`] sequences connectors against [`targets`] chosen by
//! [`heuristics`] and writes the outcome into a [`routing_result`].
//! [`postprocess`] applies sanitary/vent-specific slope and elbow shaping
//! after routing completes. [`wall_routing`] is a narrower, single-wall
//! entry point for callers that only need entry-to-exit-plate routing
//! without the full multi-domain pipeline. [`router_builder`] is the
//! top-level facade that assembles raw wall/floor domains into a wired
//! graph (or a ready [`orchestrator::OAHSRouter`]) in one call.

pub mod builders;
pub mod config;
pub mod connector;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod heuristics;
pub mod obstacle;
pub mod occupancy;
pub mod orchestrator;
pub mod pathfinder;
pub mod postprocess;
pub mod route;
pub mod router_builder;
pub mod routing_result;
pub mod target_generator;
pub mod targets;
pub mod trade_config;
pub mod wall_routing;

pub use config::RouterConfig;
pub use connector::{ConnectorDirection, ConnectorInfo};
pub use domain::{DomainKind, RoutingDomain};
pub use error::{RouterError, RouterResult};
pub use geometry::Point2D;
pub use orchestrator::OAHSRouter;
pub use route::{Route, RouteSegment};
pub use router_builder::{RouterBuilder, WallSpec};
pub use routing_result::{FailedConnector, RoutingResult, RoutingStatistics};
pub use targets::RoutingTarget;
