//! Search over the unified multi-domain graph: A* with a Manhattan heuristic,
//! and the Hanan-grid Steiner-tree builder used for the standalone
//! multi-terminal case.

pub mod astar;
pub mod hanan;

pub use astar::{AStarPathfinder, PathResult};
pub use hanan::{HananGrid, HananMST, SteinerTreeBuilder};
