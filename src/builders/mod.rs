//! Per-domain graph builders: populate a shared `MultiDomainGraph` with the
//! grid lattice and terminal connections for one wall or floor cavity.

pub mod floor_graph;
pub mod wall_graph;

pub use floor_graph::{FloorGraphBuilder, WebOpeningZone};
pub use wall_graph::WallGraphBuilder;
