//! The router's error taxonomy. Only `InputError` actually aborts a call;
//! every other failure mode is represented as data (`FailedConnector`) rather
//! than a Rust `Err`, since the orchestrator never raises on a per-connector
//! failure.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A malformed connector, target, domain, or framing record: a missing
    /// required field or impossible bounds. Surfaced before any routing begins.
    #[error("invalid input: {0}")]
    InputError(String),

    /// A connector references a wall/domain id not present in the domain set
    /// supplied to the orchestrator.
    #[error("connector '{connector_id}' references unknown domain '{domain_id}'")]
    DomainMismatch {
        connector_id: String,
        domain_id: String,
    },

    /// A `RoutingDomain` id referenced internally (e.g. by a transition or a
    /// target) could not be resolved against the domain set at graph-assembly
    /// time.
    #[error("domain '{0}' not found")]
    UnknownDomain(String),
}

pub type RouterResult<T> = Result<T, RouterError>;
