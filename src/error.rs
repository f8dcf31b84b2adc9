//! Error types.
//!
//! Local failures ([`PlaceError`], [`RouteError`]) never mutate the
//! solution they were raised against; callers decide whether to retry,
//! advance, or discard the candidate. Run-ending conditions surface as
//! [`Error`].

use crate::problem::{ComponentId, NodeId, ServerId};
use thiserror::Error;

/// A rejected `Solution::place` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaceError {
    #[error("component {0} is out of range")]
    ComponentOutOfRange(ComponentId),

    #[error("server {0} is out of range")]
    ServerOutOfRange(ServerId),

    #[error("component {component} would exceed CPU of server {server} ({required} > {available})")]
    CpuExceeded {
        component: ComponentId,
        server: ServerId,
        required: f64,
        available: f64,
    },

    #[error("component {component} would exceed RAM of server {server} ({required} > {available})")]
    RamExceeded {
        component: ComponentId,
        server: ServerId,
        required: f64,
        available: f64,
    },
}

/// A rejected `Solution::set_route` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("component {0} is out of range")]
    ComponentOutOfRange(ComponentId),

    #[error("node {0} is out of range")]
    NodeOutOfRange(NodeId),

    #[error("route between components {0} and {1} is empty")]
    EmptyPath(ComponentId, ComponentId),

    #[error("no link <{0},{1}> in the topology")]
    UnknownLink(NodeId, NodeId),

    /// The listed links have been marked saturated on the solution.
    #[error("link capacity exceeded on {links:?}")]
    CapacityExceeded { links: Vec<(NodeId, NodeId)> },
}

/// A routing failure that is not a capacity problem.
///
/// The annealer skips neighbors that raise this; it is distinct from a
/// pair that simply has no feasible path (see `RoutingOutcome`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("component {0} must communicate but is not placed")]
    Unplaced(ComponentId),

    #[error("route for <{0},{1}> rejected: {2}")]
    Rejected(ComponentId, ComponentId, RouteError),
}

/// A malformed assignment matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    #[error("expected {expected} component rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row}: expected {expected} server columns, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("component {0} is assigned to more than one server")]
    MultipleServers(ComponentId),

    #[error(transparent)]
    Place(#[from] PlaceError),
}

/// Problem construction and parsing errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    #[error("{entity} {id} references node {node} outside 1..={num_nodes}")]
    NodeOutOfRange {
        entity: &'static str,
        id: usize,
        node: NodeId,
        num_nodes: usize,
    },

    #[error("{context} references component {component} outside 1..={num_components}")]
    ComponentOutOfRange {
        context: String,
        component: ComponentId,
        num_components: usize,
    },

    #[error("server {0} is not located on exactly one node")]
    ServerLocation(ServerId),

    #[error("server {server}: {reason}")]
    InvalidServer { server: ServerId, reason: String },

    #[error("service chain {0} is empty")]
    EmptyChain(usize),

    #[error("failed to parse `{field}`: {reason}")]
    Parse { field: String, reason: String },
}

/// Run-level errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid problem: {0}")]
    Problem(#[from] ProblemError),

    /// Every server was tried and a component still did not fit.
    #[error("instance infeasible: component {component} does not fit on any remaining server")]
    InfeasibleInstance { component: ComponentId },

    #[error("initial routing failed for pairs {pairs:?}")]
    InitialRouting { pairs: Vec<(ComponentId, ComponentId)> },

    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
