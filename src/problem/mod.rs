//! Problem definition: servers, nodes, components, links, demands and
//! service chains.
//!
//! A [`Problem`] is immutable once built and is shared by reference with
//! every other stage of a run.

mod builder;
mod model;
mod parse;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::ProblemBuilder;
pub use model::Problem;
pub use parse::parse;
pub use types::{
    ChainId, Component, ComponentId, Link, NeededRoute, NodeId, Server, ServerId, ServiceChain,
};
