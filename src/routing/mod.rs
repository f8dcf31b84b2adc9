//! Routing of communicating component pairs over the node graph.

mod graph;
mod router;

pub use graph::NodeGraph;
pub use router::{Router, RoutingOutcome};
