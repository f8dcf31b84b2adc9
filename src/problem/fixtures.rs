//! Small hand-built instances shared by unit tests.

use super::{Link, Problem, ProblemBuilder, Server};

pub(crate) fn link(capacity: f64, power: f64, latency: f64) -> Link {
    Link {
        capacity,
        power,
        latency,
    }
}

pub(crate) fn server(min_power: f64, max_power: f64, cpu: f64, ram: f64, node: usize) -> Server {
    Server {
        min_power,
        max_power,
        cpu,
        ram,
        node,
    }
}

/// Three nodes in a line (1 - 2 - 3), one server per node.
///
/// Components 1..=3 (4 cpu / 4 ram each) form chains `[1, 2]` and
/// `[1, 2, 3]`; component 4 belongs to no chain. Demands are 5 on both
/// pairs, links carry 10 with latency 2 and power 3.
pub(crate) fn line_problem() -> Problem {
    ProblemBuilder::new()
        .with_node(10.0)
        .with_node(20.0)
        .with_node(30.0)
        .with_server(server(50.0, 100.0, 10.0, 10.0, 1))
        .with_server(server(50.0, 100.0, 20.0, 20.0, 2))
        .with_server(server(100.0, 200.0, 10.0, 10.0, 3))
        .with_component(4.0, 4.0)
        .with_component(4.0, 4.0)
        .with_component(4.0, 4.0)
        .with_component(1.0, 1.0)
        .with_symmetric_link(1, 2, link(10.0, 3.0, 2.0))
        .with_symmetric_link(2, 3, link(10.0, 3.0, 2.0))
        .with_demand(1, 2, 5.0)
        .with_demand(2, 3, 5.0)
        .with_chain(10.0, vec![1, 2])
        .with_chain(10.0, vec![1, 2, 3])
        .build()
        .unwrap()
}

/// Two servers on a single node, two components that each fill one server
/// exactly and do not communicate.
pub(crate) fn single_node_problem() -> Problem {
    ProblemBuilder::new()
        .with_node(7.0)
        .with_server(server(40.0, 100.0, 8.0, 8.0, 1))
        .with_server(server(30.0, 90.0, 8.0, 8.0, 1))
        .with_component(8.0, 8.0)
        .with_component(8.0, 8.0)
        .with_chain(5.0, vec![1])
        .with_chain(5.0, vec![2])
        .build()
        .unwrap()
}

/// Two nodes joined by a thin link (capacity 5) and a chain `[1, 2]`
/// that needs 10.
pub(crate) fn thin_link_problem() -> Problem {
    ProblemBuilder::new()
        .with_node(10.0)
        .with_node(10.0)
        .with_server(server(50.0, 100.0, 4.0, 4.0, 1))
        .with_server(server(50.0, 100.0, 4.0, 4.0, 2))
        .with_component(4.0, 4.0)
        .with_component(4.0, 4.0)
        .with_symmetric_link(1, 2, link(5.0, 2.0, 1.0))
        .with_demand(1, 2, 10.0)
        .with_chain(10.0, vec![1, 2])
        .build()
        .unwrap()
}
