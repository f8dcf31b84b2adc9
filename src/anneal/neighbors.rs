//! Single-move neighborhood.

use crate::problem::Problem;
use crate::solution::Solution;

/// Every solution reachable by moving one chained component to a
/// different server.
///
/// Each neighbor is unrouted and unevaluated, and records the moved
/// component. Capacity is not checked here: overloaded neighbors are
/// rejected later by the validity check.
pub fn neighbors(problem: &Problem, current: &Solution) -> Vec<Solution> {
    let num_servers = problem.num_servers();
    let mut out =
        Vec::with_capacity(problem.components_to_place().len() * num_servers.saturating_sub(1));
    for &component in problem.components_to_place() {
        let from = current.server_of(component);
        for server in 1..=num_servers {
            if Some(server) != from {
                out.push(current.moved(problem, component, server));
            }
        }
    }
    out
}
